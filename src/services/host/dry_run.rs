use super::shared::{Capabilities, SharedState, Snapshot};
use super::BackendHost;
use crate::config::Config;
use crate::events::{HostEvent, Rect, WindowId, WindowInfo, WindowType};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScriptStep {
    Focus(usize),
    Move(i32, i32),
    Resize(i32, i32),
    Minimize,
    Scale(f64),
    Monitors(usize),
    Unfocus,
}

const SCRIPT: &[ScriptStep] = &[
    ScriptStep::Focus(0),
    ScriptStep::Focus(1),
    ScriptStep::Move(40, 30),
    ScriptStep::Resize(-200, 0),
    ScriptStep::Focus(0),
    ScriptStep::Focus(1),
    ScriptStep::Scale(2.0),
    ScriptStep::Monitors(2),
    ScriptStep::Focus(2),
    ScriptStep::Minimize,
    ScriptStep::Focus(3),
    ScriptStep::Unfocus,
    ScriptStep::Scale(1.0),
    ScriptStep::Monitors(1),
];

/// Эмулируемый рабочий стол для режима сухого запуска
struct ScriptedDesktop {
    windows: Vec<WindowInfo>,
    snapshot: Snapshot,
}

impl ScriptedDesktop {
    fn new() -> Self {
        let windows = vec![
            WindowInfo::new(WindowId(1), "Terminal - dry_run").with_frame(Rect::new(100, 80, 800, 600)),
            WindowInfo::new(WindowId(2), "Browser - dry_run").with_frame(Rect::new(400, 120, 1200, 800)),
            WindowInfo::new(WindowId(3), "Editor - dry_run").with_frame(Rect::new(60, 40, 1000, 900)),
            WindowInfo::new(WindowId(4), "Desktop - dry_run")
                .with_type(WindowType::Desktop)
                .with_frame(Rect::new(0, 0, 1920, 1080)),
        ];

        Self {
            windows,
            snapshot: Snapshot {
                monitors: vec!["DRY-1@1920x1080+0+0".to_string()],
                ..Snapshot::default()
            },
        }
    }

    fn focused_mut(&mut self) -> Option<&mut WindowInfo> {
        let id = self.snapshot.focused.as_ref()?.id;
        self.windows.iter_mut().find(|w| w.id == id)
    }

    fn step(&mut self, step: ScriptStep) -> Snapshot {
        match step {
            ScriptStep::Focus(index) => {
                // Активация окна разворачивает его
                if let Some(window) = self.windows.get_mut(index) {
                    window.minimized = false;
                }
                self.snapshot.focused = self.windows.get(index).cloned();
            }
            ScriptStep::Move(dx, dy) => {
                if let Some(window) = self.focused_mut() {
                    window.frame_rect.x += dx;
                    window.frame_rect.y += dy;
                }
            }
            ScriptStep::Resize(dw, dh) => {
                if let Some(window) = self.focused_mut() {
                    window.frame_rect.width = window.frame_rect.width.saturating_add_signed(dw);
                    window.frame_rect.height = window.frame_rect.height.saturating_add_signed(dh);
                }
            }
            ScriptStep::Minimize => {
                if let Some(window) = self.focused_mut() {
                    window.minimized = true;
                }
            }
            ScriptStep::Scale(scale) => self.snapshot.scale = scale,
            ScriptStep::Monitors(count) => {
                self.snapshot.monitors = (1..=count)
                    .map(|n| format!("DRY-{}@1920x1080+{}+0", n, (n - 1) * 1920))
                    .collect();
            }
            ScriptStep::Unfocus => self.snapshot.focused = None,
        }

        // Окно с фокусом берётся из списка, чтобы отразить перемещения
        if let Some(id) = self.snapshot.focused.as_ref().map(|w| w.id) {
            self.snapshot.focused = self.windows.iter().find(|w| w.id == id).cloned();
        }

        self.snapshot.clone()
    }
}

/// Запустить хост, который проигрывает сценарий вместо реальной оконной системы
pub fn start(config: Arc<Config>, events: UnboundedSender<HostEvent>) -> BackendHost {
    info!("Dry-run режим - оконная система эмулируется сценарием");

    // DisplayConfig в эмуляции нет: контроллер перейдёт на запасного поставщика
    let capabilities = Capabilities {
        display_config: false,
        ..Capabilities::all()
    };
    let shared = SharedState::new(events.clone(), capabilities);
    let mut desktop = ScriptedDesktop::new();
    shared.apply(desktop.snapshot.clone());

    let step_interval = Duration::from_millis(config.marker.hide_timeout_ms.max(3_000) / 3);
    let script_shared = Arc::clone(&shared);
    let task = tokio::spawn(async move {
        let mut ticker = interval(step_interval);
        let mut index = 0;

        loop {
            ticker.tick().await;

            let step = SCRIPT[index];
            info!("Dry-run: шаг сценария {:?}", step);
            script_shared.apply(desktop.step(step));

            index = (index + 1) % SCRIPT.len();
        }
    });

    BackendHost::new("dry-run", shared, events, vec![task])
}
