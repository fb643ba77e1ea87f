use crate::error::Result;
use crate::events::{HostEvent, Rect, TimerHandle, WindowId, WindowInfo};
use crate::services::host::shared::{Capabilities, SharedState, Snapshot};
use crate::services::host::{EventSource, Host};
use crate::services::overlay::OverlayHandle;
use crate::services::timer::{next_timer_handle, TimerService};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    pub size: (u32, u32),
    pub position: (i32, i32),
    pub visible: bool,
    pub redraws: usize,
    pub destroyed: bool,
}

/// Поверхность, запоминающая последние команды
pub struct RecordingOverlay {
    state: Arc<Mutex<OverlayState>>,
}

impl OverlayHandle for RecordingOverlay {
    fn set_size(&mut self, width: u32, height: u32) {
        self.state.lock().size = (width, height);
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.state.lock().position = (x, y);
    }

    fn show(&mut self) {
        self.state.lock().visible = true;
    }

    fn hide(&mut self) {
        self.state.lock().visible = false;
    }

    fn request_redraw(&mut self) {
        self.state.lock().redraws += 1;
    }

    fn destroy(&mut self) {
        let mut state = self.state.lock();
        state.visible = false;
        state.destroyed = true;
    }
}

#[derive(Debug, Default)]
pub struct TimerLog {
    pub scheduled: Vec<(TimerHandle, Duration)>,
    pub cancelled: Vec<TimerHandle>,
    pub fired: Vec<TimerHandle>,
}

impl TimerLog {
    /// Таймеры, которые были запланированы, но не отменены и не сработали
    pub fn pending(&self) -> Vec<TimerHandle> {
        self.scheduled
            .iter()
            .map(|(handle, _)| *handle)
            .filter(|handle| !self.cancelled.contains(handle) && !self.fired.contains(handle))
            .collect()
    }
}

/// Таймер, который срабатывает только по команде теста
pub struct ManualTimer {
    log: Arc<Mutex<TimerLog>>,
}

impl TimerService for ManualTimer {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        let handle = next_timer_handle();
        self.log.lock().scheduled.push((handle, delay));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.log.lock().cancelled.push(handle);
    }
}

pub struct TestHost {
    pub shared: Arc<SharedState>,
    pub overlay: Arc<Mutex<OverlayState>>,
    pub timers: Arc<Mutex<TimerLog>>,
    pub fail_overlay: bool,
}

impl TestHost {
    pub fn new(capabilities: Capabilities) -> (Self, UnboundedReceiver<HostEvent>) {
        let (tx, rx) = unbounded_channel();
        let host = Self {
            shared: SharedState::new(tx, capabilities),
            overlay: Arc::new(Mutex::new(OverlayState::default())),
            timers: Arc::new(Mutex::new(TimerLog::default())),
            fail_overlay: false,
        };
        (host, rx)
    }
}

impl Host for TestHost {
    fn name(&self) -> &str {
        "test"
    }

    fn event_source(&mut self) -> Box<dyn EventSource> {
        Box::new(self.shared.event_source())
    }

    fn create_overlay(&mut self) -> Result<Box<dyn OverlayHandle>> {
        if self.fail_overlay {
            return Err(crate::focus_error!(internal, "поверхность недоступна"));
        }
        *self.overlay.lock() = OverlayState::default();
        Ok(Box::new(RecordingOverlay {
            state: Arc::clone(&self.overlay),
        }))
    }

    fn timer_service(&mut self) -> Box<dyn TimerService> {
        Box::new(ManualTimer {
            log: Arc::clone(&self.timers),
        })
    }
}

pub fn window(id: u64, x: i32, y: i32) -> WindowInfo {
    WindowInfo::new(WindowId(id), format!("window {}", id)).with_frame(Rect::new(x, y, 800, 600))
}

pub fn focused(window: Option<WindowInfo>) -> Snapshot {
    Snapshot {
        focused: window,
        ..Snapshot::default()
    }
}
