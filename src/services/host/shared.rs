use super::EventSource;
use crate::debug_if_enabled;
use crate::error::{FocusCircleError, Result};
use crate::events::{HostEvent, MonitorProvider, Rect, Signal, SubscriptionId, WindowId, WindowInfo};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Какие сигналы умеет выдавать конкретный бэкенд
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub focus_changed: bool,
    pub position_changed: bool,
    pub size_changed: bool,
    pub scale_changed: bool,
    pub display_config: bool,
    pub outputs: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            focus_changed: true,
            position_changed: true,
            size_changed: true,
            scale_changed: true,
            display_config: true,
            outputs: true,
        }
    }

    fn supports(&self, signal: &Signal) -> bool {
        match signal {
            Signal::FocusChanged => self.focus_changed,
            Signal::ScaleChanged => self.scale_changed,
            Signal::MonitorsChanged(MonitorProvider::DisplayConfig) => self.display_config,
            Signal::MonitorsChanged(MonitorProvider::Outputs) => self.outputs,
            Signal::PositionChanged(_) => self.position_changed,
            Signal::SizeChanged(_) => self.size_changed,
        }
    }

    fn set_provider(&mut self, provider: MonitorProvider, available: bool) {
        match provider {
            MonitorProvider::DisplayConfig => self.display_config = available,
            MonitorProvider::Outputs => self.outputs = available,
        }
    }
}

/// Наблюдаемое состояние оконной системы на момент последнего опроса
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub focused: Option<WindowInfo>,
    pub scale: f64,
    pub monitors: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            focused: None,
            scale: 1.0,
            monitors: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Сигналы, которые порождает переход от `self` к `next`
    pub fn diff(&self, next: &Snapshot) -> Vec<Signal> {
        let mut signals = Vec::new();

        match (&self.focused, &next.focused) {
            (Some(prev), Some(cur)) if prev.id == cur.id => {
                if prev.minimized != cur.minimized || prev.window_type != cur.window_type {
                    signals.push(Signal::FocusChanged);
                } else {
                    if !prev.frame_rect.same_position(&cur.frame_rect) {
                        signals.push(Signal::PositionChanged(cur.id));
                    }
                    if !prev.frame_rect.same_size(&cur.frame_rect) {
                        signals.push(Signal::SizeChanged(cur.id));
                    }
                }
            }
            (None, None) => {}
            _ => signals.push(Signal::FocusChanged),
        }

        if self.scale != next.scale {
            signals.push(Signal::ScaleChanged);
        }

        if self.monitors != next.monitors {
            signals.push(Signal::MonitorsChanged(MonitorProvider::Outputs));
        }

        signals
    }
}

/// Состояние, общее для задачи-наблюдателя и выданных источников событий
pub struct SharedState {
    events: UnboundedSender<HostEvent>,
    capabilities: RwLock<Capabilities>,
    snapshot: RwLock<Snapshot>,
    subscriptions: DashMap<SubscriptionId, Signal>,
    next_id: AtomicU64,
}

impl SharedState {
    pub fn new(events: UnboundedSender<HostEvent>, capabilities: Capabilities) -> Arc<Self> {
        Arc::new(Self {
            events,
            capabilities: RwLock::new(capabilities),
            snapshot: RwLock::new(Snapshot::default()),
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn event_source(self: &Arc<Self>) -> HostEventSource {
        HostEventSource {
            shared: Arc::clone(self),
        }
    }

    pub fn is_connected(&self, signal: Signal) -> bool {
        self.subscriptions.iter().any(|entry| *entry.value() == signal)
    }

    /// Поставщик уведомлений о мониторах заработал
    pub fn provider_ready(&self, provider: MonitorProvider) {
        self.capabilities.write().set_provider(provider, true);
    }

    /// Поставщик уведомлений о мониторах пропал.
    ///
    /// Новые подписки на него больше не выдаются; если подписка уже есть,
    /// владелец получает `MonitorProviderLost` и должен выбрать другого поставщика.
    pub fn provider_lost(&self, provider: MonitorProvider) -> bool {
        self.capabilities.write().set_provider(provider, false);
        if !self.is_connected(Signal::MonitorsChanged(provider)) {
            return false;
        }
        debug_if_enabled!("Источник событий: поставщик {:?} пропал", provider);
        self.events.send(HostEvent::MonitorProviderLost(provider)).is_ok()
    }

    /// Отправить событие, если на сигнал есть живая подписка
    pub fn emit(&self, signal: Signal) -> bool {
        if !self.is_connected(signal) {
            return false;
        }
        debug_if_enabled!("Источник событий: {}", signal);
        self.events.send(HostEvent::from_signal(signal)).is_ok()
    }

    /// Сохранить новое состояние и разослать сигналы об изменениях.
    ///
    /// Состояние записывается до отправки, чтобы обработчик видел уже новые данные.
    pub fn apply(&self, next: Snapshot) -> Vec<Signal> {
        let signals = {
            let mut current = self.snapshot.write();
            let signals = current.diff(&next);
            *current = next;
            signals
        };

        signals.into_iter().filter(|signal| self.emit(*signal)).collect()
    }

    #[allow(dead_code)]
    pub fn clear_subscriptions(&self) {
        self.subscriptions.clear();
    }

    #[allow(dead_code)]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

/// Источник событий поверх общего состояния
pub struct HostEventSource {
    shared: Arc<SharedState>,
}

impl EventSource for HostEventSource {
    fn connect(&mut self, signal: Signal) -> Result<SubscriptionId> {
        if !self.shared.capabilities.read().supports(&signal) {
            return Err(FocusCircleError::UnsupportedSignal(signal));
        }
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared.subscriptions.insert(id, signal);
        Ok(id)
    }

    fn disconnect(&mut self, id: SubscriptionId) -> Result<()> {
        self.shared
            .subscriptions
            .remove(&id)
            .map(|_| ())
            .ok_or(FocusCircleError::UnknownSubscription(id.0))
    }

    fn focused_window(&self) -> Option<WindowInfo> {
        self.shared.snapshot.read().focused.clone()
    }

    fn frame_rect(&self, window: WindowId) -> Option<Rect> {
        self.shared
            .snapshot
            .read()
            .focused
            .as_ref()
            .filter(|w| w.id == window)
            .map(|w| w.frame_rect)
    }

    fn scale_factor(&self) -> f64 {
        self.shared.snapshot.read().scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn window(id: u64, x: i32, y: i32, w: u32, h: u32) -> WindowInfo {
        WindowInfo::new(WindowId(id), format!("window {}", id)).with_frame(Rect::new(x, y, w, h))
    }

    fn snapshot(focused: Option<WindowInfo>) -> Snapshot {
        Snapshot {
            focused,
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_diff_detects_focus_move_and_resize() {
        let base = snapshot(Some(window(1, 0, 0, 100, 100)));

        assert_eq!(base.diff(&snapshot(Some(window(2, 0, 0, 100, 100)))), vec![Signal::FocusChanged]);
        assert_eq!(base.diff(&snapshot(None)), vec![Signal::FocusChanged]);
        assert_eq!(
            base.diff(&snapshot(Some(window(1, 10, 0, 100, 100)))),
            vec![Signal::PositionChanged(WindowId(1))]
        );
        assert_eq!(
            base.diff(&snapshot(Some(window(1, 10, 0, 50, 100)))),
            vec![Signal::PositionChanged(WindowId(1)), Signal::SizeChanged(WindowId(1))]
        );
        assert!(base.diff(&base.clone()).is_empty());
    }

    #[test]
    fn test_diff_minimize_counts_as_focus_change() {
        let base = snapshot(Some(window(1, 0, 0, 100, 100)));
        let minimized = snapshot(Some(window(1, 0, 0, 100, 100).with_minimized(true)));
        assert_eq!(base.diff(&minimized), vec![Signal::FocusChanged]);
    }

    #[test]
    fn test_diff_scale_and_monitors() {
        let base = Snapshot::default();
        let next = Snapshot {
            scale: 2.0,
            monitors: vec!["eDP-1".to_string()],
            ..Snapshot::default()
        };
        assert_eq!(
            base.diff(&next),
            vec![Signal::ScaleChanged, Signal::MonitorsChanged(MonitorProvider::Outputs)]
        );
    }

    #[test]
    fn test_apply_emits_only_connected_signals() {
        let (tx, mut rx) = unbounded_channel();
        let shared = SharedState::new(tx, Capabilities::all());
        let mut source = shared.event_source();

        // Без подписок событие не уходит
        assert!(shared.apply(snapshot(Some(window(1, 0, 0, 10, 10)))).is_empty());
        assert!(rx.try_recv().is_err());

        source.connect(Signal::FocusChanged).unwrap();
        let emitted = shared.apply(snapshot(Some(window(2, 0, 0, 10, 10))));
        assert_eq!(emitted, vec![Signal::FocusChanged]);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::FocusChanged);

        // Состояние уже обновлено к моменту доставки
        assert_eq!(source.focused_window().map(|w| w.id), Some(WindowId(2)));
    }

    #[test]
    fn test_connect_and_disconnect() {
        let (tx, _rx) = unbounded_channel();
        let caps = Capabilities {
            display_config: false,
            ..Capabilities::all()
        };
        let shared = SharedState::new(tx, caps);
        let mut source = shared.event_source();

        assert!(matches!(
            source.connect(Signal::MonitorsChanged(MonitorProvider::DisplayConfig)),
            Err(FocusCircleError::UnsupportedSignal(_))
        ));

        let id = source.connect(Signal::ScaleChanged).unwrap();
        assert!(shared.is_connected(Signal::ScaleChanged));
        source.disconnect(id).unwrap();
        assert!(!shared.is_connected(Signal::ScaleChanged));
        assert!(matches!(source.disconnect(id), Err(FocusCircleError::UnknownSubscription(_))));
    }

    #[test]
    fn test_provider_availability_changes_at_runtime() {
        let (tx, mut rx) = unbounded_channel();
        let caps = Capabilities {
            display_config: false,
            ..Capabilities::all()
        };
        let shared = SharedState::new(tx, caps);
        let mut source = shared.event_source();
        let display_config = Signal::MonitorsChanged(MonitorProvider::DisplayConfig);

        assert!(source.connect(display_config).is_err());
        shared.provider_ready(MonitorProvider::DisplayConfig);
        source.connect(display_config).unwrap();

        assert!(shared.provider_lost(MonitorProvider::DisplayConfig));
        assert_eq!(
            rx.try_recv().unwrap(),
            HostEvent::MonitorProviderLost(MonitorProvider::DisplayConfig)
        );
        assert!(matches!(
            source.connect(display_config),
            Err(FocusCircleError::UnsupportedSignal(_))
        ));
    }

    #[test]
    fn test_provider_lost_without_subscription_is_silent() {
        let (tx, mut rx) = unbounded_channel();
        let shared = SharedState::new(tx, Capabilities::all());

        assert!(!shared.provider_lost(MonitorProvider::DisplayConfig));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_frame_rect_only_for_focused_window() {
        let (tx, _rx) = unbounded_channel();
        let shared = SharedState::new(tx, Capabilities::all());
        shared.apply(snapshot(Some(window(4, 1, 2, 3, 4))));
        let source = shared.event_source();

        assert_eq!(source.frame_rect(WindowId(4)), Some(Rect::new(1, 2, 3, 4)));
        assert_eq!(source.frame_rect(WindowId(5)), None);
    }
}
