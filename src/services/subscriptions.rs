use crate::error::Result;
use crate::events::{Signal, SubscriptionId};
use crate::services::host::EventSource;
use smallvec::SmallVec;
use tracing::debug;

/// Набор живых подписок, освобождаемых вместе
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    entries: SmallVec<[(Signal, SubscriptionId); 3]>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_connect(&mut self, source: &mut dyn EventSource, signal: Signal) -> Result<()> {
        let id = source.connect(signal)?;
        self.entries.push((signal, id));
        Ok(())
    }

    /// Подписаться на сигнал. Неподдерживаемый сигнал просто не попадает в набор.
    pub fn connect(&mut self, source: &mut dyn EventSource, signal: Signal) -> bool {
        match self.try_connect(source, signal) {
            Ok(()) => true,
            Err(e) => {
                debug!("Подписка на {} недоступна: {}", signal, e);
                false
            }
        }
    }

    /// Отписаться от одного сигнала, если он есть в наборе
    pub fn release(&mut self, source: &mut dyn EventSource, signal: Signal) {
        let (released, kept): (SmallVec<[_; 3]>, SmallVec<[_; 3]>) =
            self.entries.drain(..).partition(|(s, _)| *s == signal);
        self.entries = kept;
        for (signal, id) in released {
            if let Err(e) = source.disconnect(id) {
                debug!("Не удалось отписаться от {} ({}): {}", signal, id, e);
            }
        }
    }

    /// Отписаться от всего. Ошибки отписки игнорируются.
    pub fn release_all(&mut self, source: &mut dyn EventSource) {
        for (signal, id) in self.entries.drain(..) {
            if let Err(e) = source.disconnect(id) {
                debug!("Не удалось отписаться от {} ({}): {}", signal, id, e);
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{HostEvent, WindowId};
    use crate::services::host::shared::{Capabilities, SharedState};
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_unsupported_signal_is_skipped() {
        let (tx, _rx) = unbounded_channel::<HostEvent>();
        let shared = SharedState::new(tx, Capabilities { size_changed: false, ..Capabilities::all() });
        let mut source = shared.event_source();
        let mut set = SubscriptionSet::new();

        assert!(set.connect(&mut source, Signal::PositionChanged(WindowId(1))));
        assert!(!set.connect(&mut source, Signal::SizeChanged(WindowId(1))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_release_single_signal() {
        let (tx, _rx) = unbounded_channel::<HostEvent>();
        let shared = SharedState::new(tx, Capabilities::all());
        let mut source = shared.event_source();
        let mut set = SubscriptionSet::new();

        set.connect(&mut source, Signal::FocusChanged);
        set.connect(&mut source, Signal::ScaleChanged);
        set.release(&mut source, Signal::ScaleChanged);

        assert_eq!(set.len(), 1);
        assert!(shared.is_connected(Signal::FocusChanged));
        assert!(!shared.is_connected(Signal::ScaleChanged));
    }

    #[test]
    fn test_release_all_swallows_stale_handles() {
        let (tx, _rx) = unbounded_channel::<HostEvent>();
        let shared = SharedState::new(tx, Capabilities::all());
        let mut source = shared.event_source();
        let mut set = SubscriptionSet::new();

        set.connect(&mut source, Signal::FocusChanged);
        set.connect(&mut source, Signal::ScaleChanged);
        // Источник уже забыл подписки (например, окно закрылось)
        shared.clear_subscriptions();

        set.release_all(&mut source);
        assert!(set.is_empty());
        assert_eq!(shared.subscription_count(), 0);
    }
}
