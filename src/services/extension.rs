use crate::config::Config;
use crate::error::Result;
use crate::events::HostEvent;
use crate::services::focus_marker::FocusMarker;
use crate::services::host::Host;
use std::sync::Arc;
use tracing::{debug, info};

/// Внешний жизненный цикл: не более одного контроллера между activate и deactivate
pub struct Extension {
    config: Arc<Config>,
    host: Box<dyn Host>,
    marker: Option<FocusMarker>,
}

impl Extension {
    pub fn new(config: Arc<Config>, host: Box<dyn Host>) -> Self {
        Self {
            config,
            host,
            marker: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.marker.is_some()
    }

    pub fn activate(&mut self) -> Result<()> {
        if self.marker.is_some() {
            debug!("Маркер уже активен");
            return Ok(());
        }

        let marker = FocusMarker::new(Arc::clone(&self.config), self.host.as_mut())?;
        self.marker = Some(marker);
        info!("Маркер фокуса включён");
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if let Some(mut marker) = self.marker.take() {
            marker.destroy();
            info!("Маркер фокуса выключен");
        }
    }

    /// Переключить состояние; возвращает, активен ли маркер после переключения
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_active() {
            self.deactivate();
        } else {
            self.activate()?;
        }
        Ok(self.is_active())
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match self.marker.as_mut() {
            Some(marker) => marker.handle_event(event),
            None => debug!("Маркер выключен, событие {:?} пропущено", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::host::shared::Capabilities;
    use crate::services::test_support::{focused, window, TestHost};

    fn extension() -> (Extension, TestHost) {
        let (host, _rx) = TestHost::new(Capabilities::all());
        host.shared.apply(focused(Some(window(1, 100, 200))));

        // Хост внутри расширения делит состояние с копией для проверок
        let probe = TestHost {
            shared: host.shared.clone(),
            overlay: host.overlay.clone(),
            timers: host.timers.clone(),
            fail_overlay: false,
        };
        (Extension::new(Arc::new(Config::default()), Box::new(host)), probe)
    }

    #[test]
    fn test_activate_is_idempotent() {
        let (mut ext, probe) = extension();

        ext.activate().unwrap();
        ext.activate().unwrap();

        assert!(ext.is_active());
        assert!(probe.overlay.lock().visible);
        assert_eq!(probe.timers.lock().scheduled.len(), 1);
        assert_eq!(probe.shared.subscription_count(), 5);
    }

    #[test]
    fn test_deactivate_releases_everything() {
        let (mut ext, probe) = extension();
        ext.activate().unwrap();
        let pending = probe.timers.lock().pending();
        assert_eq!(pending.len(), 1);

        ext.deactivate();
        assert!(!ext.is_active());
        assert!(probe.overlay.lock().destroyed);
        assert!(probe.timers.lock().pending().is_empty());
        assert_eq!(probe.shared.subscription_count(), 0);

        // Запоздавший таймер и повторное выключение ничего не делают
        ext.handle_event(HostEvent::HideTimeout(pending[0]));
        ext.deactivate();
        assert!(probe.overlay.lock().destroyed);
    }

    #[test]
    fn test_toggle_reactivates_with_fresh_overlay() {
        let (mut ext, probe) = extension();

        assert!(ext.toggle().unwrap());
        assert!(!ext.toggle().unwrap());
        assert!(ext.toggle().unwrap());

        let overlay = probe.overlay.lock().clone();
        assert!(!overlay.destroyed);
        assert!(overlay.visible);
        assert_eq!(probe.shared.subscription_count(), 5);
    }

    #[test]
    fn test_events_while_inactive_are_dropped() {
        let (mut ext, probe) = extension();
        ext.handle_event(HostEvent::FocusChanged);

        assert!(!probe.overlay.lock().visible);
        assert!(probe.timers.lock().scheduled.is_empty());
    }
}
