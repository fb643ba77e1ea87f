//! Host backends: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for observing the windowing
//! system (focused window, its frame, display scale, monitor topology) and emitting
//! HostEvent(s) for live subscriptions. They MUST NOT decide when the marker is shown
//! or hidden; all of that belongs to FocusMarker.

mod desktop;
mod display_config;
mod dry_run;
pub mod shared;
mod sway;
mod xdotool;

use crate::config::Config;
use crate::error::Result;
use crate::events::{HostEvent, Rect, Signal, SubscriptionId, WindowId, WindowInfo};
use crate::services::overlay::{LogOverlay, OverlayHandle};
use crate::services::timer::{TimerService, TokioTimerService};
use shared::SharedState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::info;

/// Источник уведомлений оконной системы
pub trait EventSource: Send {
    /// Подписаться на сигнал; `UnsupportedSignal`, если источник его не умеет
    fn connect(&mut self, signal: Signal) -> Result<SubscriptionId>;
    fn disconnect(&mut self, id: SubscriptionId) -> Result<()>;
    fn focused_window(&self) -> Option<WindowInfo>;
    fn frame_rect(&self, window: WindowId) -> Option<Rect>;
    fn scale_factor(&self) -> f64;
}

/// Всё, что контроллеру нужно от окружения на время одной активации
pub trait Host: Send {
    fn name(&self) -> &str;
    fn event_source(&mut self) -> Box<dyn EventSource>;
    fn create_overlay(&mut self) -> Result<Box<dyn OverlayHandle>>;
    fn timer_service(&mut self) -> Box<dyn TimerService>;
}

/// Хост, чьё состояние обновляют фоновые задачи (опрос или сценарий)
pub struct BackendHost {
    name: String,
    shared: Arc<SharedState>,
    events: UnboundedSender<HostEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl BackendHost {
    fn new(
        name: impl Into<String>,
        shared: Arc<SharedState>,
        events: UnboundedSender<HostEvent>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            name: name.into(),
            shared,
            events,
            tasks,
        }
    }
}

impl Host for BackendHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn event_source(&mut self) -> Box<dyn EventSource> {
        Box::new(self.shared.event_source())
    }

    fn create_overlay(&mut self) -> Result<Box<dyn OverlayHandle>> {
        Ok(Box::new(LogOverlay::new(&self.name)))
    }

    fn timer_service(&mut self) -> Box<dyn TimerService> {
        Box::new(TokioTimerService::new(self.events.clone()))
    }
}

impl Drop for BackendHost {
    fn drop(&mut self) {
        info!("Хост '{}' завершает работу", self.name);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Factory function to create an appropriate host based on the dry_run flag
pub async fn create_host(
    config: Arc<Config>,
    events: UnboundedSender<HostEvent>,
    dry_run: bool,
) -> Result<Box<dyn Host>> {
    if dry_run {
        Ok(Box::new(dry_run::start(config, events)))
    } else {
        Ok(Box::new(desktop::start(config, events).await?))
    }
}
