//! FocusMarker: the focus-tracking and visibility state machine.
//!
//! Reacts to HostEvent(s) one at a time, in delivery order. Owns the overlay,
//! the pending hide timer and every subscription it made; nothing else may
//! mutate them.

use crate::config::Config;
use crate::error::Result;
use crate::events::{HostEvent, MonitorProvider, Signal, TimerHandle, WindowId};
use crate::geometry::MarkerGeometry;
use crate::services::host::{EventSource, Host};
use crate::services::overlay::OverlayHandle;
use crate::services::subscriptions::SubscriptionSet;
use crate::services::timer::TimerService;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

pub struct FocusMarker {
    config: Arc<Config>,
    source: Box<dyn EventSource>,
    overlay: Option<Box<dyn OverlayHandle>>,
    timer: Box<dyn TimerService>,
    geometry: MarkerGeometry,

    tracked: Option<WindowId>,
    suppressed: Option<WindowId>,
    pending_hide: Option<TimerHandle>,

    // Подписки на уровне оконной системы и на текущее окно
    global_subscriptions: SubscriptionSet,
    geometry_subscriptions: SubscriptionSet,
    monitor_provider: Option<MonitorProvider>,
}

impl FocusMarker {
    /// Создать контроллер и сразу обработать текущий фокус.
    ///
    /// Без подписки на смену фокуса контроллер бесполезен, поэтому её отсутствие
    /// считается ошибкой; всё уже захваченное при этом освобождается.
    pub fn new(config: Arc<Config>, host: &mut dyn Host) -> Result<Self> {
        info!("Инициализация FocusMarker на хосте '{}'", host.name());

        let source = host.event_source();
        let geometry = MarkerGeometry::from_scale(source.scale_factor(), &config.marker);
        let timer = host.timer_service();
        let overlay = host.create_overlay()?;

        let mut marker = Self {
            config,
            source,
            overlay: Some(overlay),
            timer,
            geometry,
            tracked: None,
            suppressed: None,
            pending_hide: None,
            global_subscriptions: SubscriptionSet::new(),
            geometry_subscriptions: SubscriptionSet::new(),
            monitor_provider: None,
        };

        if let Some(overlay) = marker.overlay.as_mut() {
            overlay.set_size(geometry.diameter, geometry.diameter);
        }

        if let Err(e) = marker
            .global_subscriptions
            .try_connect(marker.source.as_mut(), Signal::FocusChanged)
        {
            marker.destroy();
            return Err(e);
        }
        if !marker
            .global_subscriptions
            .connect(marker.source.as_mut(), Signal::ScaleChanged)
        {
            warn!("Источник не сообщает об изменении масштаба");
        }
        marker.bind_monitor_provider();

        marker.on_focus_changed();
        Ok(marker)
    }

    /// Перебрать поставщиков уведомлений о мониторах в порядке предпочтения
    fn bind_monitor_provider(&mut self) {
        for provider in MonitorProvider::RANKED {
            if self
                .global_subscriptions
                .connect(self.source.as_mut(), Signal::MonitorsChanged(provider))
            {
                info!("Уведомления о мониторах: {:?}", provider);
                self.monitor_provider = Some(provider);
                return;
            }
        }
        warn!("Ни один поставщик уведомлений о мониторах недоступен");
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        if self.overlay.is_none() {
            debug!("FocusMarker уже остановлен, событие {:?} пропущено", event);
            return;
        }

        debug!("FocusMarker: {:?}", event);
        match event {
            HostEvent::FocusChanged => self.on_focus_changed(),
            HostEvent::PositionChanged(window) => self.on_position_changed(window),
            HostEvent::SizeChanged(window) => self.on_size_changed(window),
            HostEvent::ScaleChanged | HostEvent::MonitorsChanged => self.recompute_geometry(),
            HostEvent::MonitorProviderLost(provider) => self.on_monitor_provider_lost(provider),
            HostEvent::HideTimeout(handle) => self.on_hide_timeout(handle),
        }
    }

    fn on_focus_changed(&mut self) {
        let focused = self
            .source
            .focused_window()
            .filter(|window| self.config.is_suitable(window));

        let Some(window) = focused else {
            self.geometry_subscriptions.release_all(self.source.as_mut());
            self.tracked = None;
            self.hide();
            self.cancel_hide_timer();
            return;
        };

        // Фокус ушёл на другое окно: подавление снимается
        if self.tracked != Some(window.id) {
            self.suppressed = None;
        }

        self.tracked = Some(window.id);
        self.connect_geometry_signals(window.id);

        if self.suppressed == Some(window.id) {
            self.hide();
            self.cancel_hide_timer();
            return;
        }

        let (x, y) = self.geometry.anchor(&window.frame_rect);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_position(x, y);
            overlay.show();
            overlay.request_redraw();
        }
        debug!("Маркер у окна {}", window);

        self.restart_hide_timer();
    }

    fn on_position_changed(&mut self, window: WindowId) {
        if self.tracked != Some(window) {
            debug!("Перемещение окна {} проигнорировано: окно не отслеживается", window);
            return;
        }

        self.suppressed = Some(window);
        self.hide();
        self.cancel_hide_timer();
    }

    fn on_size_changed(&mut self, window: WindowId) {
        if self.tracked != Some(window) {
            debug!("Изменение размера окна {} проигнорировано: окно не отслеживается", window);
            return;
        }

        // Видимость и таймер не трогаем, только переносим маркер
        let Some(frame) = self.source.frame_rect(window) else {
            return;
        };
        let (x, y) = self.geometry.anchor(&frame);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_position(x, y);
            overlay.request_redraw();
        }
    }

    fn recompute_geometry(&mut self) {
        self.geometry = MarkerGeometry::from_scale(self.source.scale_factor(), &self.config.marker);
        info!(
            "Пересчёт размеров маркера: диаметр {}, отступ {}",
            self.geometry.diameter, self.geometry.inset
        );

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_size(self.geometry.diameter, self.geometry.diameter);
            overlay.request_redraw();
        }

        self.on_focus_changed();
    }

    fn on_monitor_provider_lost(&mut self, provider: MonitorProvider) {
        if self.monitor_provider != Some(provider) {
            return;
        }

        warn!("Поставщик уведомлений о мониторах {:?} пропал", provider);
        self.global_subscriptions
            .release(self.source.as_mut(), Signal::MonitorsChanged(provider));
        self.monitor_provider = None;
        self.bind_monitor_provider();

        // Пока поставщика не было, мониторы могли измениться
        self.recompute_geometry();
    }

    fn on_hide_timeout(&mut self, handle: TimerHandle) {
        // Запоздавшее срабатывание уже отменённого таймера
        if self.pending_hide != Some(handle) {
            debug!("Устаревший таймер {:?} проигнорирован", handle);
            return;
        }

        self.pending_hide = None;
        self.hide();
    }

    fn connect_geometry_signals(&mut self, window: WindowId) {
        self.geometry_subscriptions.release_all(self.source.as_mut());
        self.geometry_subscriptions
            .connect(self.source.as_mut(), Signal::PositionChanged(window));
        self.geometry_subscriptions
            .connect(self.source.as_mut(), Signal::SizeChanged(window));
    }

    fn hide(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.hide();
        }
    }

    fn restart_hide_timer(&mut self) {
        self.cancel_hide_timer();
        let delay = Duration::from_millis(self.config.marker.hide_timeout_ms);
        self.pending_hide = Some(self.timer.schedule_once(delay));
    }

    fn cancel_hide_timer(&mut self) {
        if let Some(handle) = self.pending_hide.take() {
            self.timer.cancel(handle);
        }
    }

    #[allow(dead_code)]
    pub fn tracked_window(&self) -> Option<WindowId> {
        self.tracked
    }

    #[allow(dead_code)]
    pub fn suppressed_window(&self) -> Option<WindowId> {
        self.suppressed
    }

    #[allow(dead_code)]
    pub fn monitor_provider(&self) -> Option<MonitorProvider> {
        self.monitor_provider
    }

    /// Освободить все ресурсы. Повторный вызов ничего не делает.
    pub fn destroy(&mut self) {
        self.global_subscriptions.release_all(self.source.as_mut());
        self.geometry_subscriptions.release_all(self.source.as_mut());
        self.cancel_hide_timer();
        self.tracked = None;
        self.suppressed = None;
        self.monitor_provider = None;

        if let Some(mut overlay) = self.overlay.take() {
            overlay.destroy();
            info!("FocusMarker остановлен");
        }
    }
}

impl Drop for FocusMarker {
    fn drop(&mut self) {
        self.destroy();
    }
}
