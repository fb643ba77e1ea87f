use serde::{Deserialize, Serialize};
use std::fmt;

use super::window::WindowId;

/// Идентификатор подписки, выданный источником событий
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Идентификатор запланированного таймера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Поставщик уведомлений об изменении набора мониторов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorProvider {
    /// D-Bus сигнал org.gnome.Mutter.DisplayConfig.MonitorsChanged
    DisplayConfig,
    /// Сравнение списка выходов при опросе
    Outputs,
}

impl MonitorProvider {
    /// Порядок перебора: предпочтительный поставщик первым
    pub const RANKED: [MonitorProvider; 2] = [MonitorProvider::DisplayConfig, MonitorProvider::Outputs];
}

/// Сигнал, на который можно подписаться у источника событий
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    FocusChanged,
    ScaleChanged,
    MonitorsChanged(MonitorProvider),
    PositionChanged(WindowId),
    SizeChanged(WindowId),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::FocusChanged => write!(f, "focus-changed"),
            Signal::ScaleChanged => write!(f, "scale-changed"),
            Signal::MonitorsChanged(provider) => write!(f, "monitors-changed ({:?})", provider),
            Signal::PositionChanged(id) => write!(f, "position-changed [{}]", id),
            Signal::SizeChanged(id) => write!(f, "size-changed [{}]", id),
        }
    }
}

/// Уведомление, доставляемое контроллеру в порядке поступления
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    FocusChanged,
    PositionChanged(WindowId),
    SizeChanged(WindowId),
    ScaleChanged,
    MonitorsChanged,
    /// Поставщик, на которого есть подписка, перестал присылать уведомления
    MonitorProviderLost(MonitorProvider),
    HideTimeout(TimerHandle),
}

impl HostEvent {
    /// Событие, которое порождает подписка на данный сигнал
    pub fn from_signal(signal: Signal) -> Self {
        match signal {
            Signal::FocusChanged => HostEvent::FocusChanged,
            Signal::ScaleChanged => HostEvent::ScaleChanged,
            Signal::MonitorsChanged(_) => HostEvent::MonitorsChanged,
            Signal::PositionChanged(id) => HostEvent::PositionChanged(id),
            Signal::SizeChanged(id) => HostEvent::SizeChanged(id),
        }
    }
}
