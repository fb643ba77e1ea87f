pub mod host;
pub mod window;

pub use host::{HostEvent, MonitorProvider, Signal, SubscriptionId, TimerHandle};
pub use window::{Rect, WindowId, WindowInfo, WindowType};
