use crate::debug_if_enabled;
use crate::events::{HostEvent, TimerHandle};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Однократные отложенные уведомления для автоскрытия маркера
pub trait TimerService: Send {
    /// По истечении `delay` в очередь событий придёт `HostEvent::HideTimeout(handle)`
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

// Номера таймеров уникальны в пределах процесса, чтобы запоздавшее
// событие от прежнего контроллера не совпало с новым таймером.
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_timer_handle() -> TimerHandle {
    TimerHandle(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
}

pub struct TokioTimerService {
    events: UnboundedSender<HostEvent>,
    active: Arc<DashMap<TimerHandle, JoinHandle<()>>>,
}

impl TokioTimerService {
    pub fn new(events: UnboundedSender<HostEvent>) -> Self {
        Self {
            events,
            active: Arc::new(DashMap::new()),
        }
    }
}

impl TimerService for TokioTimerService {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        let handle = next_timer_handle();
        let events = self.events.clone();
        let active = Arc::clone(&self.active);

        let task = tokio::spawn(async move {
            sleep(delay).await;
            active.remove(&handle);
            debug_if_enabled!("Таймер {:?} сработал", handle);
            // Получатель мог уже завершиться при остановке демона
            let _ = events.send(HostEvent::HideTimeout(handle));
        });

        self.active.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some((_, task)) = self.active.remove(&handle) {
            task.abort();
            debug_if_enabled!("Таймер {:?} отменён", handle);
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        let handles: Vec<TimerHandle> = self.active.iter().map(|entry| *entry.key()).collect();
        for handle in handles {
            if let Some((_, task)) = self.active.remove(&handle) {
                task.abort();
            }
        }
    }
}
