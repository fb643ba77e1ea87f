use super::display_config::DisplayConfigListener;
use super::shared::{Capabilities, SharedState, Snapshot};
use super::sway::SwayProbe;
use super::xdotool::XdotoolProbe;
use super::BackendHost;
use crate::config::Config;
use crate::error::{FocusCircleError, Result};
use crate::events::HostEvent;
use crate::{debug_if_enabled, trace_if_enabled};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Способ получить состояние оконной системы через внешние утилиты
#[async_trait::async_trait]
pub trait WindowProbe: Send + Sync {
    fn name(&self) -> &'static str;
    async fn test(&self) -> Result<()>;
    async fn snapshot(&self) -> Result<Snapshot>;
}

fn boxed<P: WindowProbe + 'static>(probe: P) -> Box<dyn WindowProbe> {
    Box::new(probe)
}

/// Кандидаты в порядке предпочтения для заданного режима детекции
fn candidate_probes(detection_mode: &str) -> Vec<Box<dyn WindowProbe>> {
    match detection_mode {
        "sway" => vec![boxed(SwayProbe::new())],
        "xdotool" => vec![boxed(XdotoolProbe::new())],
        _ => {
            let on_sway = std::env::var("SWAYSOCK").is_ok()
                || std::env::var("XDG_CURRENT_DESKTOP")
                    .map(|d| d.to_lowercase().contains("sway"))
                    .unwrap_or(false);
            if on_sway {
                vec![boxed(SwayProbe::new()), boxed(XdotoolProbe::new())]
            } else {
                vec![boxed(XdotoolProbe::new()), boxed(SwayProbe::new())]
            }
        }
    }
}

async fn detect_working_probe(probes: &[Box<dyn WindowProbe>]) -> Option<usize> {
    info!("Определяем рабочий метод детекции окон...");
    for (index, probe) in probes.iter().enumerate() {
        match probe.test().await {
            Ok(()) => {
                info!("Используем {}", probe.name());
                return Some(index);
            }
            Err(e) => {
                debug_if_enabled!("{} недоступен: {}", probe.name(), e);
            }
        }
    }
    None
}

/// Запустить хост, опрашивающий оконную систему
pub async fn start(config: Arc<Config>, events: UnboundedSender<HostEvent>) -> Result<BackendHost> {
    info!(
        "Инициализация DesktopHost (режим детекции: {})",
        config.window.detection_mode
    );

    let probes = candidate_probes(&config.window.detection_mode);
    let mut working = detect_working_probe(&probes)
        .await
        .ok_or_else(|| FocusCircleError::ServiceUnavailable("Ни один метод детекции окон не работает".to_string()))?;

    let display_config = match DisplayConfigListener::probe().await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("D-Bus недоступен, уведомления DisplayConfig отключены: {}", e);
            None
        }
    };

    // DisplayConfig включит сам слушатель, когда подпишется на сигнал
    let capabilities = Capabilities {
        display_config: false,
        ..Capabilities::all()
    };
    let shared = SharedState::new(events.clone(), capabilities);

    // Начальное состояние до первых подписок
    match probes[working].snapshot().await {
        Ok(snapshot) => {
            shared.apply(snapshot);
        }
        Err(e) => warn!("Не удалось получить начальное состояние: {}", e),
    }

    let mut tasks = Vec::new();

    if let Some(listener) = display_config {
        match listener.spawn(Arc::clone(&shared)).await {
            Ok(task) => tasks.push(task),
            Err(e) => warn!("Не удалось подписаться на MonitorsChanged: {}", e),
        }
    }

    let poller_shared = Arc::clone(&shared);
    let polling_interval = Duration::from_millis(config.window.polling_interval_ms);
    tasks.push(tokio::spawn(async move {
        let mut ticker = interval(polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Опрос оконной системы активен с методом: {}", probes[working].name());

        loop {
            ticker.tick().await;

            match probes[working].snapshot().await {
                Ok(snapshot) => {
                    trace_if_enabled!("Снимок состояния: {:?}", snapshot);
                    let emitted = poller_shared.apply(snapshot);
                    if !emitted.is_empty() {
                        debug_if_enabled!("Отправлены события: {:?}", emitted);
                    }
                }
                Err(e) => {
                    warn!(
                        "Рабочий метод {} перестал работать: {}. Переопределяем...",
                        probes[working].name(),
                        e
                    );
                    match detect_working_probe(&probes).await {
                        Some(index) => working = index,
                        None => {
                            error!("Ни один метод не работает. Приостанавливаем детекцию на 10 секунд");
                            sleep(Duration::from_secs(10)).await;
                        }
                    }
                }
            }
        }
    }));

    Ok(BackendHost::new("desktop", shared, events, tasks))
}
