use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod geometry;
mod services;
mod utils;

use config::Config;
use services::{create_host, Extension};

#[derive(Parser, Debug)]
#[command(name = "focus-circle")]
#[command(about = "Показывает временный маркер в левом верхнем углу активного окна")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "focus-circle.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция оконной системы)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let log_level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(log_level, &config.logging.format)?;

    info!("Запуск focus-circle v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - оконная система эмулируется");
    }

    // Все события оконной системы и таймеров проходят через одну очередь
    let (events_tx, mut events_rx) = unbounded_channel();
    let host = create_host(config.clone(), events_tx, args.dry_run).await?;

    let mut extension = Extension::new(config.clone(), host);
    extension.activate()?;

    let mut terminate = unix_signal(SignalKind::terminate())?;
    let mut toggle = unix_signal(SignalKind::user_defined1())?;

    info!("Маркер фокуса запущен (SIGUSR1 - включить/выключить)");

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => extension.handle_event(event),
                None => {
                    warn!("Очередь событий закрыта");
                    break;
                }
            },
            _ = toggle.recv() => match extension.toggle() {
                Ok(active) => info!("Получен SIGUSR1, маркер {}", if active { "включён" } else { "выключен" }),
                Err(e) => error!("Не удалось включить маркер: {}", e),
            },
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
            _ = terminate.recv() => {
                info!("Получен сигнал завершения (SIGTERM)");
                break;
            }
        }
    }

    info!("Завершение работы...");
    extension.deactivate();

    info!("focus-circle завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
