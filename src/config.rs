use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::events::{WindowInfo, WindowType};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub marker: MarkerConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Размеры маркера задаются относительно условной высоты заголовка окна
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarkerConfig {
    pub base_title_height: f64,
    pub size_factor: f64,
    pub inset_factor: f64,
    pub hide_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub detection_mode: String,
    pub polling_interval_ms: u64,
    pub excluded_types: Vec<WindowType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            marker: MarkerConfig {
                base_title_height: 32.0,
                size_factor: 0.42,
                inset_factor: 0.15,
                hide_timeout_ms: 10_000,
            },
            window: WindowConfig {
                detection_mode: "auto".to_string(),
                polling_interval_ms: 100,
                excluded_types: vec![WindowType::Desktop],
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: остаются значения по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FOCUS_CIRCLE_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация размеров маркера
        let marker = &self.marker;
        for (name, value) in [
            ("base_title_height", marker.base_title_height),
            ("size_factor", marker.size_factor),
            ("inset_factor", marker.inset_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{} должно быть положительным числом, получено {}", name, value);
            }
        }

        if marker.hide_timeout_ms == 0 {
            anyhow::bail!("hide_timeout_ms должно быть больше 0");
        }

        // Валидация настроек окон
        match self.window.detection_mode.as_str() {
            "auto" | "sway" | "xdotool" => {}
            _ => anyhow::bail!(
                "Неверный режим детекции окон: {}",
                self.window.detection_mode
            ),
        }

        if self.window.polling_interval_ms < 20 {
            anyhow::bail!("polling_interval_ms должно быть минимум 20");
        }

        Ok(())
    }

    /// Подходит ли окно для отображения маркера
    pub fn is_suitable(&self, window: &WindowInfo) -> bool {
        !window.minimized && !self.window.excluded_types.contains(&window.window_type)
    }
}
