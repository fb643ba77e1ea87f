use thiserror::Error;

use crate::events::Signal;

#[derive(Error, Debug)]
pub enum FocusCircleError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка разбора JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Сигнал {0} не поддерживается источником событий")]
    UnsupportedSignal(Signal),

    #[error("Подписка #{0} не найдена")]
    UnknownSubscription(u64),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FocusCircleError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! focus_error {
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::FocusCircleError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::FocusCircleError::Internal(format!($($arg)*))
    };
}
