use crate::error::{FocusCircleError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

/// Переменные сессии пользователя, от имени которого демон запущен через sudo.
///
/// uid берётся из `SUDO_UID`, который выставляет sudo, без запуска внешних команд.
fn sudo_session_env(
    user: Option<&str>,
    sudo_user: Option<&str>,
    sudo_uid: Option<&str>,
) -> Vec<(String, String)> {
    let (Some("root"), Some(sudo_user), Some(uid)) = (user, sudo_user, sudo_uid) else {
        return Vec::new();
    };
    let uid = uid.trim();
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
        return Vec::new();
    }

    let user_runtime_dir = format!("/run/user/{}", uid);
    debug!("Подставляем переменные окружения для пользователя {}: uid={}", sudo_user, uid);
    vec![
        (
            "DBUS_SESSION_BUS_ADDRESS".to_string(),
            format!("unix:path={}/bus", user_runtime_dir),
        ),
        ("XDG_RUNTIME_DIR".to_string(), user_runtime_dir),
        ("USER".to_string(), sudo_user.to_string()),
    ]
}

fn build_env_overrides() -> HashMap<String, String> {
    let var = |name: &str| std::env::var(name).ok();
    let mut env_vars: HashMap<String, String> = sudo_session_env(
        var("USER").as_deref(),
        var("SUDO_USER").as_deref(),
        var("SUDO_UID").as_deref(),
    )
    .into_iter()
    .collect();

    for name in ["DISPLAY", "SWAYSOCK", "WAYLAND_DISPLAY"] {
        if let Some(value) = var(name) {
            env_vars.insert(name.to_string(), value);
        }
    }

    env_vars
}

// Окружение процесса не меняется, поэтому собирается один раз
static ENV_OVERRIDES: Lazy<HashMap<String, String>> = Lazy::new(build_env_overrides);

/// Команда внешней утилиты, запускаемая от имени пользователя сессии
pub fn tool_command(program: &str, args: &[&str]) -> Command {
    let mut cmd = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
        let mut cmd = Command::new("sudo");
        cmd.args(["-E", "-u", sudo_user.as_str(), program]);
        cmd.args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    };

    cmd.envs(ENV_OVERRIDES.iter());

    cmd.kill_on_drop(true);
    cmd
}

/// Запустить утилиту и вернуть её stdout
pub async fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = tool_command(program, args).output().await.map_err(|e| {
        debug!("{} не найден или не работает: {}", program, e);
        FocusCircleError::Internal(format!("{} не найден: {}", program, e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return Err(FocusCircleError::Internal(format!(
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
