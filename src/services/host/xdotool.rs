use super::desktop::WindowProbe;
use super::shared::Snapshot;
use crate::error::{FocusCircleError, Result};
use crate::events::{Rect, WindowId, WindowInfo, WindowType};
use crate::utils::run_tool;
use tracing::debug;

/// Разобрать вывод `xdotool getwindowgeometry --shell`
fn parse_geometry(output: &str) -> Result<Rect> {
    let mut rect = Rect::default();
    let mut seen = 0;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let parse_err = |_| FocusCircleError::Internal(format!("xdotool: неверное значение {}={}", key, value));
        match key {
            "X" => rect.x = value.parse().map_err(parse_err)?,
            "Y" => rect.y = value.parse().map_err(parse_err)?,
            "WIDTH" => rect.width = value.parse().map_err(parse_err)?,
            "HEIGHT" => rect.height = value.parse().map_err(parse_err)?,
            _ => continue,
        }
        seen += 1;
    }

    if seen < 4 {
        return Err(FocusCircleError::Internal(
            "xdotool не вернул полную геометрию окна".to_string(),
        ));
    }
    Ok(rect)
}

/// Разобрать вывод `xprop -id <id> _NET_WM_WINDOW_TYPE _NET_WM_STATE`
fn parse_xprop(output: &str) -> (WindowType, bool) {
    let mut window_type = WindowType::Normal;
    let mut minimized = false;

    for line in output.lines() {
        if line.starts_with("_NET_WM_WINDOW_TYPE") {
            if line.contains("_NET_WM_WINDOW_TYPE_DESKTOP") {
                window_type = WindowType::Desktop;
            } else if line.contains("_NET_WM_WINDOW_TYPE_DOCK") {
                window_type = WindowType::Dock;
            } else if line.contains("_NET_WM_WINDOW_TYPE_DIALOG") {
                window_type = WindowType::Dialog;
            }
        } else if line.starts_with("_NET_WM_STATE") && line.contains("_NET_WM_STATE_HIDDEN") {
            minimized = true;
        }
    }

    (window_type, minimized)
}

/// Разобрать вывод `xrandr --listmonitors` в отсортированный список мониторов
fn parse_monitors(output: &str) -> Vec<String> {
    let mut monitors: Vec<String> = output
        .lines()
        .skip_while(|line| line.starts_with("Monitors:"))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    monitors.sort();
    monitors
}

/// Масштаб из `Xft.dpi` в выводе `xrdb -query` (96 dpi = 1)
fn parse_xft_dpi(output: &str) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "Xft.dpi")
        .and_then(|(_, value)| value.trim().parse::<f64>().ok())
        .filter(|dpi| dpi.is_finite() && *dpi > 0.0)
        .map(|dpi| dpi / 96.0)
}

fn scale_from_env() -> f64 {
    std::env::var("GDK_SCALE")
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(1.0)
}

/// Текущий масштаб X-сессии: ресурсы X меняются на лету, GDK_SCALE нет
async fn current_scale() -> f64 {
    match run_tool("xrdb", &["-query"]).await {
        Ok(output) => parse_xft_dpi(&output).unwrap_or_else(scale_from_env),
        Err(_) => scale_from_env(),
    }
}

pub struct XdotoolProbe;

impl XdotoolProbe {
    pub fn new() -> Self {
        Self
    }

    async fn focused_window(&self) -> Result<Option<WindowInfo>> {
        // getactivewindow завершается с ошибкой, когда активного окна нет
        let id = match run_tool("xdotool", &["getactivewindow"]).await {
            Ok(output) => output.trim().to_string(),
            Err(e) => {
                debug!("Активное окно не определено: {}", e);
                return Ok(None);
            }
        };
        let numeric_id: u64 = id
            .parse()
            .map_err(|_| FocusCircleError::Internal(format!("xdotool вернул неверный id окна: {}", id)))?;

        let geometry = run_tool("xdotool", &["getwindowgeometry", "--shell", id.as_str()]).await?;
        let title = run_tool("xdotool", &["getwindowname", id.as_str()])
            .await
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let (window_type, minimized) = match run_tool(
            "xprop",
            &["-id", id.as_str(), "_NET_WM_WINDOW_TYPE", "_NET_WM_STATE"],
        )
        .await
        {
            Ok(output) => parse_xprop(&output),
            Err(_) => (WindowType::Normal, false),
        };

        Ok(Some(
            WindowInfo::new(WindowId(numeric_id), title)
                .with_type(window_type)
                .with_minimized(minimized)
                .with_frame(parse_geometry(&geometry)?),
        ))
    }
}

#[async_trait::async_trait]
impl WindowProbe for XdotoolProbe {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    async fn test(&self) -> Result<()> {
        run_tool("xdotool", &["version"]).await.map(|_| ())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let focused = self.focused_window().await?;
        let monitors = run_tool("xrandr", &["--listmonitors"])
            .await
            .map(|output| parse_monitors(&output))
            .unwrap_or_default();

        Ok(Snapshot {
            focused,
            scale: current_scale().await,
            monitors,
        })
    }
}
