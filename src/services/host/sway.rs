use super::desktop::WindowProbe;
use super::shared::Snapshot;
use crate::error::Result;
use crate::events::{Rect, WindowId, WindowInfo, WindowType};
use crate::utils::run_tool;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SwayRect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl From<&SwayRect> for Rect {
    fn from(rect: &SwayRect) -> Self {
        Rect::new(rect.x, rect.y, rect.width, rect.height)
    }
}

#[derive(Debug, Deserialize)]
struct SwayNode {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    focused: bool,
    rect: SwayRect,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    nodes: Vec<SwayNode>,
    #[serde(default)]
    floating_nodes: Vec<SwayNode>,
}

impl SwayNode {
    fn find_focused(&self) -> Option<&SwayNode> {
        if self.focused {
            return Some(self);
        }
        self.nodes
            .iter()
            .chain(self.floating_nodes.iter())
            .find_map(SwayNode::find_focused)
    }
}

#[derive(Debug, Deserialize)]
struct SwayOutput {
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    scale: Option<f64>,
    rect: SwayRect,
}

/// Разобрать вывод `swaymsg -t get_tree` и найти окно с фокусом
fn parse_tree(json: &str) -> Result<Option<WindowInfo>> {
    let root: SwayNode = serde_json::from_str(json)?;

    let window = root.find_focused().and_then(|node| {
        // Фокус на пустом рабочем столе или выходе означает отсутствие окна
        let window_type = match node.node_type.as_str() {
            "con" => WindowType::Normal,
            "floating_con" => WindowType::Dialog,
            _ => return None,
        };

        Some(
            WindowInfo::new(WindowId(node.id), node.name.clone().unwrap_or_default())
                .with_type(window_type)
                .with_minimized(node.visible == Some(false))
                .with_frame(Rect::from(&node.rect)),
        )
    });

    Ok(window)
}

/// Разобрать вывод `swaymsg -t get_outputs`: масштаб выхода с фокусом и список активных выходов
fn parse_outputs(json: &str) -> Result<(f64, Vec<String>)> {
    let outputs: Vec<SwayOutput> = serde_json::from_str(json)?;

    let scale = outputs
        .iter()
        .find(|o| o.focused)
        .or_else(|| outputs.iter().find(|o| o.active))
        .and_then(|o| o.scale)
        .unwrap_or(1.0);

    let mut monitors: Vec<String> = outputs
        .iter()
        .filter(|o| o.active)
        .map(|o| format!("{}@{}", o.name, Rect::from(&o.rect)))
        .collect();
    monitors.sort();

    Ok((scale, monitors))
}

pub struct SwayProbe;

impl SwayProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl WindowProbe for SwayProbe {
    fn name(&self) -> &'static str {
        "sway"
    }

    async fn test(&self) -> Result<()> {
        run_tool("swaymsg", &["-t", "get_version"]).await.map(|_| ())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let tree = run_tool("swaymsg", &["-t", "get_tree"]).await?;
        let outputs = run_tool("swaymsg", &["-t", "get_outputs"]).await?;

        let focused = parse_tree(&tree)?;
        let (scale, monitors) = parse_outputs(&outputs)?;

        Ok(Snapshot {
            focused,
            scale,
            monitors,
        })
    }
}
