use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна, выданный источником событий
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Тип окна с точки зрения оконной системы
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    Normal,
    Dialog,
    Dock,
    Desktop,
}

/// Прямоугольник рамки окна в координатах оконной системы
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn same_position(&self, other: &Rect) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub window_type: WindowType,
    pub minimized: bool,
    pub frame_rect: Rect,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            window_type: WindowType::default(),
            minimized: false,
            frame_rect: Rect::default(),
        }
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn with_minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }

    pub fn with_frame(mut self, frame_rect: Rect) -> Self {
        self.frame_rect = frame_rect;
        self
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" [{}] {}", self.title, self.id, self.frame_rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_creation() {
        let window = WindowInfo::new(WindowId(7), "Terminal")
            .with_type(WindowType::Dialog)
            .with_frame(Rect::new(10, 20, 300, 200));

        assert_eq!(window.title, "Terminal");
        assert_eq!(window.window_type, WindowType::Dialog);
        assert!(!window.minimized);
        assert_eq!(window.frame_rect.x, 10);
    }

    #[test]
    fn test_new_window_is_normal_by_default() {
        assert_eq!(WindowType::default(), WindowType::Normal);
        assert_eq!(WindowInfo::new(WindowId(1), "Editor").window_type, WindowType::Normal);
    }

    #[test]
    fn test_rect_comparisons() {
        let a = Rect::new(0, 0, 100, 100);
        let moved = Rect::new(5, 0, 100, 100);
        let resized = Rect::new(0, 0, 120, 100);

        assert!(!a.same_position(&moved));
        assert!(a.same_size(&moved));
        assert!(a.same_position(&resized));
        assert!(!a.same_size(&resized));
    }

    #[test]
    fn test_window_type_deserializes_lowercase() {
        let parsed: Vec<WindowType> = serde_json::from_str(r#"["desktop","dock"]"#).unwrap();
        assert_eq!(parsed, vec![WindowType::Desktop, WindowType::Dock]);
    }
}
