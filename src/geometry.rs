use crate::config::MarkerConfig;
use crate::events::Rect;

/// Размеры маркера для текущего масштаба экрана
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerGeometry {
    pub diameter: u32,
    pub inset: i32,
}

impl MarkerGeometry {
    /// Неположительный или нечисловой масштаб трактуется как 1
    pub fn from_scale(scale: f64, marker: &MarkerConfig) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let title_px = marker.base_title_height * scale;

        Self {
            diameter: (title_px * marker.size_factor).round() as u32,
            inset: (title_px * marker.inset_factor).round() as i32,
        }
    }

    /// Точка внутри рамки окна, куда ставится левый верхний угол маркера
    pub fn anchor(&self, frame: &Rect) -> (i32, i32) {
        (frame.x + self.inset, frame.y + self.inset)
    }
}
