use tracing::{debug, info};

/// Позиционируемая поверхность маркера.
///
/// Контроллер только управляет ею; сама отрисовка круга остаётся за реализацией.
pub trait OverlayHandle: Send {
    fn set_size(&mut self, width: u32, height: u32);
    fn set_position(&mut self, x: i32, y: i32);
    fn show(&mut self);
    fn hide(&mut self);
    fn request_redraw(&mut self);
    fn destroy(&mut self);
}

/// Поверхность, которая только отслеживает своё состояние и пишет команды в лог
pub struct LogOverlay {
    name: String,
    size: (u32, u32),
    position: (i32, i32),
    visible: bool,
    destroyed: bool,
}

impl LogOverlay {
    pub fn new(name: &str) -> Self {
        info!("Создание поверхности маркера '{}'", name);
        Self {
            name: name.to_string(),
            size: (0, 0),
            position: (0, 0),
            visible: false,
            destroyed: false,
        }
    }

    #[allow(dead_code)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn alive(&self, command: &str) -> bool {
        if self.destroyed {
            debug!("Поверхность '{}' уже уничтожена, команда {} пропущена", self.name, command);
        }
        !self.destroyed
    }
}

impl OverlayHandle for LogOverlay {
    fn set_size(&mut self, width: u32, height: u32) {
        if !self.alive("set_size") {
            return;
        }
        self.size = (width, height);
        debug!("Маркер '{}': размер {}x{}", self.name, width, height);
    }

    fn set_position(&mut self, x: i32, y: i32) {
        if !self.alive("set_position") {
            return;
        }
        self.position = (x, y);
        debug!("Маркер '{}': позиция ({}, {})", self.name, x, y);
    }

    fn show(&mut self) {
        if !self.alive("show") || self.visible {
            return;
        }
        self.visible = true;
        info!(
            "Маркер '{}' показан в ({}, {}), диаметр {}",
            self.name, self.position.0, self.position.1, self.size.0
        );
    }

    fn hide(&mut self) {
        if !self.alive("hide") || !self.visible {
            return;
        }
        self.visible = false;
        info!("Маркер '{}' скрыт", self.name);
    }

    fn request_redraw(&mut self) {
        if !self.alive("request_redraw") {
            return;
        }
        debug!("Маркер '{}': перерисовка", self.name);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.visible = false;
        self.destroyed = true;
        info!("Поверхность маркера '{}' уничтожена", self.name);
    }
}
