use crate::app::{Camera2D, Rect};

/// Visual description handed to the renderer: where, which sprite frame, and a
/// fallback tint for placeholder drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub rect: Rect,
    pub sprite: &'static str,
    pub frame: usize,
    pub flip_x: bool,
    pub opacity: f32,
    pub tint: [u8; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite(SpriteDraw),
    Outline { rect: Rect, color: [u8; 4] },
}

/// Per-frame render surface filled by the active scene, drawn back to front.
#[derive(Debug, Clone)]
pub struct DrawList {
    camera: Camera2D,
    clear_color: [u8; 4],
    commands: Vec<DrawCommand>,
}

impl Default for DrawList {
    fn default() -> Self {
        Self {
            camera: Camera2D::default(),
            clear_color: [0, 0, 0, 255],
            commands: Vec::new(),
        }
    }
}

impl DrawList {
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn set_camera(&mut self, camera: Camera2D) {
        self.camera = camera;
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn set_clear_color(&mut self, color: [u8; 4]) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> [u8; 4] {
        self.clear_color
    }

    pub fn sprite(&mut self, sprite: SpriteDraw) {
        if sprite.opacity <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::Sprite(sprite));
    }

    pub fn outline(&mut self, rect: Rect, color: [u8; 4]) {
        self.commands.push(DrawCommand::Outline { rect, color });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}
