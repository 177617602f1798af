use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World pixels map 1:1 onto the logical framebuffer; only the camera offset applies.
pub fn world_to_screen_px(camera: &Camera2D, world: Vec2) -> (i32, i32) {
    let x = world.x - camera.position.x;
    let y = world.y - camera.position.y;
    (x.round() as i32, y.round() as i32)
}
