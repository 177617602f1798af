//! Movement services every player state composes: gravity, horizontal
//! control and per-axis integration against the level.

use engine::{CollisionDetector, InputAction, InputSnapshot, TileQuery};

use super::Avatar;
use crate::level::Level;

/// Below this horizontal speed the player counts as stopped.
pub const STOP_EPSILON: f32 = 0.1;

pub fn apply_gravity(avatar: &mut Avatar, dt: f32) {
    if avatar.body.grounded {
        return;
    }
    let config = avatar.config;
    avatar.body.velocity.y =
        (avatar.body.velocity.y + config.gravity * dt).min(config.max_fall_speed);
}

/// Which single direction is held, if exactly one is.
pub fn held_direction(input: &InputSnapshot) -> Option<f32> {
    match (
        input.is_held(InputAction::MoveLeft),
        input.is_held(InputAction::MoveRight),
    ) {
        (true, false) => Some(-1.0),
        (false, true) => Some(1.0),
        _ => None,
    }
}

pub fn any_direction_held(input: &InputSnapshot) -> bool {
    input.is_held(InputAction::MoveLeft) || input.is_held(InputAction::MoveRight)
}

/// Accelerates toward the held direction or brakes when both or neither are held.
pub fn horizontal_control(avatar: &mut Avatar, input: &InputSnapshot) {
    let config = avatar.config;
    match held_direction(input) {
        Some(direction) if direction < 0.0 => {
            avatar.body.velocity.x =
                (avatar.body.velocity.x - config.acceleration).max(-config.max_speed);
            avatar.facing_right = false;
        }
        Some(_) => {
            avatar.body.velocity.x =
                (avatar.body.velocity.x + config.acceleration).min(config.max_speed);
            avatar.facing_right = true;
        }
        None => slow_down(avatar),
    }
    snap_to_rest(avatar);
}

pub fn slow_down(avatar: &mut Avatar) {
    let deceleration = avatar.config.deceleration;
    let vx = &mut avatar.body.velocity.x;
    if *vx > 0.0 {
        *vx = (*vx - deceleration).max(0.0);
    } else if *vx < 0.0 {
        *vx = (*vx + deceleration).min(0.0);
    }
}

pub fn snap_to_rest(avatar: &mut Avatar) {
    if avatar.body.velocity.x.abs() < STOP_EPSILON {
        avatar.body.velocity.x = 0.0;
    }
}

/// Moves one axis at a time, resolving each against the level, then clamps to
/// the map's horizontal extent and rounds to whole pixels.
pub fn integrate(avatar: &mut Avatar, level: &mut Level, dt: f32) {
    let body = &mut avatar.body;

    body.position.x += body.velocity.x * dt;
    CollisionDetector::resolve_horizontal(level, body);

    body.position.y += body.velocity.y * dt;
    CollisionDetector::resolve_vertical(level, body);

    let max_x = (level.pixel_width() - body.size.x).max(0.0);
    body.position.x = body.position.x.round().clamp(0.0, max_x);
    body.position.y = body.position.y.round();

    avatar.animation.update(dt);
}

/// The part of a tick every state runs first.
pub fn step(avatar: &mut Avatar, level: &mut Level, dt: f32) {
    apply_gravity(avatar, dt);
    integrate(avatar, level, dt);
}
