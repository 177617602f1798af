use engine::{Body, DrawList, EntityId, SpriteDraw, TileQuery, Vec2};

use super::patrol::step_patrol;

pub const MUSHROOM_SIZE: f32 = 16.0;

#[derive(Debug, Clone)]
pub struct Mushroom {
    pub id: EntityId,
    pub body: Body,
    pub direction: f32,
    pub opacity: f32,
    spawning: bool,
    collected: bool,
}

impl Mushroom {
    pub fn new(id: EntityId, position: Vec2) -> Self {
        Self {
            id,
            body: Body::new(position, Vec2::new(MUSHROOM_SIZE, MUSHROOM_SIZE)),
            direction: 1.0,
            opacity: 1.0,
            spawning: true,
            collected: false,
        }
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    pub fn finish_spawning(&mut self) {
        self.spawning = false;
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Returns false if it was already collected.
    pub fn collect(&mut self) -> bool {
        !std::mem::replace(&mut self.collected, true)
    }

    pub fn toggle_opacity(&mut self) {
        self.opacity = if self.opacity >= 1.0 { 0.0 } else { 1.0 };
    }

    pub fn update<W: TileQuery + ?Sized>(&mut self, world: &W, dt: f32) {
        if self.collected {
            return;
        }
        step_patrol(world, &mut self.body, &mut self.direction, !self.spawning, dt);
    }

    pub fn draw(&self, frame: &mut DrawList) {
        if self.collected {
            return;
        }
        frame.sprite(SpriteDraw {
            rect: self.body.rect(),
            sprite: "mushroom",
            frame: 0,
            flip_x: false,
            opacity: self.opacity,
            tint: [228, 44, 32, 255],
        });
    }
}
