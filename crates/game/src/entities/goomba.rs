use engine::{Animation, Body, DrawList, EntityId, SpriteDraw, TileQuery, Vec2};

use super::patrol::step_patrol;

pub const GOOMBA_SIZE: f32 = 16.0;
const WALK_FRAMES: usize = 2;
const WALK_INTERVAL: f32 = 0.2;
/// A contact only counts as a stomp when the player's lowest 10% is no lower
/// than the goomba's top quarter.
const PLAYER_FEET_RATIO: f32 = 0.9;
const GOOMBA_HEAD_RATIO: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoombaContact {
    Stomped,
    HurtPlayer,
}

#[derive(Debug, Clone)]
pub struct Goomba {
    pub id: EntityId,
    pub body: Body,
    pub direction: f32,
    alive: bool,
    walk: Animation,
}

impl Goomba {
    pub fn new(id: EntityId, position: Vec2) -> Self {
        Self {
            id,
            body: Body::new(position, Vec2::new(GOOMBA_SIZE, GOOMBA_SIZE)),
            direction: 1.0,
            alive: true,
            walk: Animation::looping(WALK_FRAMES, WALK_INTERVAL),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn die(&mut self) {
        self.alive = false;
    }

    pub fn update<W: TileQuery + ?Sized>(&mut self, world: &W, dt: f32) {
        if !self.alive {
            return;
        }
        step_patrol(world, &mut self.body, &mut self.direction, true, dt);
        self.walk.update(dt);
    }

    /// Classifies an overlap with the player. Dead goombas never hurt.
    pub fn contact_with(&self, player: &Body) -> Option<GoombaContact> {
        if !self.alive || !self.body.overlaps(player) {
            return None;
        }
        let player_feet = player.top() + player.size.y * PLAYER_FEET_RATIO;
        let goomba_head = self.body.top() + self.body.size.y * GOOMBA_HEAD_RATIO;
        if player_feet <= goomba_head {
            Some(GoombaContact::Stomped)
        } else {
            Some(GoombaContact::HurtPlayer)
        }
    }

    pub fn draw(&self, frame: &mut DrawList) {
        frame.sprite(SpriteDraw {
            rect: self.body.rect(),
            sprite: "goomba",
            frame: self.walk.frame(),
            flip_x: self.direction > 0.0,
            opacity: 1.0,
            tint: [172, 80, 36, 255],
        });
    }
}
