use engine::{Animation, Body, DrawList, EntityId, SpriteDraw, Vec2};

pub const COIN_SIZE: f32 = 16.0;
const SPIN_FRAMES: usize = 4;
const SPIN_INTERVAL: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinOrigin {
    /// Placed in the level; collected on touch.
    Placed,
    /// Popped out of a block; only animates, then disappears.
    FromBlock,
}

#[derive(Debug, Clone)]
pub struct Coin {
    pub id: EntityId,
    pub body: Body,
    origin: CoinOrigin,
    removed: bool,
    spin: Animation,
}

impl Coin {
    pub fn new(id: EntityId, position: Vec2, origin: CoinOrigin) -> Self {
        Self {
            id,
            body: Body::new(position, Vec2::new(COIN_SIZE, COIN_SIZE)),
            origin,
            removed: false,
            spin: Animation::looping(SPIN_FRAMES, SPIN_INTERVAL),
        }
    }

    pub fn origin(&self) -> CoinOrigin {
        self.origin
    }

    pub fn is_collectible(&self) -> bool {
        self.origin == CoinOrigin::Placed && !self.removed
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Returns false if the coin was already removed.
    pub fn remove(&mut self) -> bool {
        !std::mem::replace(&mut self.removed, true)
    }

    pub fn update(&mut self, dt: f32) {
        self.spin.update(dt);
    }

    pub fn draw(&self, frame: &mut DrawList) {
        if self.removed {
            return;
        }
        frame.sprite(SpriteDraw {
            rect: self.body.rect(),
            sprite: "coin",
            frame: self.spin.frame(),
            flip_x: false,
            opacity: 1.0,
            tint: [252, 216, 68, 255],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_coins_are_never_collectible() {
        let coin = Coin::new(EntityId(0), Vec2::default(), CoinOrigin::FromBlock);
        assert!(!coin.is_collectible());
    }

    #[test]
    fn removing_twice_is_a_noop() {
        let mut coin = Coin::new(EntityId(0), Vec2::default(), CoinOrigin::Placed);
        assert!(coin.is_collectible());
        assert!(coin.remove());
        assert!(!coin.remove());
        assert!(!coin.is_collectible());
    }
}
