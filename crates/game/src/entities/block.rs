use engine::{Body, DrawList, EntityId, SpriteDraw, Vec2};

const UNHIT_FRAME: usize = 0;
const HIT_FRAME: usize = 1;

/// Breakable "?" block. Its tile stays solid; the entity only carries the
/// one-shot hit flag and the bump offset.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: EntityId,
    pub body: Body,
    tile: (i32, i32),
    home: Vec2,
    hit: bool,
    frame: usize,
}

impl Block {
    pub fn new(id: EntityId, col: i32, row: i32, tile_size: f32) -> Self {
        let home = Vec2::new(col as f32 * tile_size, row as f32 * tile_size);
        Self {
            id,
            body: Body::new(home, Vec2::new(tile_size, tile_size)),
            tile: (col, row),
            home,
            hit: false,
            frame: UNHIT_FRAME,
        }
    }

    pub fn tile(&self) -> (i32, i32) {
        self.tile
    }

    /// Resting position, unaffected by the bump tween.
    pub fn home(&self) -> Vec2 {
        self.home
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// True exactly once per block.
    pub fn hit(&mut self) -> bool {
        !std::mem::replace(&mut self.hit, true)
    }

    pub fn show_hit_frame(&mut self) {
        self.frame = HIT_FRAME;
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn draw(&self, frame: &mut DrawList) {
        let tint = if self.frame == HIT_FRAME {
            [136, 88, 24, 255]
        } else {
            [252, 160, 68, 255]
        };
        frame.sprite(SpriteDraw {
            rect: self.body.rect(),
            sprite: "block",
            frame: self.frame,
            flip_x: false,
            opacity: 1.0,
            tint,
        });
    }
}
