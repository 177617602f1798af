use tracing::trace;

use crate::app::{Rect, Vec2};
use crate::tiles::{tile_index, TileQuery};

/// A rising entity bumps a block only when its top edge is this close to the
/// block's bottom face.
pub const BLOCK_HIT_THRESHOLD_PX: f32 = 5.0;

/// Axis-aligned physics body anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            velocity: Vec2::default(),
            grounded: false,
        }
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        self.rect().overlaps(&other.rect())
    }

    pub fn round_position(&mut self) {
        self.position.x = self.position.x.round();
        self.position.y = self.position.y.round();
    }
}

/// Tile grid plus the breakable blocks placed on it.
pub trait CollisionWorld: TileQuery {
    type BlockRef: Copy;

    fn block_at(&self, pixel_x: f32, pixel_y: f32) -> Option<Self::BlockRef>;
    fn is_block_hit(&self, block: Self::BlockRef) -> bool;
    /// Returns false when the block was already hit.
    fn hit_block(&mut self, block: Self::BlockRef) -> bool;
}

pub struct CollisionDetector;

impl CollisionDetector {
    /// Call after advancing `body.position.x` by this frame's displacement.
    pub fn resolve_horizontal<W: TileQuery + ?Sized>(world: &W, body: &mut Body) {
        let vx = body.velocity.x;
        if vx == 0.0 {
            return;
        }
        let ts = world.tile_size();
        let top_row = tile_index(body.top(), ts);
        let bottom_row = tile_index(body.bottom() - 1.0, ts);

        if vx > 0.0 {
            let col = tile_index(body.right(), ts);
            if (top_row..=bottom_row).any(|row| world.is_solid_tile_at(col, row)) {
                body.position.x = (col * ts) as f32 - body.size.x;
                body.velocity.x = 0.0;
            }
        } else {
            let col = tile_index(body.left(), ts);
            if (top_row..=bottom_row).any(|row| world.is_solid_tile_at(col, row)) {
                body.position.x = ((col + 1) * ts) as f32;
                body.velocity.x = 0.0;
            }
        }
    }

    /// Call after advancing `body.position.y`. Recomputes `grounded` from scratch.
    pub fn resolve_vertical<W: CollisionWorld + ?Sized>(world: &mut W, body: &mut Body) {
        body.grounded = false;

        let ts = world.tile_size();
        let left_col = tile_index(body.left(), ts);
        let right_col = tile_index(body.right() - 1.0, ts);

        if body.velocity.y >= 0.0 {
            let bottom_row = tile_index(body.bottom(), ts);
            let lands = (left_col..=right_col).any(|col| {
                world.is_solid_tile_at(col, bottom_row) || world.is_platform_tile_at(col, bottom_row)
            });
            if lands {
                body.position.y = (bottom_row * ts) as f32 - body.size.y;
                body.velocity.y = 0.0;
                body.grounded = true;
            }
        } else {
            let top_row = tile_index(body.top(), ts);
            // Every overlapped column gets its bump before any solid tile stops the body.
            for col in left_col..=right_col {
                bump_block_above(world, body, col, top_row);
            }
            let blocked = (left_col..=right_col).any(|col| world.is_solid_tile_at(col, top_row));
            if blocked {
                body.position.y = ((top_row + 1) * ts) as f32;
                body.velocity.y = 0.0;
            }
        }
    }
}

fn bump_block_above<W: CollisionWorld + ?Sized>(
    world: &mut W,
    body: &Body,
    col: i32,
    row: i32,
) -> bool {
    let ts = world.tile_size();
    let Some(block) = world.block_at((col * ts) as f32, (row * ts) as f32) else {
        return false;
    };
    if world.is_block_hit(block) {
        return false;
    }
    let block_bottom = ((row + 1) * ts) as f32;
    if (body.top() - block_bottom).abs() >= BLOCK_HIT_THRESHOLD_PX {
        return false;
    }
    trace!(col, row, "block_bumped_from_below");
    world.hit_block(block)
}
