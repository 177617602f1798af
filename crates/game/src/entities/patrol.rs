use engine::{tile_index, Body, TileQuery};

pub const PATROL_SPEED: f32 = 30.0;
pub const PATROL_GRAVITY: f32 = 800.0;

/// Gravity plus a constant walk, resolved straight against the tile grid.
/// Shared by creatures and pickups; `walking` false keeps the body in place
/// horizontally while still falling.
pub fn step_patrol<W: TileQuery + ?Sized>(
    world: &W,
    body: &mut Body,
    direction: &mut f32,
    walking: bool,
    dt: f32,
) {
    body.velocity.y += PATROL_GRAVITY * dt;
    body.position.y += body.velocity.y * dt;
    body.velocity.x = if walking {
        *direction * PATROL_SPEED
    } else {
        0.0
    };
    body.position.x += body.velocity.x * dt;

    body.grounded = resting_on_solid(world, body);
    if body.grounded {
        let ts = world.tile_size();
        let bottom_row = tile_index(body.bottom(), ts);
        body.position.y = (bottom_row * ts) as f32 - body.size.y;
        body.velocity.y = 0.0;
    }

    if facing_wall(world, body, *direction) {
        *direction = -*direction;
    }
}

fn resting_on_solid<W: TileQuery + ?Sized>(world: &W, body: &Body) -> bool {
    let ts = world.tile_size();
    let bottom_row = tile_index(body.bottom(), ts);
    let left_col = tile_index(body.left(), ts);
    let right_col = tile_index(body.right() - 1.0, ts);
    world.is_solid_tile_at(left_col, bottom_row) || world.is_solid_tile_at(right_col, bottom_row)
}

fn facing_wall<W: TileQuery + ?Sized>(world: &W, body: &Body, direction: f32) -> bool {
    let ts = world.tile_size();
    let top_row = tile_index(body.top(), ts);
    let bottom_row = tile_index(body.bottom() - 1.0, ts);
    let side = if direction > 0.0 {
        body.right()
    } else {
        body.left()
    };
    let side_col = tile_index(side, ts);
    world.is_solid_tile_at(side_col, top_row) || world.is_solid_tile_at(side_col, bottom_row)
}
