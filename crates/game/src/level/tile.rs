use engine::TileCategory;

pub const TILE_SIZE: u32 = 16;

pub const PLATFORM_LEFT: u16 = 3;
pub const PLATFORM_RIGHT: u16 = 4;
pub const COIN: u16 = 5;
/// Item sprite. As a map cell it is plain scenery.
pub const STAR: u16 = 14;
pub const BLANK: u16 = 19;
pub const BLOCK: u16 = 21;
pub const GOOMBA: u16 = 23;
/// Item sprite. As a map cell it is plain scenery.
pub const MUSHROOM: u16 = 25;

pub fn category_for(tile: u16) -> TileCategory {
    match tile {
        PLATFORM_LEFT | PLATFORM_RIGHT => TileCategory::OneWayPlatform,
        _ => TileCategory::Solid,
    }
}

/// Tiled stores 1-based global ids with 0 meaning "no tile".
pub fn tile_from_gid(gid: u32) -> Option<u16> {
    gid.checked_sub(1).and_then(|id| u16::try_from(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platforms_are_one_way() {
        assert_eq!(category_for(PLATFORM_LEFT), TileCategory::OneWayPlatform);
        assert_eq!(category_for(PLATFORM_RIGHT), TileCategory::OneWayPlatform);
    }

    #[test]
    fn blank_left_by_blocks_stays_solid() {
        assert_eq!(category_for(BLANK), TileCategory::Solid);
        assert_eq!(category_for(0), TileCategory::Solid);
    }

    #[test]
    fn item_sprites_are_plain_solid_tiles() {
        assert_eq!(tile_from_gid(15), Some(STAR));
        assert_eq!(tile_from_gid(26), Some(MUSHROOM));
        assert_eq!(category_for(STAR), TileCategory::Solid);
        assert_eq!(category_for(MUSHROOM), TileCategory::Solid);
    }

    #[test]
    fn gid_zero_is_empty() {
        assert_eq!(tile_from_gid(0), None);
        assert_eq!(tile_from_gid(1), Some(0));
        assert_eq!(tile_from_gid(22), Some(BLOCK));
        assert_eq!(tile_from_gid(u32::MAX), None);
    }
}
