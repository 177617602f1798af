use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCategory {
    Solid,
    OneWayPlatform,
    Empty,
}

/// Maps a present tile id to its collision category. Must be total.
pub type TileClassifier = fn(u16) -> TileCategory;

/// Read-only view of a tile grid for collision. Columns and rows are signed so
/// callers can probe past the edges; anything outside the grid is `Empty`.
pub trait TileQuery {
    fn tile_size(&self) -> i32;
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn category_at(&self, col: i32, row: i32) -> TileCategory;

    fn is_solid_tile_at(&self, col: i32, row: i32) -> bool {
        self.category_at(col, row) == TileCategory::Solid
    }

    fn is_platform_tile_at(&self, col: i32, row: i32) -> bool {
        self.category_at(col, row) == TileCategory::OneWayPlatform
    }

    fn pixel_width(&self) -> f32 {
        (self.width() * self.tile_size()) as f32
    }

    fn pixel_height(&self) -> f32 {
        (self.height() * self.tile_size()) as f32
    }
}

/// Pixel coordinate to tile index along one axis.
pub fn tile_index(pixel: f32, tile_size: i32) -> i32 {
    (pixel / tile_size as f32).floor() as i32
}

/// Row-major grid of optional tile ids, top-left origin, y growing downward.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
    cells: Vec<Option<u16>>,
    classifier: TileClassifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be positive")]
    ZeroTileSize,
}

impl TileGrid {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: u32,
        cells: Vec<Option<u16>>,
        classifier: TileClassifier,
    ) -> Result<Self, TilemapError> {
        if tile_size == 0 {
            return Err(TilemapError::ZeroTileSize);
        }
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            cells,
            classifier,
        })
    }

    pub fn index_of(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as u32 >= self.width || row as u32 >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn tile_at(&self, col: i32, row: i32) -> Option<u16> {
        self.index_of(col, row)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Returns false when the cell is outside the grid.
    pub fn set_tile(&mut self, col: i32, row: i32, tile: Option<u16>) -> bool {
        match self.index_of(col, row) {
            Some(index) => {
                self.cells[index] = tile;
                true
            }
            None => false,
        }
    }

    /// Visits every occupied cell as `(col, row, tile_id)`.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32, u16)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            cell.map(|tile| ((index % width) as i32, (index / width) as i32, tile))
        })
    }
}

impl TileQuery for TileGrid {
    fn tile_size(&self) -> i32 {
        self.tile_size as i32
    }

    fn width(&self) -> i32 {
        self.width as i32
    }

    fn height(&self) -> i32 {
        self.height as i32
    }

    fn category_at(&self, col: i32, row: i32) -> TileCategory {
        match self.tile_at(col, row) {
            Some(tile) => (self.classifier)(tile),
            None => TileCategory::Empty,
        }
    }
}
