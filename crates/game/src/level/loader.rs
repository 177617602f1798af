use std::fs;
use std::path::{Path, PathBuf};

use engine::{TileGrid, TilemapError};
use serde::Deserialize;
use thiserror::Error;

use super::tile::{category_for, tile_from_gid, TILE_SIZE};

/// Subset of a Tiled JSON export the game reads. Layer 0 is the foreground.
#[derive(Debug, Deserialize)]
struct TiledMap {
    width: u32,
    height: u32,
    #[serde(rename = "tilewidth")]
    tile_width: u32,
    layers: Vec<TiledLayer>,
}

#[derive(Debug, Deserialize)]
struct TiledLayer {
    #[serde(default)]
    name: String,
    data: Vec<u32>,
}

#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("read level '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse level json{}: {message}", at_path(.at))]
    Parse { at: String, message: String },
    #[error("level has no tile layers")]
    NoLayers,
    #[error("level tile width {found} is not {expected}")]
    TileWidth { found: u32, expected: u32 },
    #[error("level layer '{layer}' is malformed: {source}")]
    Shape {
        layer: String,
        #[source]
        source: TilemapError,
    },
}

fn at_path(at: &str) -> String {
    if at.is_empty() || at == "." {
        String::new()
    } else {
        format!(" at {at}")
    }
}

pub fn load_level_grid(path: &Path) -> Result<TileGrid, LevelLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level_grid(&raw)
}

pub fn parse_level_grid(raw: &str) -> Result<TileGrid, LevelLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let map: TiledMap = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let at = error.path().to_string();
        LevelLoadError::Parse {
            at,
            message: error.into_inner().to_string(),
        }
    })?;

    if map.tile_width != TILE_SIZE {
        return Err(LevelLoadError::TileWidth {
            found: map.tile_width,
            expected: TILE_SIZE,
        });
    }
    let foreground = map
        .layers
        .into_iter()
        .next()
        .ok_or(LevelLoadError::NoLayers)?;
    let cells = foreground.data.iter().copied().map(tile_from_gid).collect();
    TileGrid::new(map.width, map.height, TILE_SIZE, cells, category_for).map_err(|source| {
        LevelLoadError::Shape {
            layer: foreground.name,
            source,
        }
    })
}
