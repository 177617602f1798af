use std::path::{Path, PathBuf};

use tracing::warn;

pub const LEVEL_ENV_VAR: &str = "PLATFORMER_LEVEL";
pub const SEED_ENV_VAR: &str = "PLATFORMER_SEED";
pub const DEBUG_ENV_VAR: &str = "PLATFORMER_DEBUG";

const DEFAULT_LEVEL: &str = "levels/level1.json";
const TUNING_FILE: &str = "tuning.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugOptions {
    /// Outline every physics body.
    pub collision: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub level_path: PathBuf,
    pub tuning_path: PathBuf,
    /// `None` seeds block rewards from entropy.
    pub seed: Option<u64>,
    pub debug: DebugOptions,
}

impl GameConfig {
    pub fn from_env(root: &Path, assets_dir: &Path) -> Self {
        Self::from_values(
            root,
            assets_dir,
            std::env::var(LEVEL_ENV_VAR).ok(),
            std::env::var(SEED_ENV_VAR).ok(),
            std::env::var(DEBUG_ENV_VAR).ok(),
        )
    }

    fn from_values(
        root: &Path,
        assets_dir: &Path,
        level: Option<String>,
        seed: Option<String>,
        debug: Option<String>,
    ) -> Self {
        let level_path = level
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(|raw| root.join(raw))
            .unwrap_or_else(|| assets_dir.join(DEFAULT_LEVEL));

        let seed = seed.and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(error) => {
                warn!(var = SEED_ENV_VAR, value = %raw, error = %error, "invalid_seed_ignored");
                None
            }
        });

        Self {
            level_path,
            tuning_path: assets_dir.join(TUNING_FILE),
            seed,
            debug: debug.as_deref().map(parse_debug_options).unwrap_or_default(),
        }
    }
}

fn parse_debug_options(raw: &str) -> DebugOptions {
    let mut options = DebugOptions::default();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match entry {
            "collision" => options.collision = true,
            other => warn!(var = DEBUG_ENV_VAR, option = other, "unknown_debug_option"),
        }
    }
    options
}
