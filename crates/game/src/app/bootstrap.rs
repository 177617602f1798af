use std::process::ExitCode;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError, Vec2};
use platformer::config::GameConfig;
use platformer::level::{load_level_grid, LevelLoadError};
use platformer::player::{load_tuning, PlayerConfig, TuningError};
use platformer::scene::{PlayScene, PlaySettings, RewardSeed};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Level(#[from] LevelLoadError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Platformer Startup ===");

    wire().map_err(|err| {
        error!(error = %err, "startup_failed");
        ExitCode::FAILURE
    })
}

fn wire() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths()?;
    let game = GameConfig::from_env(&paths.root, &paths.assets_dir);
    info!(
        root = %paths.root.display(),
        level = %game.level_path.display(),
        seed = ?game.seed,
        collision_debug = game.debug.collision,
        "config_resolved"
    );

    let grid = load_level_grid(&game.level_path)?;
    let player = match load_tuning(&game.tuning_path)? {
        Some(tuning) => {
            info!(path = %game.tuning_path.display(), "tuning_loaded");
            tuning
        }
        None => PlayerConfig::default(),
    };

    let config = LoopConfig::default();
    let settings = PlaySettings {
        player,
        rewards: game.seed.map_or(RewardSeed::Entropy, RewardSeed::Seeded),
        debug: game.debug,
        viewport: Vec2::new(config.logical_width as f32, config.logical_height as f32),
    };

    Ok(AppWiring {
        config,
        scene: Box::new(PlayScene::new(grid, settings)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
