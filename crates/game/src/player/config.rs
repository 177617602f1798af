use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Movement tuning. Speeds are px/s, accelerations px/s², and
/// `acceleration`/`deceleration` are applied once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_power: f32,
    pub max_jump_time: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub max_speed: f32,
    pub skid_threshold: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            max_fall_speed: 400.0,
            jump_power: -350.0,
            max_jump_time: 0.3,
            acceleration: 10.0,
            deceleration: 10.0,
            max_speed: 100.0,
            skid_threshold: 50.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("read tuning '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse tuning json at {at}: {message}")]
    Parse { at: String, message: String },
    #[error("tuning field {field} must be {requirement}, got {value}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },
}

impl PlayerConfig {
    pub fn parse(raw: &str) -> Result<Self, TuningError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                TuningError::Parse {
                    at: error.path().to_string(),
                    message: error.into_inner().to_string(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("gravity", self.gravity),
            ("max_fall_speed", self.max_fall_speed),
            ("max_jump_time", self.max_jump_time),
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::Invalid {
                    field,
                    requirement: "positive",
                    value,
                });
            }
        }
        if self.skid_threshold.is_nan() || self.skid_threshold < 0.0 {
            return Err(TuningError::Invalid {
                field: "skid_threshold",
                requirement: "non-negative",
                value: self.skid_threshold,
            });
        }
        if self.jump_power.is_nan() || self.jump_power >= 0.0 {
            return Err(TuningError::Invalid {
                field: "jump_power",
                requirement: "negative (upward)",
                value: self.jump_power,
            });
        }
        Ok(())
    }
}

/// A missing file means "use defaults"; anything else that goes wrong is an error.
pub fn load_tuning(path: &Path) -> Result<Option<PlayerConfig>, TuningError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(TuningError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    PlayerConfig::parse(&raw).map(Some)
}
