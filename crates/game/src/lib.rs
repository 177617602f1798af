pub mod config;
pub mod entities;
pub mod level;
pub mod player;
pub mod scene;
pub mod sound;
