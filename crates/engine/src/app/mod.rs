mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    world_to_screen_px, DrawCommand, DrawList, Renderer, SpriteDraw, Viewport,
};
pub use scene::{
    Camera2D, EntityId, EntityIdAllocator, InputSnapshot, Rect, Scene, SceneCommand, Vec2,
};
