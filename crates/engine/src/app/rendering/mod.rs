mod draw_list;
mod renderer;
mod transform;

pub use draw_list::{DrawCommand, DrawList, SpriteDraw};
pub use renderer::Renderer;
pub use transform::{world_to_screen_px, Viewport};
