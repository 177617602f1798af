use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::{world_to_screen_px, DrawCommand, DrawList, SpriteDraw, Viewport};
use crate::app::Rect;

/// Draws a `DrawList` as flat placeholder rectangles into a fixed-size logical
/// framebuffer that pixels scales up to the window.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    logical: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, logical: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), logical, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            logical,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), self.logical, width, height)?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        logical: Viewport,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(logical.width, logical.height, surface)
    }

    pub fn render(&mut self, list: &DrawList) -> Result<(), Error> {
        let viewport = self.logical;
        let frame = self.pixels.frame_mut();
        let clear = list.clear_color();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&clear);
        }

        let camera = list.camera();
        for command in list.commands() {
            match command {
                DrawCommand::Sprite(sprite) => {
                    let screen = screen_rect(&camera, &sprite.rect);
                    fill_rect_blended(frame, viewport, screen, sprite_color(sprite));
                }
                DrawCommand::Outline { rect, color } => {
                    let screen = screen_rect(&camera, rect);
                    draw_rect_outline(frame, viewport, screen, *color);
                }
            }
        }

        self.pixels.render()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

fn screen_rect(camera: &crate::app::Camera2D, rect: &Rect) -> ScreenRect {
    let (x, y) = world_to_screen_px(camera, rect.position);
    ScreenRect {
        x,
        y,
        w: rect.size.x.round() as i32,
        h: rect.size.y.round() as i32,
    }
}

/// Odd animation frames are drawn slightly darker so frame changes stay visible
/// without sprite sheets.
fn sprite_color(sprite: &SpriteDraw) -> [u8; 4] {
    let [r, g, b, _] = sprite.tint;
    let shade = |c: u8| if sprite.frame % 2 == 1 { c / 4 * 3 } else { c };
    let alpha = (sprite.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    [shade(r), shade(g), shade(b), alpha]
}

fn fill_rect_blended(frame: &mut [u8], viewport: Viewport, rect: ScreenRect, color: [u8; 4]) {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (rect.x + rect.w).min(viewport.width as i32);
    let y1 = (rect.y + rect.h).min(viewport.height as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(frame: &mut [u8], viewport: Viewport, rect: ScreenRect, color: [u8; 4]) {
    if rect.w <= 0 || rect.h <= 0 {
        return;
    }
    let width = viewport.width as usize;
    let right = rect.x + rect.w - 1;
    let bottom = rect.y + rect.h - 1;
    for x in rect.x..=right {
        write_pixel_rgba_clipped(frame, width, viewport, x, rect.y, color);
        write_pixel_rgba_clipped(frame, width, viewport, x, bottom, color);
    }
    for y in rect.y..=bottom {
        write_pixel_rgba_clipped(frame, width, viewport, rect.x, y, color);
        write_pixel_rgba_clipped(frame, width, viewport, right, y, color);
    }
}

fn pixel_range(width: usize, x: i32, y: i32) -> Option<std::ops::Range<usize>> {
    if x < 0 || y < 0 {
        return None;
    }
    let pixel_offset = (y as usize).checked_mul(width)?.checked_add(x as usize)?;
    let start = pixel_offset.checked_mul(4)?;
    Some(start..start.checked_add(4)?)
}

fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    viewport: Viewport,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let Some(range) = pixel_range(width, x, y) else {
        return;
    };
    if range.end > frame.len() {
        return;
    }
    frame[range].copy_from_slice(&color);
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    let Some(range) = pixel_range(width, x, y) else {
        return;
    };
    if range.end > frame.len() {
        return;
    }
    let dst = &mut frame[range];
    let alpha = color[3] as u32;
    for channel in 0..3 {
        let src = color[channel] as u32;
        let old = dst[channel] as u32;
        dst[channel] = ((src * alpha + old * (255 - alpha)) / 255) as u8;
    }
    dst[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 4,
        height: 4,
    };

    fn blank() -> Vec<u8> {
        vec![0; 4 * 4 * 4]
    }

    fn pixel(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
        let start = (y * 4 + x) * 4;
        [
            frame[start],
            frame[start + 1],
            frame[start + 2],
            frame[start + 3],
        ]
    }

    #[test]
    fn fill_clips_to_viewport() {
        let mut frame = blank();
        let rect = ScreenRect {
            x: -2,
            y: 2,
            w: 4,
            h: 10,
        };
        fill_rect_blended(&mut frame, VIEW, rect, [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 0, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 1, 3), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 2, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn half_alpha_blends_with_background() {
        let mut frame = blank();
        blend_pixel_clipped(&mut frame, 4, 1, 1, [200, 100, 0, 128]);
        let blended = pixel(&frame, 1, 1);
        assert_eq!(blended[0], (200 * 128 / 255) as u8);
        assert_eq!(blended[3], 255);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = blank();
        let rect = ScreenRect {
            x: 0,
            y: 0,
            w: 4,
            h: 4,
        };
        draw_rect_outline(&mut frame, VIEW, rect, [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 0, 0), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 3, 3), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn odd_frames_are_shaded() {
        let mut sprite = SpriteDraw {
            rect: Rect::default(),
            sprite: "coin",
            frame: 0,
            flip_x: false,
            opacity: 1.0,
            tint: [200, 200, 200, 255],
        };
        assert_eq!(sprite_color(&sprite), [200, 200, 200, 255]);
        sprite.frame = 1;
        assert_eq!(sprite_color(&sprite), [150, 150, 150, 255]);
    }
}
