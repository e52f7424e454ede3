//! Render context and the drawing primitives every HUD component shares.

use sdl2::pixels::Color;
use sdl2::rect::{Point, Rect};
use sdl2::render::{BlendMode, Canvas, Texture};
use sdl2::video::Window;

use crate::dpi_scaling::hud_scale;

pub const PANEL_BG: Color = Color::RGBA(28, 24, 20, 230);
pub const PANEL_BORDER: Color = Color::RGB(150, 120, 70);
pub const SLOT_BG: Color = Color::RGBA(50, 44, 36, 255);
pub const SLOT_EQUIPPED: Color = Color::RGBA(60, 90, 50, 255);
pub const SLOT_SELECTED: Color = Color::RGBA(110, 90, 40, 255);
pub const SLOT_BORDER: Color = Color::RGB(90, 76, 56);
pub const HEALTH_COLOR: Color = Color::RGB(170, 30, 30);
pub const MANA_COLOR: Color = Color::RGB(40, 70, 180);
pub const CAST_COLOR: Color = Color::RGB(200, 160, 40);
pub const DIM_OVERLAY: Color = Color::RGBA(0, 0, 0, 150);

/// Per-frame drawing parameters: drawable size and the global HUD scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub debug: bool,
}

impl RenderContext {
    pub fn new(width: u32, height: u32, debug: bool) -> Self {
        Self {
            width,
            height,
            scale: hud_scale(width, height),
            debug,
        }
    }

    /// Scales a length given in reference pixels.
    pub fn s(&self, v: i32) -> i32 {
        (v as f32 * self.scale).round() as i32
    }

    /// Scales a size given in reference pixels; never zero.
    pub fn su(&self, v: u32) -> u32 {
        ((v as f32 * self.scale).round() as u32).max(1)
    }

    pub fn screen(&self) -> Rect {
        Rect::new(0, 0, self.width.max(1), self.height.max(1))
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as i32 / 2, self.height as i32 / 2)
    }

    /// Rectangle of reference size `w`×`h` centered on screen.
    pub fn centered(&self, w: u32, h: u32) -> Rect {
        Rect::from_center(self.center(), self.su(w), self.su(h))
    }
}

/// Width in pixels of the filled part of a bar.
pub fn bar_fill(width: u32, value: i64, max: i64) -> u32 {
    if max <= 0 || value <= 0 {
        return 0;
    }
    let ratio = (value.min(max) as f64) / max as f64;
    (width as f64 * ratio).round() as u32
}

pub fn fill_rect(canvas: &mut Canvas<Window>, rect: Rect, color: Color) -> Result<(), String> {
    canvas.set_blend_mode(BlendMode::Blend);
    canvas.set_draw_color(color);
    canvas.fill_rect(rect)
}

/// Panel background with a one pixel border.
pub fn draw_frame(
    canvas: &mut Canvas<Window>,
    rect: Rect,
    fill: Color,
    border: Color,
) -> Result<(), String> {
    fill_rect(canvas, rect, fill)?;
    canvas.set_draw_color(border);
    canvas.draw_rect(rect)
}

/// Horizontal progress bar.
pub fn draw_bar(
    canvas: &mut Canvas<Window>,
    rect: Rect,
    value: i64,
    max: i64,
    color: Color,
) -> Result<(), String> {
    draw_frame(canvas, rect, SLOT_BG, SLOT_BORDER)?;
    let filled = bar_fill(rect.width(), value, max);
    if filled > 0 {
        fill_rect(canvas, Rect::new(rect.x(), rect.y(), filled, rect.height()), color)?;
    }
    Ok(())
}

/// Copies `texture` (or part of it) into `dst`. Missing textures draw a
/// plain slot box.
pub fn draw_texture(
    canvas: &mut Canvas<Window>,
    texture: Option<&Texture>,
    src: Option<Rect>,
    dst: Rect,
) -> Result<(), String> {
    match texture {
        Some(texture) => canvas.copy(texture, src, dst),
        None => fill_rect(canvas, dst, SLOT_BG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fill_is_clamped() {
        assert_eq!(bar_fill(100, 50, 100), 50);
        assert_eq!(bar_fill(100, 150, 100), 100);
        assert_eq!(bar_fill(100, -5, 100), 0);
        assert_eq!(bar_fill(100, 5, 0), 0);
    }

    #[test]
    fn context_scales_reference_lengths() {
        let ctx = RenderContext::new(1280, 720, false);
        assert_eq!(ctx.scale, 0.6);
        assert_eq!(ctx.s(100), 60);
        assert_eq!(ctx.su(1), 1);
        assert_eq!(ctx.centered(100, 100), Rect::new(610, 330, 60, 60));
    }
}
