use sdl2::rect::{Point, Rect};

use crate::area::Hovered;
use crate::font_cache::{self, TEXT_COLOR};
use crate::render::{self, PANEL_BG, PANEL_BORDER, RenderContext};

use super::panel::DrawCtx;

/// Text of the floating box; debug mode adds `id#serial`.
pub fn info_text(hovered: &Hovered, debug: bool) -> String {
    if debug {
        format!("{} ({})", hovered.name, hovered.id)
    } else {
        hovered.name.clone()
    }
}

/// Box next to the cursor, kept on screen.
pub fn info_rect(rc: &RenderContext, mouse: Point, text: &str) -> Rect {
    let w = font_cache::text_width(text) + 12;
    let h = font_cache::LINE_H + 8;
    let x = (mouse.x() + 16).min(rc.width as i32 - w as i32).max(0);
    let y = (mouse.y() + 16).min(rc.height as i32 - h as i32).max(0);
    Rect::new(x, y, w, h)
}

pub fn draw(ctx: &mut DrawCtx<'_>, hovered: &Hovered) -> Result<(), String> {
    let text = info_text(hovered, ctx.rc.debug);
    let rect = info_rect(ctx.rc, ctx.mouse, &text);
    render::draw_frame(ctx.canvas, rect, PANEL_BG, PANEL_BORDER)?;
    font_cache::draw_text(ctx.canvas, &text, rect.x() + 6, rect.y() + 5, TEXT_COLOR)
}
