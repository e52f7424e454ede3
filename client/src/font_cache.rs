use sdl2::gfx::primitives::DrawRenderer;
use sdl2::pixels::Color;
use sdl2::render::Canvas;
use sdl2::video::Window;

/// Width in pixels of one glyph of the SDL2_gfx built-in font.
pub const GLYPH_W: u32 = 8;

/// Height in pixels of one glyph of the SDL2_gfx built-in font.
pub const GLYPH_H: u32 = 8;

/// Vertical distance between two lines of text.
pub const LINE_H: u32 = GLYPH_H + 4;

pub const TEXT_COLOR: Color = Color::RGB(230, 220, 190);
pub const TEXT_DIM: Color = Color::RGB(140, 135, 120);
pub const TEXT_WARN: Color = Color::RGB(230, 90, 70);

/// Draws a text string onto `canvas` using the built-in bitmap font.
///
/// Characters outside the printable ASCII range are replaced with `?`,
/// which is all the built-in font can show.
pub fn draw_text(
    canvas: &mut Canvas<Window>,
    text: &str,
    x: i32,
    y: i32,
    color: Color,
) -> Result<(), String> {
    let printable: String = text
        .chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { '?' })
        .collect();
    canvas.string(x as i16, y as i16, &printable, color)
}

/// Draws `text` centered horizontally around `center_x`.
pub fn draw_text_centered(
    canvas: &mut Canvas<Window>,
    text: &str,
    center_x: i32,
    y: i32,
    color: Color,
) -> Result<(), String> {
    let width = text_width(text) as i32;
    draw_text(canvas, text, center_x - width / 2, y, color)
}

/// Draws wrapped lines starting at `(x, y)`, skipping the first `skip`
/// lines and stopping after `max_lines`.
pub fn draw_lines(
    canvas: &mut Canvas<Window>,
    lines: &[String],
    x: i32,
    y: i32,
    skip: usize,
    max_lines: usize,
    color: Color,
) -> Result<(), String> {
    for (row, line) in lines.iter().skip(skip).take(max_lines).enumerate() {
        draw_text(canvas, line, x, y + (row as u32 * LINE_H) as i32, color)?;
    }
    Ok(())
}

/// Returns the pixel width of the given text string.
#[inline]
pub fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_W
}

/// Number of glyphs fitting into `width` pixels.
#[inline]
pub fn chars_fitting(width: u32) -> usize {
    (width / GLYPH_W).max(1) as usize
}

/// Breaks `text` into lines of at most `max_chars` characters, preferring
/// word boundaries. Explicit newlines are kept.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                lines.push(head);
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}
