use sdl2::{event::Event, video::Window};

/// Width of the resolution the HUD artwork is drawn for.
pub const REFERENCE_W: f32 = 1920.0;
/// Height of the resolution the HUD artwork is drawn for.
pub const REFERENCE_H: f32 = 1080.0;

/// Computes the global HUD scale for a drawable area.
///
/// The scale is the smaller of the width and height ratios to the 1920×1080
/// reference, floored to one decimal and never below 0.1.
///
/// # Arguments
/// * `drawable_w` - Drawable width in pixels.
/// * `drawable_h` - Drawable height in pixels.
///
/// # Returns
/// * The scale factor applied to world and HUD drawing.
pub fn hud_scale(drawable_w: u32, drawable_h: u32) -> f32 {
    let ratio = (drawable_w as f32 / REFERENCE_W).min(drawable_h as f32 / REFERENCE_H);
    ((ratio * 10.0).floor() / 10.0).max(0.1)
}

/// Returns the ratio of drawable size to window size on each axis.
///
/// On Retina / HiDPI displays this is typically `(2.0, 2.0)`; on standard
/// displays it is `(1.0, 1.0)`.
///
/// # Arguments
/// * `window` - The SDL2 window to query.
///
/// # Returns
/// * `(scale_x, scale_y)`.
pub fn hidpi_scale(window: &Window) -> (f32, f32) {
    let (window_w, window_h) = window.size();
    let (drawable_w, drawable_h) = window.drawable_size();
    let scale_x = if window_w > 0 {
        drawable_w as f32 / window_w as f32
    } else {
        1.0
    };
    let scale_y = if window_h > 0 {
        drawable_h as f32 / window_h as f32
    } else {
        1.0
    };
    (scale_x, scale_y)
}

/// Scales an integer coordinate by a floating-point factor, rounding to the
/// nearest integer.
fn scale_coord(value: i32, scale: f32) -> i32 {
    ((value as f32) * scale).round() as i32
}

/// Re-maps mouse event coordinates from window space to drawable pixels.
///
/// Both egui and the HUD work in drawable pixels, so every mouse event is
/// passed through here once before it is dispatched.
///
/// # Arguments
/// * `event` - The original SDL2 event.
/// * `scale` - Result of [`hidpi_scale`] for the window.
///
/// # Returns
/// * The event with scaled coordinates; other events are returned as-is.
pub fn adjust_mouse_event_for_hidpi(event: Event, scale: (f32, f32)) -> Event {
    let (scale_x, scale_y) = scale;
    match event {
        Event::MouseMotion {
            timestamp,
            window_id,
            which,
            mousestate,
            x,
            y,
            xrel,
            yrel,
        } => Event::MouseMotion {
            timestamp,
            window_id,
            which,
            mousestate,
            x: scale_coord(x, scale_x),
            y: scale_coord(y, scale_y),
            xrel: scale_coord(xrel, scale_x),
            yrel: scale_coord(yrel, scale_y),
        },
        Event::MouseButtonDown {
            timestamp,
            window_id,
            which,
            mouse_btn,
            clicks,
            x,
            y,
        } => Event::MouseButtonDown {
            timestamp,
            window_id,
            which,
            mouse_btn,
            clicks,
            x: scale_coord(x, scale_x),
            y: scale_coord(y, scale_y),
        },
        Event::MouseButtonUp {
            timestamp,
            window_id,
            which,
            mouse_btn,
            clicks,
            x,
            y,
        } => Event::MouseButtonUp {
            timestamp,
            window_id,
            which,
            mouse_btn,
            clicks,
            x: scale_coord(x, scale_x),
            y: scale_coord(y, scale_y),
        },
        other => other,
    }
}
