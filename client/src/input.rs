//! Per-frame snapshot of mouse and keyboard input.
//!
//! Events are folded into an [`InputState`] before any update runs. HUD
//! components then consume clicks and key presses from the top of the draw
//! order down, so a click handled by a panel never reaches the camera.

use std::collections::HashSet;

use sdl2::event::Event;
use sdl2::keyboard::{Keycode, Mod};
use sdl2::mouse::MouseButton;
use sdl2::rect::{Point, Rect};

#[derive(Debug, Default)]
pub struct InputState {
    mouse: (i32, i32),
    left_click: bool,
    right_click: bool,
    left_down: bool,
    shift: bool,
    wheel: i32,
    pressed: Vec<Keycode>,
    held: HashSet<Keycode>,
    text: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything that only lasts one frame.
    pub fn begin_frame(&mut self) {
        self.left_click = false;
        self.right_click = false;
        self.wheel = 0;
        self.pressed.clear();
        self.text.clear();
    }

    /// Folds one event into the snapshot. Mouse coordinates are expected in
    /// drawable pixels.
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::MouseMotion { x, y, .. } => self.mouse = (*x, *y),
            Event::MouseButtonDown {
                mouse_btn, x, y, ..
            } => {
                self.mouse = (*x, *y);
                match mouse_btn {
                    MouseButton::Left => {
                        self.left_click = true;
                        self.left_down = true;
                    }
                    MouseButton::Right => self.right_click = true,
                    _ => {}
                }
            }
            Event::MouseButtonUp {
                mouse_btn: MouseButton::Left,
                x,
                y,
                ..
            } => {
                self.mouse = (*x, *y);
                self.left_down = false;
            }
            Event::MouseWheel { y, .. } => self.wheel += *y,
            Event::KeyDown {
                keycode: Some(key),
                keymod,
                ..
            } => self.press_key(*key, keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD)),
            Event::KeyUp {
                keycode: Some(key),
                keymod,
                ..
            } => {
                self.shift = keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD);
                self.held.remove(key);
            }
            Event::TextInput { text, .. } => self.text.push_str(text),
            _ => {}
        }
    }

    pub(crate) fn press_key(&mut self, key: Keycode, shift: bool) {
        self.shift = shift;
        self.held.insert(key);
        self.pressed.push(key);
    }

    #[cfg(test)]
    pub(crate) fn click_at(&mut self, x: i32, y: i32, right: bool) {
        self.mouse = (x, y);
        if right {
            self.right_click = true;
        } else {
            self.left_click = true;
        }
    }

    #[cfg(test)]
    pub(crate) fn type_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn mouse(&self) -> Point {
        Point::new(self.mouse.0, self.mouse.1)
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    pub fn left_down(&self) -> bool {
        self.left_down
    }

    pub fn left_clicked(&self) -> bool {
        self.left_click
    }

    pub fn right_clicked(&self) -> bool {
        self.right_click
    }

    pub fn wheel(&self) -> i32 {
        self.wheel
    }

    /// Takes the left click if it landed inside `rect`.
    pub fn take_left_click(&mut self, rect: Rect) -> bool {
        if self.left_click && rect.contains_point(self.mouse()) {
            self.left_click = false;
            true
        } else {
            false
        }
    }

    /// Takes the right click if it landed inside `rect`.
    pub fn take_right_click(&mut self, rect: Rect) -> bool {
        if self.right_click && rect.contains_point(self.mouse()) {
            self.right_click = false;
            true
        } else {
            false
        }
    }

    /// Swallows both clicks when the cursor is over `rect`. Used by panels
    /// so clicks on their background do not fall through to the world.
    pub fn block(&mut self, rect: Rect) {
        if rect.contains_point(self.mouse()) {
            self.left_click = false;
            self.right_click = false;
            self.wheel = 0;
        }
    }

    /// Swallows all pending clicks and key presses.
    pub fn block_all(&mut self) {
        self.left_click = false;
        self.right_click = false;
        self.wheel = 0;
        self.pressed.clear();
        self.text.clear();
    }

    pub fn key_pressed(&self, key: Keycode) -> bool {
        self.pressed.contains(&key)
    }

    /// Takes a key press so later consumers do not see it.
    pub fn take_key(&mut self, key: Keycode) -> bool {
        match self.pressed.iter().position(|k| *k == key) {
            Some(idx) => {
                self.pressed.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn key_held(&self, key: Keycode) -> bool {
        self.held.contains(&key)
    }

    /// Takes typed text.
    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: i32, y: i32, button: MouseButton) -> Event {
        Event::MouseButtonDown {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mouse_btn: button,
            clicks: 1,
            x,
            y,
        }
    }

    #[test]
    fn click_is_taken_once_inside_rect() {
        let mut input = InputState::new();
        input.handle_event(&click(15, 15, MouseButton::Left));
        assert!(!input.take_left_click(Rect::new(100, 100, 10, 10)));
        assert!(input.take_left_click(Rect::new(10, 10, 10, 10)));
        assert!(!input.take_left_click(Rect::new(10, 10, 10, 10)));
        assert!(input.left_down());
    }

    #[test]
    fn frame_reset_keeps_held_state() {
        let mut input = InputState::new();
        input.handle_event(&click(1, 1, MouseButton::Right));
        input.press_key(Keycode::W, false);
        input.begin_frame();
        assert!(!input.right_clicked());
        assert!(!input.key_pressed(Keycode::W));
        assert!(input.key_held(Keycode::W));
    }

    #[test]
    fn blocked_area_swallows_clicks() {
        let mut input = InputState::new();
        input.handle_event(&click(5, 5, MouseButton::Left));
        input.block(Rect::new(0, 0, 10, 10));
        assert!(!input.left_clicked());
    }

    #[test]
    fn taking_a_key_hides_it() {
        let mut input = InputState::new();
        input.press_key(Keycode::B, false);
        assert!(input.take_key(Keycode::B));
        assert!(!input.key_pressed(Keycode::B));
    }
}
