//! World ↔ screen projection.
//!
//! World coordinates grow right and up; screen coordinates grow right and
//! down. The camera position is the world point shown at the bottom-left
//! corner of the screen.

use mural_core::types::Position;
use sdl2::rect::{Point, Rect};

use crate::area::sprite::{FRAME_H, FRAME_W};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub camera: Position,
    pub scale: f32,
    pub screen_h: u32,
}

impl Projection {
    pub fn new(camera: Position, scale: f32, screen_h: u32) -> Self {
        Self {
            camera,
            scale,
            screen_h,
        }
    }

    fn scale(&self) -> f64 {
        self.scale.max(0.01) as f64
    }

    pub fn world_to_screen(&self, p: Position) -> Point {
        let s = self.scale();
        let x = ((p.x - self.camera.x) * s).round() as i32;
        let y = self.screen_h as i32 - ((p.y - self.camera.y) * s).round() as i32;
        Point::new(x, y)
    }

    /// Inverse of [`Projection::world_to_screen`], rounded to whole world
    /// units.
    pub fn screen_to_world(&self, p: Point) -> Position {
        let s = self.scale();
        Position::new(
            (self.camera.x + p.x() as f64 / s).round(),
            (self.camera.y + (self.screen_h as i32 - p.y()) as f64 / s).round(),
        )
    }

    /// Length of `world` units on screen, at least one pixel.
    pub fn length(&self, world: f64) -> u32 {
        ((world * self.scale()).round() as u32).max(1)
    }

    /// Screen rectangle of an avatar whose feet stand at `feet`.
    pub fn sprite_rect(&self, feet: Position) -> Rect {
        let base = self.world_to_screen(feet);
        let w = self.length(FRAME_W as f64);
        let h = self.length(FRAME_H as f64);
        Rect::new(base.x() - w as i32 / 2, base.y() - h as i32, w, h)
    }

    /// Screen rectangle of the world box with bottom-left corner `origin`.
    pub fn world_rect(&self, origin: Position, w: f64, h: f64) -> Rect {
        let top_left = self.world_to_screen(Position::new(origin.x, origin.y + h));
        Rect::new(top_left.x(), top_left.y(), self.length(w), self.length(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_left_of_screen_is_camera_position() {
        let proj = Projection::new(Position::new(100.0, 50.0), 1.0, 720);
        assert_eq!(proj.world_to_screen(Position::new(100.0, 50.0)), Point::new(0, 720));
        assert_eq!(proj.world_to_screen(Position::new(110.0, 60.0)), Point::new(10, 710));
    }

    #[test]
    fn screen_to_world_inverts_and_rounds() {
        let proj = Projection::new(Position::new(-20.0, 10.0), 0.6, 720);
        let world = Position::new(100.0, 100.0);
        let screen = proj.world_to_screen(world);
        assert_eq!(proj.screen_to_world(screen), world);
    }

    #[test]
    fn sprite_stands_on_its_feet() {
        let proj = Projection::new(Position::default(), 1.0, 500);
        let rect = proj.sprite_rect(Position::new(100.0, 100.0));
        assert_eq!(rect, Rect::new(60, 310, 80, 90));
    }

    #[test]
    fn world_rect_flips_y() {
        let proj = Projection::new(Position::default(), 1.0, 100);
        assert_eq!(
            proj.world_rect(Position::new(0.0, 0.0), 32.0, 32.0),
            Rect::new(0, 68, 32, 32)
        );
    }
}
