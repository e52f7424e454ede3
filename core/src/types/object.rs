use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of any engine object. The id names the template the object was
/// created from; the serial distinguishes instances of the same template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct ObjectId {
    pub id: String,
    pub serial: String,
}

impl ObjectId {
    pub fn new(id: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            serial: serial.into(),
        }
    }

    /// Returns the `id + serial` concatenation used as a persistent key by
    /// HUD layouts and save files.
    pub fn key(&self) -> String {
        format!("{}{}", self.id, self.serial)
    }

    pub fn matches(&self, id: &str, serial: &str) -> bool {
        self.id == id && self.serial == serial
    }

    /// Parses the `id#serial` form used by console commands.
    pub fn parse(text: &str) -> Option<Self> {
        let (id, serial) = text.split_once('#')?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id, serial))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.serial)
    }
}

/// World-space position. The y axis points up.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Moves up to `step` units towards `target` and returns the new position.
    pub fn step_towards(&self, target: &Position, step: f64) -> Position {
        let dist = self.distance(target);
        if dist <= step || dist == 0.0 {
            return *target;
        }
        let ratio = step / dist;
        Position::new(
            self.x + (target.x - self.x) * ratio,
            self.y + (target.y - self.y) * ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_concatenates_id_and_serial() {
        let id = ObjectId::new("sword", "0");
        assert_eq!(id.key(), "sword0");
        assert_eq!(id.to_string(), "sword#0");
    }

    #[test]
    fn parse_requires_hash_separator() {
        assert_eq!(ObjectId::parse("wolf#12"), Some(ObjectId::new("wolf", "12")));
        assert_eq!(ObjectId::parse("wolf"), None);
        assert_eq!(ObjectId::parse("#1"), None);
    }

    #[test]
    fn step_towards_stops_at_target() {
        let start = Position::new(0.0, 0.0);
        let target = Position::new(3.0, 4.0);
        assert_eq!(start.step_towards(&target, 10.0), target);
        let half = start.step_towards(&target, 2.5);
        assert!((half.x - 1.5).abs() < 1e-9);
        assert!((half.y - 2.0).abs() < 1e-9);
    }
}
