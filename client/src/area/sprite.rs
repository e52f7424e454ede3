//! Multi-directional avatar sprite.
//!
//! A sheet is a 10×4 grid of 80×90 frames. Rows, counted from the bottom of
//! the sheet, hold the directions left, down, right and up. Columns group the
//! animations: 0 idle, 1-2 move, 3-4 melee, 5-6 shoot, 7-8 cast, 9 lie.

use mural_core::types::{ActivationKind, Character, Position};
use sdl2::rect::Rect;

pub const FRAME_W: u32 = 80;
pub const FRAME_H: u32 = 90;
pub const SHEET_ROWS: u32 = 4;
/// Frames per second of every animation.
pub const ANIM_FPS: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Down,
    Right,
    Up,
}

impl Direction {
    fn row_from_bottom(self) -> u32 {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }

    /// Direction of the dominant axis from `from` to `to`; X wins ties.
    pub fn facing(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(if dx.abs() >= dy.abs() {
            if dx > 0.0 { Direction::Right } else { Direction::Left }
        } else if dy > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteState {
    Idle,
    Move,
    Melee,
    Shoot,
    SpellCast,
    CraftCast,
    Kneel,
    Lie,
}

impl SpriteState {
    /// State shown for the character as it is right now.
    pub fn of(c: &Character) -> SpriteState {
        if let Some(cast) = &c.cast {
            if cast.is_skill() {
                return SpriteState::SpellCast;
            }
            if cast.is_recipe() {
                return SpriteState::CraftCast;
            }
        }
        if c.moving() {
            SpriteState::Move
        } else if c.alive() && c.agony() {
            SpriteState::Kneel
        } else if !c.alive() {
            SpriteState::Lie
        } else {
            SpriteState::Idle
        }
    }

    /// First sheet column and frame count.
    fn columns(self) -> (u32, u32) {
        match self {
            SpriteState::Idle | SpriteState::Kneel => (0, 1),
            SpriteState::Move => (1, 2),
            SpriteState::Melee => (3, 2),
            SpriteState::Shoot => (5, 2),
            SpriteState::SpellCast | SpriteState::CraftCast => (7, 2),
            SpriteState::Lie => (9, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    state: SpriteState,
    first: u32,
    frames: u32,
    looping: bool,
    elapsed: f32,
}

impl Animation {
    pub fn new(state: SpriteState) -> Self {
        let (first, frames) = state.columns();
        Self {
            state,
            first,
            frames,
            looping: true,
            elapsed: 0.0,
        }
    }

    fn once(state: SpriteState) -> Self {
        Self {
            looping: false,
            ..Self::new(state)
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn rewind(&mut self) {
        self.elapsed = 0.0;
    }

    fn played(&self) -> u32 {
        (self.elapsed * ANIM_FPS) as u32
    }

    pub fn finished(&self) -> bool {
        !self.looping && self.played() >= self.frames
    }

    /// Sheet column of the current frame.
    pub fn column(&self) -> u32 {
        let frame = if self.looping {
            self.played() % self.frames
        } else {
            self.played().min(self.frames - 1)
        };
        self.first + frame
    }
}

/// Sheets making up an avatar, named as graphic archive entries.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyParts {
    Split {
        torso: String,
        head: String,
        weapon: Option<String>,
    },
    Full {
        body: String,
        weapon: Option<String>,
    },
}

impl BodyParts {
    /// Sheets in draw order. The weapon goes on top of a split body and
    /// under a full body.
    pub fn layers(&self) -> Vec<&str> {
        match self {
            BodyParts::Split {
                torso,
                head,
                weapon,
            } => {
                let mut layers = vec![torso.as_str(), head.as_str()];
                layers.extend(weapon.as_deref());
                layers
            }
            BodyParts::Full { body, weapon } => {
                let mut layers: Vec<&str> = weapon.as_deref().into_iter().collect();
                layers.push(body);
                layers
            }
        }
    }

    pub fn set_weapon(&mut self, sheet: Option<String>) {
        match self {
            BodyParts::Split { weapon, .. } | BodyParts::Full { weapon, .. } => *weapon = sheet,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AvatarSprite {
    state: SpriteState,
    direction: Direction,
    primary: Animation,
    once: Option<Animation>,
    parts: BodyParts,
    seen_activation: u64,
}

impl AvatarSprite {
    /// Creates the sprite in the character's current state. Activations that
    /// happened before the avatar existed are not replayed.
    pub fn new(parts: BodyParts, c: &Character) -> Self {
        let state = SpriteState::of(c);
        Self {
            state,
            direction: Direction::Down,
            primary: Animation::new(state),
            once: None,
            parts,
            seen_activation: c.last_activation.map(|a| a.seq).unwrap_or(0),
        }
    }

    pub fn state(&self) -> SpriteState {
        self.state
    }

    /// State currently on screen, including a play-once overlay.
    pub fn shown_state(&self) -> SpriteState {
        self.once.as_ref().map(|a| a.state).unwrap_or(self.state)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn parts(&self) -> &BodyParts {
        &self.parts
    }

    pub fn set_weapon(&mut self, sheet: Option<String>) {
        self.parts.set_weapon(sheet);
    }

    /// Advances the sprite by `dt` seconds from the character's state.
    /// Returns the kind of a new activation, if the character made one since
    /// the last frame.
    pub fn update(&mut self, c: &Character, dt: f32) -> Option<ActivationKind> {
        let state = SpriteState::of(c);
        if state == SpriteState::Move {
            if let Some(dir) = c.dest.and_then(|dest| Direction::facing(c.position, dest)) {
                self.direction = dir;
            }
        }
        if state != self.state {
            self.state = state;
            self.primary = Animation::new(state);
        }
        self.primary.update(dt);

        if let Some(once) = &mut self.once {
            once.update(dt);
            if once.finished() {
                self.once = None;
            }
        }

        let activation = c.last_activation.filter(|a| a.seq != self.seen_activation)?;
        self.seen_activation = activation.seq;
        match activation.kind {
            ActivationKind::Melee => self.play_once(SpriteState::Melee),
            ActivationKind::Shoot => self.play_once(SpriteState::Shoot),
            _ => {}
        }
        Some(activation.kind)
    }

    /// Shows `state` once over the primary animation.
    pub fn play_once(&mut self, state: SpriteState) {
        let mut anim = Animation::once(state);
        anim.rewind();
        self.once = Some(anim);
    }

    /// Source rectangle of the current frame in every sheet.
    pub fn frame_src(&self) -> Rect {
        let anim = self.once.as_ref().unwrap_or(&self.primary);
        let row_from_top = SHEET_ROWS - 1 - self.direction.row_from_bottom();
        Rect::new(
            (anim.column() * FRAME_W) as i32,
            (row_from_top * FRAME_H) as i32,
            FRAME_W,
            FRAME_H,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mural_core::types::{Activation, Cast, UseAction};

    fn hero() -> Character {
        Character::new("player", "0", "Hero")
    }

    fn full() -> BodyParts {
        BodyParts::Full {
            body: "default.png".into(),
            weapon: None,
        }
    }

    #[test]
    fn state_follows_engine_conditions() {
        let mut c = hero();
        assert_eq!(SpriteState::of(&c), SpriteState::Idle);

        c.dest = Some(Position::new(100.0, 0.0));
        assert_eq!(SpriteState::of(&c), SpriteState::Move);

        c.cast = Some(Cast {
            action: UseAction::Recipe("bread".into()),
            target: None,
            elapsed_ms: 0,
            cast_ms: 1000,
        });
        assert_eq!(SpriteState::of(&c), SpriteState::CraftCast);
        c.cast = Some(Cast {
            action: UseAction::Skill("fireball".into()),
            target: None,
            elapsed_ms: 0,
            cast_ms: 1000,
        });
        assert_eq!(SpriteState::of(&c), SpriteState::SpellCast);

        c.cast = None;
        c.dest = None;
        c.health = 1;
        assert_eq!(SpriteState::of(&c), SpriteState::Kneel);
        c.health = 0;
        assert_eq!(SpriteState::of(&c), SpriteState::Lie);
    }

    #[test]
    fn facing_prefers_x_on_ties() {
        let origin = Position::new(0.0, 0.0);
        assert_eq!(Direction::facing(origin, Position::new(5.0, 5.0)), Some(Direction::Right));
        assert_eq!(Direction::facing(origin, Position::new(-5.0, 5.0)), Some(Direction::Left));
        assert_eq!(Direction::facing(origin, Position::new(1.0, 5.0)), Some(Direction::Up));
        assert_eq!(Direction::facing(origin, Position::new(1.0, -5.0)), Some(Direction::Down));
        assert_eq!(Direction::facing(origin, origin), None);
    }

    #[test]
    fn moving_sprite_faces_destination_and_animates() {
        let mut c = hero();
        c.dest = Some(Position::new(0.0, -100.0));
        let mut sprite = AvatarSprite::new(full(), &c);
        sprite.update(&c, 0.6);
        assert_eq!(sprite.state(), SpriteState::Move);
        assert_eq!(sprite.direction(), Direction::Down);
        // Second move frame, "down" row is the third from the top.
        assert_eq!(sprite.frame_src(), Rect::new(2 * 80, 2 * 90, 80, 90));
    }

    #[test]
    fn melee_plays_once_then_reverts() {
        let mut c = hero();
        let mut sprite = AvatarSprite::new(full(), &c);
        c.last_activation = Some(Activation {
            seq: 1,
            kind: ActivationKind::Melee,
        });
        assert_eq!(sprite.update(&c, 0.0), Some(ActivationKind::Melee));
        assert_eq!(sprite.shown_state(), SpriteState::Melee);
        assert_eq!(sprite.frame_src().x(), 3 * 80);

        // Same activation is not replayed.
        assert_eq!(sprite.update(&c, 0.6), None);
        assert_eq!(sprite.shown_state(), SpriteState::Melee);
        sprite.update(&c, 0.6);
        assert_eq!(sprite.shown_state(), SpriteState::Idle);
    }

    #[test]
    fn old_activations_are_not_replayed() {
        let mut c = hero();
        c.last_activation = Some(Activation {
            seq: 7,
            kind: ActivationKind::Shoot,
        });
        let mut sprite = AvatarSprite::new(full(), &c);
        assert_eq!(sprite.update(&c, 0.1), None);
        assert_eq!(sprite.shown_state(), SpriteState::Idle);
    }

    #[test]
    fn weapon_layer_order_depends_on_body_form() {
        let mut split = BodyParts::Split {
            torso: "torso.png".into(),
            head: "head.png".into(),
            weapon: None,
        };
        split.set_weapon(Some("sword.png".into()));
        assert_eq!(split.layers(), vec!["torso.png", "head.png", "sword.png"]);

        let mut body = full();
        body.set_weapon(Some("sword.png".into()));
        assert_eq!(body.layers(), vec!["sword.png", "default.png"]);
    }
}
