//! Area camera: viewport position, keyboard scrolling and click picking.

use mural_core::constants::{ACTION_RANGE, DIALOG_RANGE, LOOT_RANGE};
use mural_core::traits::Attitude;
use mural_core::types::{Module, ObjectId, Position};
use sdl2::keyboard::Keycode;
use sdl2::rect::Point;

use crate::area::AreaView;
use crate::game_math::Projection;
use crate::input::InputState;

/// Tiles the camera may scroll past each edge of the map.
pub const SCROLL_MARGIN_TILES: f64 = 16.0;

#[derive(Clone, Debug)]
pub struct Camera {
    position: Position,
    size: (u32, u32),
    scale: f32,
    locked: bool,
    tile: Option<(f64, f64)>,
    map: (f64, f64),
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            size: (1, 1),
            scale: 1.0,
            locked: false,
            tile: None,
            map: (0.0, 0.0),
        }
    }

    pub fn set_area(&mut self, view: &AreaView) {
        self.tile = Some(view.map().tile_size());
        self.map = view.map().size();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, pos: Position) {
        self.position = pos;
    }

    /// Updates the screen size and global scale.
    pub fn resize(&mut self, width: u32, height: u32, scale: f32) {
        self.size = (width.max(1), height.max(1));
        self.scale = scale;
    }

    /// Puts `pos` in the middle of the screen.
    pub fn center_at(&mut self, pos: Position) {
        let scale = self.scale.max(0.01) as f64;
        self.position = Position::new(
            pos.x - self.size.0 as f64 / 2.0 / scale,
            pos.y - self.size.1 as f64 / 2.0 / scale,
        );
    }

    /// World box currently on screen, bottom-left and top-right corners.
    pub fn frame(&self) -> (Position, Position) {
        let scale = self.scale.max(0.01) as f64;
        let top_right = Position::new(
            self.position.x + self.size.0 as f64 / scale,
            self.position.y + self.size.1 as f64 / scale,
        );
        (self.position, top_right)
    }

    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.position, self.scale, self.size.1)
    }

    pub fn conv_screen_to_world(&self, point: Point) -> Position {
        self.projection().screen_to_world(point)
    }

    /// Moves the camera by whole tiles, staying within the scroll margin
    /// around the map.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        let Some((tw, th)) = self.tile else {
            return;
        };
        let clamp = |v: f64, tile: f64, size: f64| {
            v.clamp(-SCROLL_MARGIN_TILES * tile, size + SCROLL_MARGIN_TILES * tile)
        };
        self.position.x = clamp(self.position.x + dx as f64 * tw, tw, self.map.0);
        self.position.y = clamp(self.position.y + dy as f64 * th, th, self.map.1);
    }

    /// Scrolls on W/A/S/D and the arrow keys while unlocked.
    pub fn update(&mut self, input: &mut InputState) {
        if self.locked || self.tile.is_none() {
            return;
        }
        let moves = [
            (Keycode::W, 0, 1),
            (Keycode::Up, 0, 1),
            (Keycode::D, 1, 0),
            (Keycode::Right, 1, 0),
            (Keycode::S, 0, -1),
            (Keycode::Down, 0, -1),
            (Keycode::A, -1, 0),
            (Keycode::Left, -1, 0),
        ];
        for (key, dx, dy) in moves {
            if input.take_key(key) {
                self.scroll(dx, dy);
            }
        }
    }
}

/// What a left click on the area asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Pick {
    Nothing,
    /// Attack the character.
    Use(ObjectId),
    Loot(ObjectId),
    Dialog { owner: ObjectId, dialog: String },
    /// Clicked target is out of range; `approach` is where to walk for an
    /// attack.
    TooFar { approach: Option<Position> },
    Move(Position),
    Teleport(Position),
}

/// Resolves a left click at screen point `point` for the active player
/// character `pc`. Panels must already have had their chance at the click.
pub fn pick(
    module: &Module,
    view: &AreaView,
    proj: &Projection,
    pc: &ObjectId,
    point: Point,
    paused: bool,
    teleport: bool,
) -> Pick {
    let world = proj.screen_to_world(point);
    if teleport {
        return Pick::Teleport(world);
    }
    let Some(player) = module.char(pc) else {
        return Pick::Nothing;
    };

    let mut too_far = false;
    for avatar in view.avatars() {
        if !proj.sprite_rect(avatar.position()).contains_point(point) {
            continue;
        }
        let Some(c) = module.char(avatar.id()) else {
            continue;
        };
        let is_player = c.is(pc);
        let distance = c.position.distance(&player.position);
        let hostile = c.attitude_towards(player) == Attitude::Hostile
            || player.attitude_towards(c) == Attitude::Hostile;

        if c.alive() && !is_player && hostile {
            if distance <= ACTION_RANGE {
                return Pick::Use(c.object_id());
            }
            return Pick::TooFar {
                approach: Some(c.position),
            };
        }
        if !c.alive() && !is_player {
            if distance <= LOOT_RANGE {
                return Pick::Loot(c.object_id());
            }
            too_far = true;
            continue;
        }
        if c.alive() && !is_player {
            if let Some(dialog) = c.dialogs_for(player).first() {
                if distance <= DIALOG_RANGE {
                    return Pick::Dialog {
                        owner: c.object_id(),
                        dialog: dialog.id.clone(),
                    };
                }
                too_far = true;
            }
        }
    }

    if too_far {
        return Pick::TooFar { approach: None };
    }
    if !paused && view.passable_position(world) {
        return Pick::Move(world);
    }
    Pick::Nothing
}

/// Character under `point` to become the new target, if any.
pub fn target_at(view: &AreaView, proj: &Projection, point: Point) -> Option<ObjectId> {
    view.avatar_index_at(proj, point)
        .map(|i| view.avatars()[i].id().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::tilemap::tests::test_map;
    use crate::bindings::Bindings;
    use crate::game::Sight;
    use crate::testing::{merchant, pc, test_module, wolf};

    fn view_of(module: &Module) -> AreaView {
        let mut view = AreaView::new("prologue", "village", test_map());
        let sight = Sight::new(vec![(Position::new(50.0, 50.0), 1000.0)]);
        view.update(module, &sight, &mut Bindings::default(), 0.0);
        view
    }

    fn proj() -> Projection {
        Projection::new(Position::default(), 1.0, 500)
    }

    #[test]
    fn click_on_ground_moves() {
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().position = Position::new(220.0, 220.0);
        let view = view_of(&module);
        let pick = pick(&module, &view, &proj(), &pc(), Point::new(100, 400), false, false);
        assert_eq!(pick, Pick::Move(Position::new(100.0, 100.0)));
    }

    #[test]
    fn no_move_while_paused_or_off_ground() {
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().position = Position::new(220.0, 220.0);
        let view = view_of(&module);
        assert_eq!(
            pick(&module, &view, &proj(), &pc(), Point::new(100, 400), true, false),
            Pick::Nothing
        );
        // Water covers the top-left quarter of the map.
        assert_eq!(
            pick(&module, &view, &proj(), &pc(), Point::new(110, 300), false, false),
            Pick::Nothing
        );
    }

    #[test]
    fn click_on_enemy_in_range_attacks() {
        let module = test_module();
        let view = view_of(&module);
        // Wolf stands at (90, 50), right of the player.
        let pick = pick(&module, &view, &proj(), &pc(), Point::new(125, 430), false, false);
        assert_eq!(pick, Pick::Use(wolf()));
    }

    #[test]
    fn click_on_far_enemy_approaches() {
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().position = Position::new(250.0, 50.0);
        let view = view_of(&module);
        let pick = pick(&module, &view, &proj(), &pc(), Point::new(250, 420), false, false);
        assert_eq!(
            pick,
            Pick::TooFar {
                approach: Some(Position::new(250.0, 50.0))
            }
        );
    }

    #[test]
    fn click_on_corpse_loots_and_on_merchant_talks() {
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().health = 0;
        let view = view_of(&module);
        let loot = pick(&module, &view, &proj(), &pc(), Point::new(125, 430), false, false);
        assert_eq!(loot, Pick::Loot(wolf()));

        // Merchant at (50, 200) is 150 away.
        let far = pick(&module, &view, &proj(), &pc(), Point::new(50, 280), false, false);
        assert_eq!(far, Pick::TooFar { approach: None });

        module.char_mut(&merchant()).unwrap().position = Position::new(20.0, 80.0);
        let view = view_of(&module);
        let talk = pick(&module, &view, &proj(), &pc(), Point::new(0, 400), false, false);
        assert_eq!(
            talk,
            Pick::Dialog {
                owner: merchant(),
                dialog: "merchant".into()
            }
        );
    }

    #[test]
    fn debug_click_teleports() {
        let module = test_module();
        let view = view_of(&module);
        let pick = pick(&module, &view, &proj(), &pc(), Point::new(125, 430), false, true);
        assert_eq!(pick, Pick::Teleport(Position::new(125.0, 70.0)));
    }

    #[test]
    fn scrolling_is_clamped_around_the_map() {
        let mut camera = Camera::new();
        camera.set_area(&AreaView::new("prologue", "village", test_map()));
        for _ in 0..40 {
            camera.scroll(-1, 1);
        }
        assert_eq!(camera.position(), Position::new(-16.0 * 32.0, 256.0 + 16.0 * 32.0));
    }

    #[test]
    fn locked_camera_ignores_keys() {
        let mut camera = Camera::new();
        camera.set_area(&AreaView::new("prologue", "village", test_map()));
        let mut input = InputState::new();
        camera.lock(true);
        input.press_key(Keycode::D, false);
        camera.update(&mut input);
        assert_eq!(camera.position(), Position::default());

        camera.lock(false);
        camera.update(&mut input);
        assert_eq!(camera.position(), Position::new(32.0, 0.0));
    }

    #[test]
    fn center_puts_point_mid_screen() {
        let mut camera = Camera::new();
        camera.resize(200, 100, 0.5);
        camera.center_at(Position::new(500.0, 500.0));
        assert_eq!(camera.position(), Position::new(300.0, 400.0));
        let (_, top_right) = camera.frame();
        assert_eq!(top_right, Position::new(700.0, 600.0));
    }
}
