//! Area view: one engine area, its tile map and the avatars standing in it.

pub mod avatar;
pub mod sprite;
pub mod tilemap;

use mural_core::types::{Module, ObjectId, Position};
use sdl2::pixels::Color;
use sdl2::rect::Point;
use sdl2::render::Canvas;
use sdl2::video::Window;

use crate::assets::AssetRegistry;
use crate::bindings::Bindings;
use crate::filepaths::GuiPaths;
use crate::font_cache::{self, LINE_H, TEXT_COLOR};
use crate::game::Sight;
use crate::game_math::Projection;
use crate::render::{self, RenderContext};
use avatar::Avatar;
use tilemap::TileMap;

pub const FOG_COLOR: Color = Color::RGBA(26, 26, 26, 179);
const HOVER_COLOR: Color = Color::RGBA(230, 210, 150, 200);
/// Outline of a hovered corpse.
const LOOT_HOVER_COLOR: Color = Color::RGBA(170, 170, 190, 200);
/// World size of an area object's sprite.
pub const OBJECT_SIZE: f64 = 32.0;

/// Night tint strength for an in-world hour.
pub fn tint_alpha(hour: u32) -> f32 {
    match hour % 24 {
        5..=17 => 0.0,
        18..=21 => 0.5,
        _ => 0.9,
    }
}

/// Map cells within `cols`×`rows` whose center no player character sees.
pub fn fog_cells(
    map: &TileMap,
    cols: std::ops::Range<u32>,
    rows: std::ops::Range<u32>,
    sight: &Sight,
) -> Vec<(u32, u32)> {
    let mut cells = Vec::new();
    for row in rows {
        for col in cols.clone() {
            if !sight.sees(map.cell_center(col, row)) {
                cells.push((col, row));
            }
        }
    }
    cells
}

/// Something under the cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Hovered {
    pub id: ObjectId,
    pub name: String,
}

pub struct AreaView {
    chapter: String,
    area: String,
    map: TileMap,
    avatars: Vec<Avatar>,
    sounds: Vec<String>,
}

impl AreaView {
    pub fn new(chapter: &str, area: &str, map: TileMap) -> Self {
        Self {
            chapter: chapter.to_string(),
            area: area.to_string(),
            map,
            avatars: Vec::new(),
            sounds: Vec::new(),
        }
    }

    /// Loads the tile map of `area` from the GUI directory.
    pub fn load(paths: &GuiPaths, chapter: &str, area: &str) -> Result<Self, String> {
        let map = TileMap::load(&paths.area_map(chapter, area))?;
        Ok(Self::new(chapter, area, map))
    }

    pub fn id(&self) -> &str {
        &self.area
    }

    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn avatars(&self) -> &[Avatar] {
        &self.avatars
    }

    pub fn avatar(&self, oid: &ObjectId) -> Option<&Avatar> {
        self.avatars.iter().find(|a| a.id() == oid)
    }

    /// Reconciles the avatars with the engine area and advances each of
    /// them by `dt` seconds. Avatars out of every player's sight stay
    /// silent.
    pub fn update(&mut self, module: &Module, sight: &Sight, bindings: &mut Bindings, dt: f32) {
        let area = self.area.as_str();
        self.avatars
            .retain(|a| module.char(a.id()).is_some_and(|c| c.area == area));
        for c in module.area_chars(area) {
            if !self.avatars.iter().any(|a| c.is(a.id())) {
                log::debug!("Avatar created for {}", c.object_id());
                self.avatars.push(Avatar::new(c, bindings));
            }
        }

        for avatar in &mut self.avatars {
            let Some(c) = module.char(avatar.id()) else {
                continue;
            };
            avatar.silenced = !sight.sees(c.position);
            if let Some(sound) = avatar.update(c, bindings, dt) {
                self.sounds.push(sound);
            }
        }
    }

    /// Sounds raised by avatars since the last call.
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }

    pub fn passable_position(&self, pos: Position) -> bool {
        self.map.is_passable(pos)
    }

    /// Index of the first avatar, in insertion order, drawn under `point`.
    pub fn avatar_index_at(&self, proj: &Projection, point: Point) -> Option<usize> {
        self.avatars
            .iter()
            .position(|a| proj.sprite_rect(a.position()).contains_point(point))
    }

    pub fn set_hovered(&mut self, index: Option<usize>) {
        for (i, avatar) in self.avatars.iter_mut().enumerate() {
            avatar.hovered = Some(i) == index;
        }
    }

    /// First avatar or area object under `point`.
    pub fn hovered_at(&self, module: &Module, proj: &Projection, point: Point) -> Option<Hovered> {
        if let Some(i) = self.avatar_index_at(proj, point) {
            let avatar = &self.avatars[i];
            return Some(Hovered {
                id: avatar.id().clone(),
                name: avatar.name().to_string(),
            });
        }
        module
            .area(&self.area)?
            .objects
            .iter()
            .find(|o| {
                proj.world_rect(o.position, OBJECT_SIZE, OBJECT_SIZE)
                    .contains_point(point)
            })
            .map(|o| Hovered {
                id: o.object_id(),
                name: o.display_name().to_string(),
            })
    }

    fn visible_box(&self, proj: &Projection, ctx: &RenderContext) -> (Position, Position) {
        let min = proj.screen_to_world(Point::new(0, ctx.height as i32));
        let max = proj.screen_to_world(Point::new(ctx.width as i32, 0));
        (min, max)
    }

    fn draw_tiles(
        &self,
        canvas: &mut Canvas<Window>,
        assets: &mut AssetRegistry,
        proj: &Projection,
        ctx: &RenderContext,
    ) -> Result<(), String> {
        let (min, max) = self.visible_box(proj, ctx);
        let (cols, rows) = self.map.cells_between(min, max);
        let (tw, th) = self.map.tile_size();
        for layer in &self.map.layers {
            for row in rows.clone() {
                for col in cols.clone() {
                    let Some(tile) = self.map.tile(layer, col, row) else {
                        continue;
                    };
                    let Some(tileset) = self.map.tilesets.get(tile.tileset) else {
                        continue;
                    };
                    let Some(image) = &tileset.image else {
                        continue;
                    };
                    let dst = proj.world_rect(self.map.cell_origin(col, row), tw, th);
                    let texture = assets.image_file(image);
                    render::draw_texture(canvas, texture, Some(tileset.tile_src(tile.id)), dst)?;
                }
            }
        }
        Ok(())
    }

    fn draw_objects(
        &self,
        canvas: &mut Canvas<Window>,
        assets: &mut AssetRegistry,
        module: &Module,
        proj: &Projection,
        sight: &Sight,
    ) -> Result<(), String> {
        let Some(area) = module.area(&self.area) else {
            return Ok(());
        };
        for object in area.objects.iter().filter(|o| sight.sees(o.position)) {
            let dst = proj.world_rect(object.position, OBJECT_SIZE, OBJECT_SIZE);
            let texture = assets.texture(&format!("{}.png", object.id));
            render::draw_texture(canvas, texture, None, dst)?;
        }
        Ok(())
    }

    fn draw_avatars(
        &self,
        canvas: &mut Canvas<Window>,
        assets: &mut AssetRegistry,
        proj: &Projection,
        sight: &Sight,
    ) -> Result<(), String> {
        for avatar in self.avatars.iter().filter(|a| sight.sees(a.position())) {
            let dst = proj.sprite_rect(avatar.position());
            let src = avatar.sprite().frame_src();
            for sheet in avatar.sprite().parts().layers() {
                let texture = assets.avatar_sheet(sheet);
                render::draw_texture(canvas, texture, Some(src), dst)?;
            }
            if avatar.hovered {
                let outline = if avatar.alive() { HOVER_COLOR } else { LOOT_HOVER_COLOR };
                canvas.set_draw_color(outline);
                canvas.draw_rect(dst)?;
            }
            if let Some(bubble) = avatar.bubble() {
                let text = format!("{}: {}", avatar.name(), bubble.text);
                let x = dst.center().x();
                let y = dst.y() - LINE_H as i32;
                font_cache::draw_text_centered(canvas, &text, x, y, TEXT_COLOR)?;
            }
        }
        Ok(())
    }

    fn draw_fog(
        &self,
        canvas: &mut Canvas<Window>,
        proj: &Projection,
        sight: &Sight,
        ctx: &RenderContext,
    ) -> Result<(), String> {
        let (min, max) = self.visible_box(proj, ctx);
        let (cols, rows) = self.map.cells_between(min, max);
        let (tw, th) = self.map.tile_size();
        for (col, row) in fog_cells(&self.map, cols, rows, sight) {
            let rect = proj.world_rect(self.map.cell_origin(col, row), tw, th);
            render::fill_rect(canvas, rect, FOG_COLOR)?;
        }
        Ok(())
    }

    /// Draws tiles, area objects, avatars, fog of war and the night tint.
    pub fn draw(
        &self,
        canvas: &mut Canvas<Window>,
        assets: &mut AssetRegistry,
        module: &Module,
        proj: &Projection,
        sight: &Sight,
        ctx: &RenderContext,
    ) -> Result<(), String> {
        self.draw_tiles(canvas, assets, proj, ctx)?;
        self.draw_objects(canvas, assets, module, proj, sight)?;
        self.draw_avatars(canvas, assets, proj, sight)?;
        self.draw_fog(canvas, proj, sight, ctx)?;

        let alpha = tint_alpha(module.hour());
        if alpha > 0.0 {
            let tint = Color::RGBA(0, 0, 20, (alpha * 255.0) as u8);
            render::fill_rect(canvas, ctx.screen(), tint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::tilemap::tests::test_map;
    use mural_core::types::Character;

    fn module_with(chars: &[(&str, &str, f64, f64)]) -> Module {
        let chapter = mural_core::types::Chapter {
            id: "prologue".into(),
            name: String::new(),
            areas: vec![mural_core::types::Area::new("village")],
            start_area: "village".into(),
            start_position: Position::default(),
        };
        let mut module = Module::new("test", chapter);
        for (id, serial, x, y) in chars {
            let mut c = Character::new(*id, *serial, *id);
            c.area = "village".into();
            c.position = Position::new(*x, *y);
            module.characters.push(c);
        }
        module
    }

    #[test]
    fn tint_follows_the_clock() {
        assert_eq!(tint_alpha(5), 0.0);
        assert_eq!(tint_alpha(17), 0.0);
        assert_eq!(tint_alpha(18), 0.5);
        assert_eq!(tint_alpha(21), 0.5);
        assert_eq!(tint_alpha(22), 0.9);
        assert_eq!(tint_alpha(3), 0.9);
    }

    #[test]
    fn avatars_follow_the_engine_area() {
        let mut module = module_with(&[("player", "0", 50.0, 50.0), ("wolf", "5", 90.0, 50.0)]);
        let mut view = AreaView::new("prologue", "village", test_map());
        let mut bindings = Bindings::default();
        let sight = Sight::new(vec![(Position::new(50.0, 50.0), 100.0)]);

        view.update(&module, &sight, &mut bindings, 0.1);
        let ids: Vec<String> = view.avatars().iter().map(|a| a.id().to_string()).collect();
        assert_eq!(ids, vec!["player#0", "wolf#5"]);

        module.characters[1].area = "forest".into();
        view.update(&module, &sight, &mut bindings, 0.1);
        assert_eq!(view.avatars().len(), 1);
    }

    #[test]
    fn out_of_sight_avatars_are_silenced() {
        let module = module_with(&[("player", "0", 50.0, 50.0), ("wolf", "5", 900.0, 50.0)]);
        let mut view = AreaView::new("prologue", "village", test_map());
        let mut bindings = Bindings::default();
        let sight = Sight::new(vec![(Position::new(50.0, 50.0), 100.0)]);
        view.update(&module, &sight, &mut bindings, 0.1);
        assert!(!view.avatars()[0].silenced);
        assert!(view.avatars()[1].silenced);
    }

    #[test]
    fn fog_covers_unseen_cells() {
        let map = test_map();
        let sight = Sight::new(vec![(Position::new(16.0, 16.0), 10.0)]);
        let fog = fog_cells(&map, 0..2, 6..8, &sight);
        assert_eq!(fog, vec![(0, 6), (1, 6), (1, 7)]);
    }

    #[test]
    fn picking_scans_avatars_in_insertion_order() {
        let module = module_with(&[("player", "0", 100.0, 100.0), ("wolf", "5", 110.0, 100.0)]);
        let mut view = AreaView::new("prologue", "village", test_map());
        let sight = Sight::new(vec![(Position::new(100.0, 100.0), 300.0)]);
        view.update(&module, &sight, &mut Bindings::default(), 0.0);

        let proj = Projection::new(Position::default(), 1.0, 500);
        // Both sprites overlap here; the first inserted wins.
        assert_eq!(view.avatar_index_at(&proj, Point::new(100, 380)), Some(0));
        assert_eq!(view.avatar_index_at(&proj, Point::new(145, 380)), Some(1));
        assert_eq!(view.avatar_index_at(&proj, Point::new(400, 10)), None);
        let hovered = view.hovered_at(&module, &proj, Point::new(145, 380)).unwrap();
        assert_eq!(hovered.name, "wolf");
    }
}
