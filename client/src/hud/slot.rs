//! Slot contents shared by the inventory, the skills list and the menu bar.

use mural_core::types::{Character, Module, ObjectId, UseAction, UseTarget};
use sdl2::pixels::Color;
use sdl2::rect::Rect;

use crate::font_cache::{self, TEXT_COLOR};
use crate::game::Game;
use crate::render::{self, DIM_OVERLAY, SLOT_BG, SLOT_BORDER};

use super::panel::DrawCtx;

/// What a slot shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotPayload {
    /// Inventory item, by `id + serial`.
    Item(String),
    /// Known skill, by id.
    Skill(String),
    Empty,
}

impl SlotPayload {
    /// Resolves a layout entry against what `c` carries and knows. Keys
    /// naming nothing the character owns resolve to [`SlotPayload::Empty`].
    pub fn resolve(c: &Character, key: &str) -> Self {
        if c.inventory.contains(key) {
            SlotPayload::Item(key.to_string())
        } else if c.skill(key).is_some() {
            SlotPayload::Skill(key.to_string())
        } else {
            SlotPayload::Empty
        }
    }

    /// Layout key of the payload.
    pub fn key(&self) -> Option<&str> {
        match self {
            SlotPayload::Item(key) | SlotPayload::Skill(key) => Some(key),
            SlotPayload::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotPayload::Empty)
    }

    /// `true` while the payload cannot be used because of a cooldown.
    pub fn cooling_down(&self, c: &Character) -> bool {
        match self {
            SlotPayload::Skill(id) => c.global_cooldown_ms > 0 || c.on_cooldown(id),
            SlotPayload::Item(_) => c.global_cooldown_ms > 0,
            SlotPayload::Empty => false,
        }
    }

    fn icon(&self, ctx: &mut DrawCtx<'_>, c: &Character) -> Option<String> {
        match self {
            SlotPayload::Item(key) => {
                let item = c.inventory.item_by_key(key)?;
                Some(ctx.assets.bindings.item(&item.id).icon.clone())
            }
            SlotPayload::Skill(id) => Some(ctx.assets.bindings.skill(id).icon.clone()),
            SlotPayload::Empty => None,
        }
    }
}

/// Where a dragged payload was picked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragSource {
    Inventory(usize),
    Skills,
    Bar(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Drag {
    pub source: DragSource,
    pub payload: SlotPayload,
}

/// Uses or toggles the payload as `pc`: equipable items are equipped or
/// taken off, everything else is used on the current target.
pub fn activate(game: &Game, module: &mut Module, pc: &ObjectId, payload: &SlotPayload) {
    let Some(c) = module.char(pc) else {
        return;
    };
    match payload {
        SlotPayload::Item(key) => {
            let Some(item) = c.inventory.item_by_key(key) else {
                return;
            };
            let (equipable, usable) = (item.equipable(), item.usable());
            let equipped = c.equipment.equipped(key);
            let result = if equipable {
                if equipped {
                    game.unequip(module, pc, key)
                } else {
                    game.equip(module, pc, key)
                }
            } else if usable {
                let _ = game.use_action(module, pc, UseAction::Item(key.clone()), UseTarget::Auto);
                Ok(())
            } else {
                return;
            };
            if let Err(err) = result {
                log::warn!("{err:#}");
            }
        }
        SlotPayload::Skill(id) => {
            let _ = game.use_action(module, pc, UseAction::Skill(id.clone()), UseTarget::Auto);
        }
        SlotPayload::Empty => {}
    }
}

/// Draws a slot box with the payload icon. `count` above one is printed in
/// the corner.
pub fn draw_slot(
    ctx: &mut DrawCtx<'_>,
    rect: Rect,
    payload: &SlotPayload,
    fill: Color,
    count: usize,
) -> Result<(), String> {
    render::draw_frame(ctx.canvas, rect, fill, SLOT_BORDER)?;
    let module = ctx.module;
    let Some(c) = module.char(ctx.pc) else {
        return Ok(());
    };
    if let Some(icon) = payload.icon(ctx, c) {
        let inner = Rect::new(
            rect.x() + 2,
            rect.y() + 2,
            rect.width().saturating_sub(4).max(1),
            rect.height().saturating_sub(4).max(1),
        );
        let texture = ctx.assets.icon(&icon);
        render::draw_texture(ctx.canvas, texture, None, inner)?;
    }
    if payload.cooling_down(c) {
        render::fill_rect(ctx.canvas, rect, DIM_OVERLAY)?;
    }
    if count > 1 {
        font_cache::draw_text(
            ctx.canvas,
            &count.to_string(),
            rect.x() + 3,
            rect.bottom() - 11,
            TEXT_COLOR,
        )?;
    }
    Ok(())
}

/// Icon following the cursor while something is dragged.
pub fn draw_drag(ctx: &mut DrawCtx<'_>) -> Result<(), String> {
    let Some(drag) = ctx.drag.cloned() else {
        return Ok(());
    };
    let size = ctx.rc.su(40);
    let rect = Rect::new(
        ctx.mouse.x() - size as i32 / 2,
        ctx.mouse.y() - size as i32 / 2,
        size,
        size,
    );
    draw_slot(ctx, rect, &drag.payload, SLOT_BG, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pc, skill, test_module};
    use mural_core::console::Console;

    #[test]
    fn layout_keys_resolve_against_the_character() {
        let mut module = test_module();
        module.char_mut(&pc()).unwrap().skills.push(skill("heal"));
        let c = module.char(&pc()).unwrap();
        assert_eq!(SlotPayload::resolve(c, "sword1"), SlotPayload::Item("sword1".into()));
        assert_eq!(SlotPayload::resolve(c, "heal"), SlotPayload::Skill("heal".into()));
        assert_eq!(SlotPayload::resolve(c, "gem3"), SlotPayload::Empty);
    }

    #[test]
    fn activating_an_equipped_item_takes_it_off() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let mut module = test_module();
        activate(&game, &mut module, &pc(), &SlotPayload::Item("sword1".into()));
        assert!(!module.char(&pc()).unwrap().equipment.equipped("sword1"));
        activate(&game, &mut module, &pc(), &SlotPayload::Item("sword1".into()));
        assert!(module.char(&pc()).unwrap().equipment.equipped("sword1"));
    }

    #[test]
    fn cooldowns_dim_slots() {
        let mut module = test_module();
        let c = module.char_mut(&pc()).unwrap();
        c.global_cooldown_ms = 500;
        let c = module.char(&pc()).unwrap();
        assert!(SlotPayload::Item("apple2".into()).cooling_down(c));
        assert!(!SlotPayload::Empty.cooling_down(c));
    }
}
