use mural_core::types::{Inventory, Module, ObjectId};

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::render::{SLOT_BG, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, Panel, ScrollList};
use super::slot::{self, SlotPayload};

/// One row of the loot list: every lootable item of one id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LootStack {
    pub id: String,
    pub name: String,
    pub keys: Vec<String>,
}

/// Groups the lootable items of `inv` by item id, in inventory order.
pub fn loot_stacks(inv: &Inventory) -> Vec<LootStack> {
    let mut stacks: Vec<LootStack> = Vec::new();
    for item in inv.loot_items() {
        match stacks.iter_mut().find(|s| s.id == item.id) {
            Some(stack) => stack.keys.push(item.key()),
            None => stacks.push(LootStack {
                id: item.id.clone(),
                name: item.display_name().to_string(),
                keys: vec![item.key()],
            }),
        }
    }
    stacks
}

/// Contents of a dead character or container. Clicking a row moves the
/// whole stack to the active player character.
#[derive(Debug, Default)]
pub struct LootPanel {
    target: Option<ObjectId>,
    list: ScrollList,
}

impl LootPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, target: ObjectId) {
        self.target = Some(target);
        self.list.reset();
    }

    fn stacks(&self, module: &Module) -> Vec<LootStack> {
        self.target
            .as_ref()
            .and_then(|t| module.inventory(t))
            .map(loot_stacks)
            .unwrap_or_default()
    }
}

impl Panel for LootPanel {
    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let Some(target) = self.target.clone() else {
            ctx.act(HudAction::Close);
            return;
        };
        let stacks = self.stacks(ctx.module);
        let area = panel::content_rect(ctx.rc, rect);
        self.list.scroll(ctx.input, ctx.rc, area, stacks.len());

        if let Some(row) = self.list.row_at(ctx.rc, area, ctx.input.mouse(), stacks.len()) {
            let row_rect = self.list.row_rect(ctx.rc, area, row).unwrap_or(area);
            if ctx.input.take_left_click(row_rect) {
                let keys = &stacks[row].keys;
                match ctx.game.transfer_items(ctx.module, &target, ctx.pc, keys) {
                    Ok(()) => ctx.act(HudAction::RefreshInventory),
                    Err(err) => {
                        log::warn!("Loot failed: {err:#}");
                        ctx.game.refuse(ctx.module, ctx.pc, "inv_full");
                    }
                }
            }
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let module = ctx.module;
        let title = match self.target.as_ref().and_then(|t| module.char(t)) {
            Some(c) => c.display_name().to_string(),
            None => ctx.i18n.text("loot").to_string(),
        };
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let stacks = self.stacks(module);
        if stacks.is_empty() {
            let empty = ctx.i18n.text("empty").to_string();
            return font_cache::draw_text(ctx.canvas, &empty, area.x(), area.y(), TEXT_DIM);
        }
        for row in self.list.visible(ctx.rc, area, stacks.len()) {
            let Some(row_rect) = self.list.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let stack = &stacks[row];
            let hovered = row_rect.contains_point(ctx.mouse);
            let size = row_rect.height().saturating_sub(4).max(1);
            let icon_rect = sdl2::rect::Rect::new(row_rect.x(), row_rect.y() + 2, size, size);
            slot::draw_slot(ctx, icon_rect, &SlotPayload::Empty, if hovered { SLOT_SELECTED } else { SLOT_BG }, 0)?;
            let icon = ctx.assets.bindings.item(&stack.id).icon.clone();
            let texture = ctx.assets.icon(&icon);
            crate::render::draw_texture(ctx.canvas, texture, None, icon_rect)?;
            let label = if stack.keys.len() > 1 {
                format!("{} x{}", stack.name, stack.keys.len())
            } else {
                stack.name.clone()
            };
            font_cache::draw_text(
                ctx.canvas,
                &label,
                icon_rect.right() + ctx.rc.s(10),
                row_rect.y() + (row_rect.height() as i32 - font_cache::LINE_H as i32) / 2,
                TEXT_COLOR,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::layout::Layout;
    use crate::render::RenderContext;
    use crate::testing::{misc, pc, test_module, wolf};
    use mural_core::console::Console;

    fn dead_wolf(module: &mut Module) {
        let c = module.char_mut(&wolf()).unwrap();
        c.health = 0;
        c.inventory.add_item(misc("fang", "11", 2)).unwrap();
        c.inventory.add_item(misc("fang", "12", 2)).unwrap();
        c.inventory.add_item(misc("pelt", "13", 8)).unwrap();
        c.inventory.set_all_lootable();
    }

    #[test]
    fn items_group_by_id() {
        let mut module = test_module();
        dead_wolf(&mut module);
        let stacks = loot_stacks(module.inventory(&wolf()).unwrap());
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].keys, ["fang11", "fang12"]);
        assert_eq!(stacks[1].id, "pelt");
    }

    #[test]
    fn clicking_a_row_takes_the_stack() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let mut module = test_module();
        dead_wolf(&mut module);
        let mut panel = LootPanel::new();
        panel.open(wolf());

        let rc = RenderContext::new(1920, 1080, false);
        let area = panel::content_rect(&rc, panel.rect(&rc));
        let row = panel.list.row_rect(&rc, area, 0).unwrap();
        let mut input = InputState::new();
        input.click_at(row.center().x(), row.center().y(), false);
        let (mut layout, mut drag, mut actions) = (Layout::default(), None, Vec::new());
        let pc = pc();
        let mut ctx = FrameCtx {
            game: &game,
            module: &mut module,
            pc: &pc,
            input: &mut input,
            rc: &rc,
            layout: &mut layout,
            drag: &mut drag,
            actions: &mut actions,
        };
        panel.update(&mut ctx);

        let inv = &module.char(&pc).unwrap().inventory;
        assert!(inv.contains("fang11") && inv.contains("fang12"));
        assert!(!inv.contains("pelt13"));
        assert_eq!(actions, [HudAction::RefreshInventory]);
    }
}
