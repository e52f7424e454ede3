//! Inventory panel: a grid of fixed slots holding stacks of same-id items,
//! arranged by the player's saved layout.

use mural_core::types::{Module, ObjectId};
use sdl2::rect::Rect;

use crate::layout::{INV_SLOTS, Layout};
use crate::render::{RenderContext, SLOT_BG, SLOT_EQUIPPED, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, Panel};
use super::slot::{self, Drag, DragSource, SlotPayload};

/// Items of one id a single slot holds at most.
pub const STACK_MAX: usize = 20;
const COLUMNS: usize = 10;
const SLOT_SIZE: u32 = 52;
const SLOT_GAP: u32 = 6;

/// Item keys per slot; each stack holds items of one id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stacks {
    slots: Vec<Vec<String>>,
    ids: Vec<Option<String>>,
}

impl Default for Stacks {
    fn default() -> Self {
        Self {
            slots: vec![Vec::new(); INV_SLOTS],
            ids: vec![None; INV_SLOTS],
        }
    }
}

impl Stacks {
    /// Arranges `items` (`(key, id)` pairs) into slots: items recorded in
    /// the layout go to their slot first, the rest join the first stack of
    /// the same id with room left, or else the first empty slot.
    pub fn arrange(items: &[(String, String)], layout: &Layout) -> Self {
        let mut stacks = Self::default();
        let mut rest = Vec::new();
        for (key, id) in items {
            let slot = layout.inv_slot_id(key);
            if slot >= 0 && stacks.fits(slot as usize, id) {
                stacks.put(slot as usize, key, id);
            } else {
                rest.push((key, id));
            }
        }
        for (key, id) in rest {
            let target = (0..INV_SLOTS)
                .find(|s| stacks.ids[*s].as_deref() == Some(id.as_str()) && stacks.fits(*s, id))
                .or_else(|| (0..INV_SLOTS).find(|s| stacks.slots[*s].is_empty()));
            match target {
                Some(slot) => stacks.put(slot, key, id),
                None => log::warn!("No inventory slot left for {key}"),
            }
        }
        stacks
    }

    fn fits(&self, slot: usize, id: &str) -> bool {
        match &self.ids[slot] {
            None => true,
            Some(current) => current == id && self.slots[slot].len() < STACK_MAX,
        }
    }

    fn put(&mut self, slot: usize, key: &str, id: &str) {
        self.slots[slot].push(key.to_string());
        self.ids[slot] = Some(id.to_string());
    }

    pub fn slot(&self, slot: usize) -> &[String] {
        self.slots.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, slot: usize) -> Option<&str> {
        self.slot(slot).first().map(String::as_str)
    }

    /// Moves the whole stack of `from` onto `to`; occupied targets swap.
    pub fn move_stack(&mut self, from: usize, to: usize) {
        if from == to || from >= INV_SLOTS || to >= INV_SLOTS {
            return;
        }
        self.slots.swap(from, to);
        self.ids.swap(from, to);
    }

    /// Moves one item from `from` onto `to` if `to` is empty or holds the
    /// same id with room left.
    pub fn move_one(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= INV_SLOTS || to >= INV_SLOTS {
            return false;
        }
        let Some(id) = self.ids[from].clone() else {
            return false;
        };
        if !self.fits(to, &id) {
            return false;
        }
        let Some(key) = self.slots[from].pop() else {
            return false;
        };
        if self.slots[from].is_empty() {
            self.ids[from] = None;
        }
        self.put(to, &key, &id);
        true
    }

    /// Records the first item of every stack in `layout`.
    pub fn write_layout(&self, layout: &mut Layout) {
        layout.clear_inv();
        for (slot, keys) in self.slots.iter().enumerate() {
            if let Some(key) = keys.first() {
                layout.save_inv_slot(key, slot as i32);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InventoryPanel {
    stacks: Stacks,
    scroll: usize,
}

impl InventoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stacks(&self) -> &Stacks {
        &self.stacks
    }

    /// Rebuilds the stacks from the engine inventory and writes the
    /// resulting arrangement back to the layout.
    pub fn refresh(&mut self, module: &Module, pc: &ObjectId, layout: &mut Layout) {
        let items: Vec<(String, String)> = module
            .char(pc)
            .map(|c| {
                c.inventory
                    .items()
                    .iter()
                    .map(|i| (i.key(), i.id.clone()))
                    .collect()
            })
            .unwrap_or_default();
        self.stacks = Stacks::arrange(&items, layout);
        self.stacks.write_layout(layout);
    }

    fn rows_fitting(rc: &RenderContext, area: Rect) -> usize {
        (area.height() / rc.su(SLOT_SIZE + SLOT_GAP)).max(1) as usize
    }

    fn slot_rect(&self, rc: &RenderContext, area: Rect, slot: usize) -> Option<Rect> {
        let row = slot / COLUMNS;
        if row < self.scroll || row >= self.scroll + Self::rows_fitting(rc, area) {
            return None;
        }
        let step = rc.s((SLOT_SIZE + SLOT_GAP) as i32);
        Some(Rect::new(
            area.x() + (slot % COLUMNS) as i32 * step,
            area.y() + (row - self.scroll) as i32 * step,
            rc.su(SLOT_SIZE),
            rc.su(SLOT_SIZE),
        ))
    }

    fn left_click(&mut self, ctx: &mut FrameCtx<'_>, slot: usize) {
        match ctx.drag.take() {
            Some(Drag {
                source: DragSource::Inventory(from),
                ..
            }) => {
                if ctx.input.shift() {
                    self.stacks.move_one(from, slot);
                } else {
                    self.stacks.move_stack(from, slot);
                }
                self.stacks.write_layout(ctx.layout);
            }
            Some(_) => {}
            None => {
                if let Some(key) = self.stacks.first(slot) {
                    *ctx.drag = Some(Drag {
                        source: DragSource::Inventory(slot),
                        payload: SlotPayload::Item(key.to_string()),
                    });
                }
            }
        }
    }

    fn right_click(&mut self, ctx: &mut FrameCtx<'_>, slot: usize) {
        let Some(key) = self.stacks.first(slot) else {
            return;
        };
        let payload = SlotPayload::Item(key.to_string());
        slot::activate(ctx.game, ctx.module, ctx.pc, &payload);
        self.refresh(ctx.module, ctx.pc, ctx.layout);
    }
}

impl Panel for InventoryPanel {
    fn show(&mut self, module: &Module, pc: &ObjectId, layout: &mut Layout) {
        self.scroll = 0;
        self.refresh(module, pc, layout);
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let area = panel::content_rect(ctx.rc, rect);
        if area.contains_point(ctx.input.mouse()) && ctx.input.wheel() != 0 {
            let rows = INV_SLOTS.div_ceil(COLUMNS);
            let max = rows.saturating_sub(Self::rows_fitting(ctx.rc, area));
            let next = self.scroll as i64 - ctx.input.wheel() as i64;
            self.scroll = next.clamp(0, max as i64) as usize;
        }

        for slot in 0..INV_SLOTS {
            let Some(slot_rect) = self.slot_rect(ctx.rc, area, slot) else {
                continue;
            };
            if ctx.input.take_left_click(slot_rect) {
                self.left_click(ctx, slot);
            }
            if ctx.input.take_right_click(slot_rect) {
                self.right_click(ctx, slot);
            }
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("inventory").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let module = ctx.module;
        let Some(c) = module.char(ctx.pc) else {
            return Ok(());
        };
        for slot in 0..INV_SLOTS {
            let Some(slot_rect) = self.slot_rect(ctx.rc, area, slot) else {
                continue;
            };
            let keys = self.stacks.slot(slot);
            let payload = match keys.first() {
                Some(key) => SlotPayload::Item(key.clone()),
                None => SlotPayload::Empty,
            };
            let dragged = ctx
                .drag
                .is_some_and(|d| d.source == DragSource::Inventory(slot));
            let fill = if dragged {
                SLOT_SELECTED
            } else if keys.iter().any(|k| c.equipment.equipped(k)) {
                SLOT_EQUIPPED
            } else {
                SLOT_BG
            };
            slot::draw_slot(ctx, slot_rect, &payload, fill, keys.len())?;
        }
        Ok(())
    }
}

/// Keys the dragged inventory slot holds, for the "remove items?" prompt.
pub fn dragged_keys(panel: &InventoryPanel, drag: &Drag) -> Option<Vec<String>> {
    match drag.source {
        DragSource::Inventory(slot) => {
            let keys = panel.stacks.slot(slot);
            (!keys.is_empty()).then(|| keys.to_vec())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::testing::{misc, pc, test_module};
    use mural_core::console::Console;
    use mural_core::types::{EffectTemplate, ItemKind, MiscData};

    fn items(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, i)| (k.to_string(), i.to_string()))
            .collect()
    }

    #[test]
    fn saved_slots_win_then_stacks_fill_up() {
        let mut layout = Layout::default();
        layout.save_inv_slot("sword1", 5);
        let stacks = Stacks::arrange(
            &items(&[("apple2", "apple"), ("sword1", "sword"), ("apple7", "apple")]),
            &layout,
        );
        assert_eq!(stacks.slot(5), ["sword1".to_string()]);
        assert_eq!(stacks.slot(0), ["apple2".to_string(), "apple7".to_string()]);
        assert!(stacks.slot(1).is_empty());
    }

    #[test]
    fn full_stacks_spill_into_empty_slots() {
        let pairs: Vec<(String, String)> = (0..STACK_MAX + 1)
            .map(|n| (format!("arrow{n}"), "arrow".to_string()))
            .collect();
        let stacks = Stacks::arrange(&pairs, &Layout::default());
        assert_eq!(stacks.slot(0).len(), STACK_MAX);
        assert_eq!(stacks.slot(1), ["arrow20".to_string()]);
    }

    #[test]
    fn shift_moves_single_items_of_the_same_id() {
        let mut stacks = Stacks::arrange(
            &items(&[("apple2", "apple"), ("apple7", "apple"), ("sword1", "sword")]),
            &Layout::default(),
        );
        assert!(stacks.move_one(0, 4));
        assert_eq!(stacks.slot(0).len(), 1);
        assert_eq!(stacks.slot(4), ["apple7".to_string()]);
        assert!(!stacks.move_one(1, 4));

        stacks.move_stack(1, 4);
        assert_eq!(stacks.slot(1), ["apple7".to_string()]);
        assert_eq!(stacks.slot(4), ["sword1".to_string()]);
    }

    #[test]
    fn refresh_writes_the_layout_back() {
        let module = test_module();
        let mut layout = Layout::default();
        let mut panel = InventoryPanel::new();
        panel.refresh(&module, &pc(), &mut layout);
        assert_eq!(layout.inv_slot_id("sword1"), 0);
        assert_eq!(layout.inv_slot_id("apple2"), 1);

        panel.stacks.move_stack(0, 9);
        panel.stacks.write_layout(&mut layout);
        panel.refresh(&module, &pc(), &mut layout);
        assert_eq!(panel.stacks().first(9), Some("sword1"));
    }

    #[test]
    fn right_click_uses_consumables() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let mut module = test_module();
        let mut potion = misc("potion", "8", 3);
        potion.kind = ItemKind::Misc(MiscData {
            consumable: true,
            use_effects: vec![EffectTemplate {
                id: "regen".into(),
                name: "Regeneration".into(),
                duration_ms: Some(1000),
                modifiers: Vec::new(),
            }],
        });
        module.char_mut(&pc()).unwrap().inventory.add_item(potion).unwrap();

        let mut layout = Layout::default();
        let mut panel = InventoryPanel::new();
        panel.show(&module, &pc(), &mut layout);
        let slot = layout.inv_slot_id("potion8") as usize;

        let rc = RenderContext::new(1920, 1080, false);
        let area = panel::content_rect(&rc, panel.rect(&rc));
        let target = panel.slot_rect(&rc, area, slot).unwrap();
        let mut input = InputState::new();
        input.click_at(target.center().x(), target.center().y(), true);
        let (mut drag, mut actions) = (None, Vec::new());
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
        assert!(!module.char(&pc).unwrap().inventory.contains("potion8"));
        assert!(panel.stacks().slot(slot).is_empty());
    }
}
