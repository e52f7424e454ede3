//! Action bar at the bottom of the screen: ten slots bound to items or
//! skills, plus buttons opening the main panels.

use mural_core::types::{Module, ObjectId};
use sdl2::keyboard::Keycode;
use sdl2::rect::Rect;

use crate::font_cache::{self, TEXT_DIM};
use crate::layout::{BAR_SLOTS, Layout};
use crate::render::{self, PANEL_BG, PANEL_BORDER, RenderContext, SLOT_BG, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, PanelId};
use super::slot::{self, Drag, DragSource, SlotPayload};

const SLOT_SIZE: u32 = 56;
const SLOT_GAP: u32 = 4;
const BUTTON_SIZE: u32 = 44;

const SLOT_KEYS: [Keycode; BAR_SLOTS] = [
    Keycode::Num1,
    Keycode::Num2,
    Keycode::Num3,
    Keycode::Num4,
    Keycode::Num5,
    Keycode::Num6,
    Keycode::Num7,
    Keycode::Num8,
    Keycode::Num9,
    Keycode::Num0,
];

const BUTTONS: [(PanelId, &str); 5] = [
    (PanelId::Menu, "menu"),
    (PanelId::Inventory, "inventory"),
    (PanelId::Skills, "skills"),
    (PanelId::Journal, "journal"),
    (PanelId::CharacterInfo, "character"),
];

#[derive(Debug, Default)]
pub struct MenuBar {
    locked: bool,
}

impl MenuBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A locked bar takes no input.
    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn rect(rc: &RenderContext) -> Rect {
        let w = BAR_SLOTS as u32 * (SLOT_SIZE + SLOT_GAP)
            + BUTTONS.len() as u32 * (BUTTON_SIZE + SLOT_GAP)
            + SLOT_GAP * 2;
        let h = SLOT_SIZE + SLOT_GAP * 2;
        let (w, h) = (rc.su(w), rc.su(h));
        Rect::new(
            (rc.width as i32 - w as i32) / 2,
            rc.height as i32 - h as i32 - rc.s(8),
            w,
            h,
        )
    }

    pub fn slot_rect(rc: &RenderContext, index: usize) -> Rect {
        let bar = Self::rect(rc);
        let step = rc.s((SLOT_SIZE + SLOT_GAP) as i32);
        Rect::new(
            bar.x() + rc.s(SLOT_GAP as i32) + index as i32 * step,
            bar.y() + rc.s(SLOT_GAP as i32),
            rc.su(SLOT_SIZE),
            rc.su(SLOT_SIZE),
        )
    }

    fn button_rect(rc: &RenderContext, index: usize) -> Rect {
        let last_slot = Self::slot_rect(rc, BAR_SLOTS - 1);
        let step = rc.s((BUTTON_SIZE + SLOT_GAP) as i32);
        Rect::new(
            last_slot.right() + rc.s(SLOT_GAP as i32 * 2) + index as i32 * step,
            last_slot.y() + rc.s(((SLOT_SIZE - BUTTON_SIZE) / 2) as i32),
            rc.su(BUTTON_SIZE),
            rc.su(BUTTON_SIZE),
        )
    }

    /// Payload of bar slot `index` for the active player character.
    pub fn payload(module: &Module, pc: &ObjectId, layout: &Layout, index: usize) -> SlotPayload {
        match (module.char(pc), layout.bar_content(index)) {
            (Some(c), Some(key)) => SlotPayload::resolve(c, key),
            _ => SlotPayload::Empty,
        }
    }

    fn drop_on(ctx: &mut FrameCtx<'_>, index: usize, drag: Drag) {
        match drag.source {
            DragSource::Bar(from) if from != index => {
                let target = ctx.layout.bar_content(index).map(str::to_string);
                if let Some(key) = drag.payload.key() {
                    ctx.layout.save_bar_slot(key, index as i32);
                }
                match target {
                    Some(key) => {
                        ctx.layout.save_bar_slot(&key, from as i32);
                    }
                    None => ctx.layout.clear_bar_slot(from),
                }
            }
            DragSource::Bar(_) => {}
            DragSource::Inventory(_) | DragSource::Skills => {
                if let Some(key) = drag.payload.key() {
                    ctx.layout.save_bar_slot(key, index as i32);
                }
            }
        }
    }

    pub fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        if self.locked {
            return;
        }
        for (index, key) in SLOT_KEYS.iter().enumerate() {
            if ctx.input.take_key(*key) {
                let payload = Self::payload(ctx.module, ctx.pc, ctx.layout, index);
                slot::activate(ctx.game, ctx.module, ctx.pc, &payload);
                ctx.act(HudAction::RefreshInventory);
            }
        }

        for index in 0..BAR_SLOTS {
            let rect = Self::slot_rect(ctx.rc, index);
            if ctx.input.take_left_click(rect) {
                match ctx.drag.take() {
                    Some(drag) => Self::drop_on(ctx, index, drag),
                    None => {
                        let payload = Self::payload(ctx.module, ctx.pc, ctx.layout, index);
                        slot::activate(ctx.game, ctx.module, ctx.pc, &payload);
                        ctx.act(HudAction::RefreshInventory);
                    }
                }
            }
            if ctx.input.take_right_click(rect) {
                let payload = Self::payload(ctx.module, ctx.pc, ctx.layout, index);
                if !payload.is_empty() {
                    *ctx.drag = Some(Drag {
                        source: DragSource::Bar(index),
                        payload,
                    });
                }
            }
        }

        for (index, (id, _)) in BUTTONS.iter().enumerate() {
            if ctx.input.take_left_click(Self::button_rect(ctx.rc, index)) {
                ctx.act(HudAction::Click);
                ctx.act(HudAction::Toggle(*id));
            }
        }
        ctx.input.block(Self::rect(ctx.rc));
    }

    pub fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let bar = Self::rect(ctx.rc);
        render::draw_frame(ctx.canvas, bar, PANEL_BG, PANEL_BORDER)?;
        for index in 0..BAR_SLOTS {
            let rect = Self::slot_rect(ctx.rc, index);
            let payload = match ctx.layout {
                Some(layout) => Self::payload(ctx.module, ctx.pc, layout, index),
                None => SlotPayload::Empty,
            };
            let dragged = ctx
                .drag
                .is_some_and(|d| d.source == DragSource::Bar(index));
            let fill = if dragged { SLOT_SELECTED } else { SLOT_BG };
            slot::draw_slot(ctx, rect, &payload, fill, 0)?;
            let label = if index == BAR_SLOTS - 1 { 0 } else { index + 1 };
            font_cache::draw_text(
                ctx.canvas,
                &label.to_string(),
                rect.right() - 10,
                rect.y() + 3,
                TEXT_DIM,
            )?;
        }
        for (index, (_, label)) in BUTTONS.iter().enumerate() {
            let rect = Self::button_rect(ctx.rc, index);
            let text = ctx.i18n.text(label).chars().take(4).collect::<String>();
            panel::draw_button(ctx, rect, &text, !self.locked)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::testing::{pc, test_module};
    use mural_core::console::Console;

    struct Fixture {
        game: Game,
        module: Module,
        input: InputState,
        rc: RenderContext,
        layout: Layout,
        drag: Option<Drag>,
        actions: Vec<HudAction>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                game: Game::new(mural_core::share(test_module()), Console::new()),
                module: test_module(),
                input: InputState::new(),
                rc: RenderContext::new(1920, 1080, false),
                layout: Layout::default(),
                drag: None,
                actions: Vec::new(),
            }
        }

        fn click(&mut self, rect: Rect, right: bool) {
            self.input.begin_frame();
            self.input.click_at(rect.center().x(), rect.center().y(), right);
        }

        fn update(&mut self, bar: &mut MenuBar) {
            let pc = pc();
            let mut ctx = FrameCtx {
                game: &self.game,
                module: &mut self.module,
                pc: &pc,
                input: &mut self.input,
                rc: &self.rc,
                layout: &mut self.layout,
                drag: &mut self.drag,
                actions: &mut self.actions,
            };
            bar.update(&mut ctx);
        }
    }

    #[test]
    fn dropping_from_inventory_copies_into_the_slot() {
        let mut f = Fixture::new();
        let mut bar = MenuBar::new();
        f.drag = Some(Drag {
            source: DragSource::Inventory(4),
            payload: SlotPayload::Item("apple2".into()),
        });
        f.click(MenuBar::slot_rect(&f.rc, 2), false);
        f.update(&mut bar);
        assert_eq!(f.layout.bar_content(2), Some("apple2"));
        assert!(f.drag.is_none());
    }

    #[test]
    fn dragging_between_slots_swaps_them() {
        let mut f = Fixture::new();
        let mut bar = MenuBar::new();
        f.layout.save_bar_slot("sword1", 0);
        f.layout.save_bar_slot("apple2", 1);

        f.click(MenuBar::slot_rect(&f.rc, 0), true);
        f.update(&mut bar);
        assert_eq!(f.drag.as_ref().unwrap().source, DragSource::Bar(0));

        f.click(MenuBar::slot_rect(&f.rc, 1), false);
        f.update(&mut bar);
        assert_eq!(f.layout.bar_content(0), Some("apple2"));
        assert_eq!(f.layout.bar_content(1), Some("sword1"));
    }

    #[test]
    fn slot_key_fires_the_action_unless_locked() {
        let mut f = Fixture::new();
        let mut bar = MenuBar::new();
        f.layout.save_bar_slot("sword1", 0);

        bar.lock(true);
        f.input.press_key(Keycode::Num1, false);
        f.update(&mut bar);
        assert!(f.module.char(&pc()).unwrap().equipment.equipped("sword1"));

        bar.lock(false);
        f.update(&mut bar);
        assert!(!f.module.char(&pc()).unwrap().equipment.equipped("sword1"));
    }

    #[test]
    fn unknown_keys_render_as_empty_slots() {
        let f = Fixture::new();
        let mut layout = Layout::default();
        layout.save_bar_slot("gem3", 3);
        assert_eq!(MenuBar::payload(&f.module, &pc(), &layout, 3), SlotPayload::Empty);
    }

    #[test]
    fn buttons_toggle_panels() {
        let mut f = Fixture::new();
        let mut bar = MenuBar::new();
        f.click(MenuBar::button_rect(&f.rc, 1), false);
        f.update(&mut bar);
        assert!(f.actions.contains(&HudAction::Toggle(PanelId::Inventory)));
    }
}
