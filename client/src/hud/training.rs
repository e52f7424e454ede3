use mural_core::types::{Module, ObjectId, UseAction, UseTarget};

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::layout::Layout;
use crate::render::{self, SLOT_BG, SLOT_BORDER, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, Panel, ScrollList};

/// Lessons offered by a trainer. "Train" makes the active player character
/// take the selected one.
#[derive(Debug, Default)]
pub struct TrainingPanel {
    trainer: Option<ObjectId>,
    list: ScrollList,
    selected: Option<usize>,
}

impl TrainingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, trainer: ObjectId) {
        self.trainer = Some(trainer);
        self.list.reset();
        self.selected = None;
    }

    pub fn select(&mut self, index: usize) {
        self.selected = Some(index);
    }

    fn trainings(&self, module: &Module) -> Vec<(String, String, String)> {
        self.trainer
            .as_ref()
            .and_then(|t| module.char(t))
            .map(|c| {
                c.trainings
                    .iter()
                    .map(|t| (t.id.clone(), t.display_name().to_string(), t.describe()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Trains the selected lesson.
    pub fn train(&mut self, ctx: &mut FrameCtx<'_>) {
        let Some(trainer) = self.trainer.clone() else {
            return;
        };
        let trainings = self.trainings(ctx.module);
        let Some((training, _, _)) = self.selected.and_then(|i| trainings.get(i)).cloned() else {
            return;
        };
        let action = UseAction::Training { trainer, training };
        if ctx
            .game
            .use_action(ctx.module, ctx.pc, action, UseTarget::Auto)
            .is_ok()
        {
            ctx.act(HudAction::RefreshInventory);
        }
    }
}

impl Panel for TrainingPanel {
    fn show(&mut self, _module: &Module, _pc: &ObjectId, _layout: &mut Layout) {
        self.list.reset();
        self.selected = None;
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let area = panel::content_rect(ctx.rc, rect);
        let len = self.trainings(ctx.module).len();
        self.list.scroll(ctx.input, ctx.rc, area, len);
        if let Some(row) = self.list.row_at(ctx.rc, area, ctx.input.mouse(), len) {
            if ctx.input.take_left_click(area) {
                self.select(row);
            }
        }
        if ctx.input.take_left_click(panel::button_rect(ctx.rc, rect, 0)) {
            ctx.act(HudAction::Click);
            self.train(ctx);
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("training").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let trainings = self.trainings(ctx.module);
        for row in self.list.visible(ctx.rc, area, trainings.len()) {
            let Some(row_rect) = self.list.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let fill = if self.selected == Some(row) { SLOT_SELECTED } else { SLOT_BG };
            render::draw_frame(ctx.canvas, row_rect, fill, SLOT_BORDER)?;
            let (_, name, describe) = &trainings[row];
            font_cache::draw_text(ctx.canvas, name, row_rect.x() + 6, row_rect.y() + 4, TEXT_COLOR)?;
            font_cache::draw_text(ctx.canvas, describe, row_rect.x() + 6, row_rect.y() + 18, TEXT_DIM)?;
        }
        let label = ctx.i18n.text("train").to_string();
        panel::draw_button(ctx, panel::button_rect(ctx.rc, rect, 0), &label, self.selected.is_some())
    }
}
