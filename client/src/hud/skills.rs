use mural_core::types::{Module, ObjectId};
use sdl2::rect::Rect;

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::layout::Layout;
use crate::render::{SLOT_BG, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, Panel, ScrollList};
use super::slot::{self, Drag, DragSource, SlotPayload};

/// Known skills of the active player character. Rows drag onto the menu
/// bar; right click uses the skill.
#[derive(Debug, Default)]
pub struct SkillsPanel {
    list: ScrollList,
    skills: Vec<String>,
}

impl SkillsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn reload(&mut self, module: &Module, pc: &ObjectId) {
        self.skills = module
            .char(pc)
            .map(|c| c.skills.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default();
    }
}

impl Panel for SkillsPanel {
    fn show(&mut self, module: &Module, pc: &ObjectId, _layout: &mut Layout) {
        self.list.reset();
        self.reload(module, pc);
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        // Trainings may add skills while the panel is open.
        self.reload(ctx.module, ctx.pc);
        let area = panel::content_rect(ctx.rc, rect);
        self.list.scroll(ctx.input, ctx.rc, area, self.skills.len());

        if let Some(row) = self.list.row_at(ctx.rc, area, ctx.input.mouse(), self.skills.len()) {
            let row_rect = self.list.row_rect(ctx.rc, area, row).unwrap_or(area);
            let payload = SlotPayload::Skill(self.skills[row].clone());
            if ctx.input.take_left_click(row_rect) {
                *ctx.drag = Some(Drag {
                    source: DragSource::Skills,
                    payload,
                });
            } else if ctx.input.take_right_click(row_rect) {
                slot::activate(ctx.game, ctx.module, ctx.pc, &payload);
            }
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("skills").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let module = ctx.module;
        let Some(c) = module.char(ctx.pc) else {
            return Ok(());
        };
        for row in self.list.visible(ctx.rc, area, self.skills.len()) {
            let Some(row_rect) = self.list.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let Some(skill) = c.skill(&self.skills[row]) else {
                continue;
            };
            let payload = SlotPayload::Skill(skill.id.clone());
            let icon_rect = Rect::new(
                row_rect.x(),
                row_rect.y() + 2,
                row_rect.height().saturating_sub(4).max(1),
                row_rect.height().saturating_sub(4).max(1),
            );
            let hovered = row_rect.contains_point(ctx.mouse);
            slot::draw_slot(ctx, icon_rect, &payload, if hovered { SLOT_SELECTED } else { SLOT_BG }, 0)?;
            let x = icon_rect.right() + ctx.rc.s(10);
            font_cache::draw_text(ctx.canvas, skill.display_name(), x, row_rect.y() + 4, TEXT_COLOR)?;
            let detail = format!(
                "{} {}  {} {:.1}s",
                ctx.i18n.text("mana"),
                skill.mana_cost,
                ctx.i18n.text("cooldown"),
                skill.cooldown_ms as f64 / 1000.0
            );
            font_cache::draw_text(ctx.canvas, &detail, x, row_rect.y() + 18, TEXT_DIM)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::render::RenderContext;
    use crate::testing::{pc, skill, test_module};
    use mural_core::console::Console;

    #[test]
    fn left_click_starts_a_skill_drag() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let mut module = test_module();
        module.char_mut(&pc()).unwrap().skills.push(skill("heal"));
        let mut layout = Layout::default();
        let mut panel = SkillsPanel::new();
        panel.show(&module, &pc(), &mut layout);

        let rc = RenderContext::new(1920, 1080, false);
        let area = panel::content_rect(&rc, panel.rect(&rc));
        let row = panel.list.row_rect(&rc, area, 0).unwrap();
        let mut input = InputState::new();
        input.click_at(row.center().x(), row.center().y(), false);
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
        assert_eq!(
            drag,
            Some(Drag {
                source: DragSource::Skills,
                payload: SlotPayload::Skill("heal".into()),
            })
        );
    }
}
