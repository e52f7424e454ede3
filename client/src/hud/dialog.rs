//! Dialog window: the current node text of a conversation and the answers
//! the active player character may give.

use mural_core::types::{Module, ObjectId};

use crate::font_cache::{self, TEXT_COLOR};
use crate::render::{self, SLOT_BG, SLOT_BORDER, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, Panel, ScrollList};

/// Conversation with a non-player character. `owner` holds the dialog, the
/// active player character answers.
#[derive(Debug, Default)]
pub struct DialogPanel {
    owner: Option<ObjectId>,
    answers: ScrollList,
}

impl DialogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, owner: ObjectId) {
        self.owner = Some(owner);
        self.answers.reset();
    }

    pub fn owner(&self) -> Option<&ObjectId> {
        self.owner.as_ref()
    }

    /// Stage text and `(id, text)` of the answers `pc` may give.
    fn state(&self, module: &Module, pc: &ObjectId) -> Option<(String, Vec<(String, String)>)> {
        let owner = self.owner.as_ref()?;
        let dialog = module.active_dialog(owner, pc)?;
        let talker = module.char(pc)?;
        let text = dialog.stage().map(|s| s.text.clone()).unwrap_or_default();
        let answers = dialog
            .answers_for(talker)
            .into_iter()
            .map(|a| (a.id.clone(), a.text.clone()))
            .collect();
        Some((text, answers))
    }

    /// Gives answer `answer_id` and follows where the dialog leads: trading
    /// and training open their panels with the owner, a finished dialog
    /// closes.
    pub fn answer(&mut self, ctx: &mut FrameCtx<'_>, answer_id: &str) {
        let Some(owner) = self.owner.clone() else {
            return;
        };
        if let Err(err) = ctx.game.answer_dialog(ctx.module, &owner, ctx.pc, answer_id) {
            log::warn!("{err:#}");
            return;
        }
        self.answers.reset();
        let Some(dialog) = ctx.module.active_dialog(&owner, ctx.pc) else {
            ctx.act(HudAction::Close);
            return;
        };
        let (trading, training, finished) = (dialog.trading, dialog.training, dialog.finished);
        if trading {
            ctx.act(HudAction::Trade(owner));
        } else if training {
            ctx.act(HudAction::Train(owner));
        } else if finished {
            ctx.act(HudAction::Close);
        }
    }
}

impl Panel for DialogPanel {
    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let Some((_, answers)) = self.state(ctx.module, ctx.pc) else {
            ctx.act(HudAction::Close);
            return;
        };
        let area = answers_rect(ctx.rc, rect);
        self.answers.scroll(ctx.input, ctx.rc, area, answers.len());
        if let Some(row) = self.answers.row_at(ctx.rc, area, ctx.input.mouse(), answers.len()) {
            if ctx.input.take_left_click(area) {
                ctx.act(HudAction::Click);
                let answer_id = answers[row].0.clone();
                self.answer(ctx, &answer_id);
            }
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let module = ctx.module;
        let title = self
            .owner
            .as_ref()
            .and_then(|o| module.char(o))
            .map(|c| c.display_name().to_string())
            .unwrap_or_default();
        panel::draw_panel(ctx, rect, &title)?;
        let Some((text, answers)) = self.state(module, ctx.pc) else {
            return Ok(());
        };
        let content = panel::content_rect(ctx.rc, rect);
        let lines = font_cache::wrap_text(&text, font_cache::chars_fitting(content.width()));
        let area = answers_rect(ctx.rc, rect);
        let max_lines = ((area.y() - content.y()) / font_cache::LINE_H as i32).max(1) as usize;
        font_cache::draw_lines(ctx.canvas, &lines, content.x(), content.y(), 0, max_lines, TEXT_COLOR)?;

        for row in self.answers.visible(ctx.rc, area, answers.len()) {
            let Some(row_rect) = self.answers.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let fill = if row_rect.contains_point(ctx.mouse) { SLOT_SELECTED } else { SLOT_BG };
            render::draw_frame(ctx.canvas, row_rect, fill, SLOT_BORDER)?;
            let line = format!("{}. {}", row + 1, answers[row].1);
            let y = row_rect.y() + (row_rect.height() as i32 - font_cache::LINE_H as i32) / 2;
            font_cache::draw_text(ctx.canvas, &line, row_rect.x() + 6, y, TEXT_COLOR)?;
        }
        Ok(())
    }
}

/// Lower half of the content area, where the answers are listed.
fn answers_rect(rc: &render::RenderContext, panel: sdl2::rect::Rect) -> sdl2::rect::Rect {
    let content = panel::content_rect(rc, panel);
    let half = content.height() / 2;
    sdl2::rect::Rect::new(content.x(), content.y() + half as i32, content.width(), content.height() - half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::layout::Layout;
    use crate::render::RenderContext;
    use crate::testing::{merchant, pc, test_module};
    use mural_core::console::Console;

    fn answer(panel: &mut DialogPanel, module: &mut Module, answer_id: &str) -> Vec<HudAction> {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let rc = RenderContext::new(1920, 1080, false);
        let mut input = InputState::new();
        let (mut layout, mut drag, mut actions) = (Layout::default(), None, Vec::new());
        let pc = pc();
        let mut ctx = FrameCtx {
            game: &game,
            module,
            pc: &pc,
            input: &mut input,
            rc: &rc,
            layout: &mut layout,
            drag: &mut drag,
            actions: &mut actions,
        };
        panel.answer(&mut ctx, answer_id);
        actions
    }

    #[test]
    fn trading_answer_opens_trade() {
        let mut module = test_module();
        module.start_dialog(&merchant(), &pc(), "merchant").unwrap();
        let mut panel = DialogPanel::new();
        panel.open(merchant());
        let (text, answers) = panel.state(&module, &pc()).unwrap();
        assert_eq!(text, "Welcome!");
        assert_eq!(answers.len(), 2);

        let actions = answer(&mut panel, &mut module, "buy");
        assert_eq!(actions, [HudAction::Trade(merchant())]);
    }

    #[test]
    fn farewell_closes_the_window() {
        let mut module = test_module();
        module.start_dialog(&merchant(), &pc(), "merchant").unwrap();
        let mut panel = DialogPanel::new();
        panel.open(merchant());
        let actions = answer(&mut panel, &mut module, "bye");
        assert_eq!(actions, [HudAction::Close]);
    }
}
