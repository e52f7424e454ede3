use mural_core::types::{Module, ObjectId, Quest};

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::i18n::I18n;
use crate::layout::Layout;
use crate::render::{self, SLOT_BG, SLOT_BORDER, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, Panel, ScrollList};

/// Text shown for a quest: the active stage info, followed by the
/// "completed" marker once the quest is done.
pub fn quest_text(quest: &Quest, i18n: &I18n) -> String {
    let info = quest.stage().map(|s| s.info.as_str()).unwrap_or_default();
    if quest.completed {
        format!("{} ({})", info, i18n.text("completed"))
    } else {
        info.to_string()
    }
}

/// Quests of the active player character. The list on the left selects
/// the quest whose text shows on the right.
#[derive(Debug, Default)]
pub struct JournalPanel {
    list: ScrollList,
    selected: usize,
}

impl JournalPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn quests(module: &Module, pc: &ObjectId) -> Vec<Quest> {
        module
            .char(pc)
            .map(|c| c.journal.clone())
            .unwrap_or_default()
    }
}

impl Panel for JournalPanel {
    fn show(&mut self, _module: &Module, _pc: &ObjectId, _layout: &mut Layout) {
        self.list.reset();
        self.selected = 0;
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let area = panel::content_rect(ctx.rc, rect);
        let list_area = sdl2::rect::Rect::new(area.x(), area.y(), area.width() / 3, area.height());
        let len = Self::quests(ctx.module, ctx.pc).len();
        self.list.scroll(ctx.input, ctx.rc, list_area, len);
        if let Some(row) = self.list.row_at(ctx.rc, list_area, ctx.input.mouse(), len) {
            if ctx.input.take_left_click(list_area) {
                self.selected = row;
            }
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("journal").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let list_area = sdl2::rect::Rect::new(area.x(), area.y(), area.width() / 3, area.height());
        let quests = Self::quests(ctx.module, ctx.pc);
        for row in self.list.visible(ctx.rc, list_area, quests.len()) {
            let Some(row_rect) = self.list.row_rect(ctx.rc, list_area, row) else {
                continue;
            };
            let fill = if row == self.selected { SLOT_SELECTED } else { SLOT_BG };
            render::draw_frame(ctx.canvas, row_rect, fill, SLOT_BORDER)?;
            let quest = &quests[row];
            let color = if quest.completed { TEXT_DIM } else { TEXT_COLOR };
            let y = row_rect.y() + (row_rect.height() as i32 - font_cache::LINE_H as i32) / 2;
            font_cache::draw_text(ctx.canvas, quest.display_name(), row_rect.x() + 6, y, color)?;
        }

        let Some(quest) = quests.get(self.selected) else {
            return Ok(());
        };
        let text_x = list_area.right() + ctx.rc.s(16);
        let width = (area.right() - text_x).max(1) as u32;
        let lines = font_cache::wrap_text(&quest_text(quest, ctx.i18n), font_cache::chars_fitting(width));
        font_cache::draw_lines(ctx.canvas, &lines, text_x, area.y(), 0, usize::MAX, TEXT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mural_core::types::QuestStage;

    fn quest(completed: bool) -> Quest {
        Quest {
            id: "wolves".into(),
            name: "Wolves".into(),
            stages: vec![QuestStage {
                id: "hunt".into(),
                info: "Hunt the wolf.".into(),
                completes: completed,
            }],
            active_stage: Some("hunt".into()),
            completed,
        }
    }

    #[test]
    fn completed_quests_are_marked() {
        let i18n = I18n::parse("completed:done;");
        assert_eq!(quest_text(&quest(false), &i18n), "Hunt the wolf.");
        assert_eq!(quest_text(&quest(true), &i18n), "Hunt the wolf. (done)");
    }
}
