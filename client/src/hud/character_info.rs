use mural_core::traits::Attribute;
use mural_core::types::Character;

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::i18n::I18n;

use super::panel::{self, DrawCtx, FrameCtx, Panel};

/// Label/value rows describing `c`.
pub fn summary(c: &Character, i18n: &I18n) -> Vec<(String, String)> {
    let mut rows = vec![
        (i18n.text("name").to_string(), c.display_name().to_string()),
        (i18n.text("level").to_string(), c.level.to_string()),
        (i18n.text("experience").to_string(), c.experience.to_string()),
        (i18n.text("gender").to_string(), c.gender.to_string()),
        (i18n.text("race").to_string(), c.race.to_string()),
        (i18n.text("alignment").to_string(), c.alignment.to_string()),
        (
            i18n.text("health").to_string(),
            format!("{}/{}", c.health, c.max_health),
        ),
        (i18n.text("mana").to_string(), format!("{}/{}", c.mana, c.max_mana)),
    ];
    for attribute in Attribute::ALL {
        rows.push((
            i18n.text(attribute.short_name()).to_string(),
            c.attributes.get(attribute).to_string(),
        ));
    }
    rows
}

/// Read-only summary of the active player character.
#[derive(Debug, Default)]
pub struct CharacterInfoPanel;

impl CharacterInfoPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Panel for CharacterInfoPanel {
    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if !panel::frame_input(ctx, rect) {
            ctx.input.block(rect);
        }
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("character").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let Some(c) = ctx.module.char(ctx.pc) else {
            return Ok(());
        };
        let area = panel::content_rect(ctx.rc, rect);
        let value_x = area.x() + area.width() as i32 / 3;
        let step = ctx.rc.s(font_cache::LINE_H as i32 + 6);
        for (row, (label, value)) in summary(c, ctx.i18n).iter().enumerate() {
            let y = area.y() + row as i32 * step;
            font_cache::draw_text(ctx.canvas, label, area.x(), y, TEXT_DIM)?;
            font_cache::draw_text(ctx.canvas, value, value_x, y, TEXT_COLOR)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pc, test_module};

    #[test]
    fn summary_lists_attributes() {
        let module = test_module();
        let c = module.char(&pc()).unwrap();
        let rows = summary(c, &I18n::default());
        assert_eq!(rows[0], ("name".to_string(), "Hero".to_string()));
        assert_eq!(rows.len(), 8 + Attribute::ALL.len());
        let strength = Attribute::Strength.short_name().to_string();
        assert!(rows.iter().any(|(label, _)| *label == strength));
    }
}
