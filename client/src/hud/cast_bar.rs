use mural_core::types::{Cast, Character, UseAction};
use sdl2::rect::Rect;

use crate::area::avatar::Avatar;
use crate::font_cache::{self, TEXT_COLOR};
use crate::render::{self, CAST_COLOR, RenderContext};

use super::panel::{DrawCtx, FrameCtx};

const BAR_W: u32 = 320;
const BAR_H: u32 = 18;

pub fn bar_rect(rc: &RenderContext) -> Rect {
    let w = rc.su(BAR_W);
    let h = rc.su(BAR_H);
    let center = rc.center();
    Rect::new(center.x() - w as i32 / 2, center.y() + rc.s(120), w, h)
}

/// Name of what is being cast, as the character knows it.
pub fn cast_name(c: &Character, cast: &Cast) -> String {
    match &cast.action {
        UseAction::Skill(id) => c.skill(id).map(|s| s.display_name()).unwrap_or(id).to_string(),
        UseAction::Recipe(id) => c.recipe(id).map(|r| r.display_name()).unwrap_or(id).to_string(),
        UseAction::Item(key) => key.clone(),
        UseAction::Hit => String::new(),
        UseAction::Training { training, .. } => training.clone(),
    }
}

/// Swallows clicks on the bar while a cast is running.
pub fn update(ctx: &mut FrameCtx<'_>) {
    let casting = ctx.module.char(ctx.pc).is_some_and(|c| c.cast.is_some());
    if casting {
        ctx.input.block(bar_rect(ctx.rc));
    }
}

/// Progress of the active player character's cast; nothing while idle.
/// Skill casts show the skill icon left of the bar.
pub fn draw(ctx: &mut DrawCtx<'_>, avatar: Option<&Avatar>) -> Result<(), String> {
    let module = ctx.module;
    let Some(c) = module.char(ctx.pc) else {
        return Ok(());
    };
    let Some(cast) = &c.cast else {
        return Ok(());
    };
    let rect = bar_rect(ctx.rc);
    let icon = match (&cast.action, avatar) {
        (UseAction::Skill(id), Some(avatar)) => avatar.skill_icon(id).map(str::to_string),
        _ => None,
    };
    if let Some(icon) = icon {
        let size = rect.height() + ctx.rc.su(6);
        let dst = Rect::new(
            rect.x() - size as i32 - ctx.rc.s(6),
            rect.center().y() - size as i32 / 2,
            size,
            size,
        );
        let texture = ctx.assets.icon(&icon);
        render::draw_texture(ctx.canvas, texture, None, dst)?;
    }
    render::draw_bar(ctx.canvas, rect, cast.elapsed_ms as i64, cast.cast_ms as i64, CAST_COLOR)?;
    font_cache::draw_text_centered(
        ctx.canvas,
        &cast_name(c, cast),
        rect.x() + rect.width() as i32 / 2,
        rect.y() + (rect.height() as i32 - font_cache::LINE_H as i32) / 2 + 2,
        TEXT_COLOR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pc, skill, test_module};

    #[test]
    fn casts_are_named_after_the_skill() {
        let mut module = test_module();
        let c = module.char_mut(&pc()).unwrap();
        let mut heal = skill("heal");
        heal.name = "Heal".into();
        c.skills.push(heal);
        let cast = Cast {
            action: UseAction::Skill("heal".into()),
            target: None,
            elapsed_ms: 200,
            cast_ms: 1000,
        };
        assert_eq!(cast_name(c, &cast), "Heal");
        let unknown = Cast {
            action: UseAction::Recipe("pie".into()),
            ..cast
        };
        assert_eq!(cast_name(c, &unknown), "pie");
    }

    #[test]
    fn bar_sits_below_the_center() {
        let rc = RenderContext::new(1920, 1080, false);
        let rect = bar_rect(&rc);
        assert_eq!(rect.center().x(), rc.center().x());
        assert!(rect.y() > rc.center().y());
    }
}
