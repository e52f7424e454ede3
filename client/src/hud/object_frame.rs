//! Portrait frames of the active player character and of its target.

use mural_core::types::{Character, Effect, ObjectId};
use sdl2::rect::Rect;

use crate::area::avatar::Avatar;
use crate::font_cache::{self, TEXT_COLOR};
use crate::render::{self, HEALTH_COLOR, MANA_COLOR, PANEL_BG, PANEL_BORDER, RenderContext};

use super::panel::{DrawCtx, FrameCtx};

const FRAME_W: u32 = 260;
const FRAME_H: u32 = 96;
const PORTRAIT: u32 = 80;
const EFFECT_ICON: u32 = 24;
/// Effect icons per row under the frame.
pub const EFFECTS_PER_ROW: usize = 3;

/// Which frame to draw: the player's sits in the top-left corner, the
/// target's right of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSlot {
    Player,
    Target,
}

pub fn frame_rect(rc: &RenderContext, slot: FrameSlot) -> Rect {
    let margin = rc.s(10);
    let x = match slot {
        FrameSlot::Player => margin,
        FrameSlot::Target => margin * 2 + rc.s(FRAME_W as i32),
    };
    Rect::new(x, margin, rc.su(FRAME_W), rc.su(FRAME_H))
}

/// Where effect icon `index` goes below a frame.
pub fn effect_rect(rc: &RenderContext, frame: Rect, index: usize) -> Rect {
    let size = rc.su(EFFECT_ICON);
    let step = size as i32 + rc.s(4);
    Rect::new(
        frame.x() + (index % EFFECTS_PER_ROW) as i32 * step,
        frame.bottom() + rc.s(4) + (index / EFFECTS_PER_ROW) as i32 * step,
        size,
        size,
    )
}

/// Seconds printed on an effect icon; none for effects without an end.
pub fn effect_label(effect: &Effect) -> Option<String> {
    if effect.is_infinite() {
        return None;
    }
    effect.remaining_secs().map(|s| s.to_string())
}

/// Keeps clicks on the frame of `oid` and on its effect icons out of the
/// world.
pub fn update(ctx: &mut FrameCtx<'_>, oid: &ObjectId, slot: FrameSlot) {
    let Some(c) = ctx.module.char(oid) else {
        return;
    };
    let effects = c.effects.len();
    let rect = frame_rect(ctx.rc, slot);
    ctx.input.block(rect);
    for index in 0..effects {
        ctx.input.block(effect_rect(ctx.rc, rect, index));
    }
}

/// Draws the frame of `oid`. Effect icons come from its avatar when it is in
/// the current area.
pub fn draw_frame(
    ctx: &mut DrawCtx<'_>,
    oid: &ObjectId,
    slot: FrameSlot,
    avatar: Option<&Avatar>,
) -> Result<(), String> {
    let module = ctx.module;
    let Some(c) = module.char(oid) else {
        return Ok(());
    };
    let rect = frame_rect(ctx.rc, slot);
    render::draw_frame(ctx.canvas, rect, PANEL_BG, PANEL_BORDER)?;

    let pad = ctx.rc.s(8);
    let portrait = Rect::new(rect.x() + pad, rect.y() + pad, ctx.rc.su(PORTRAIT), ctx.rc.su(PORTRAIT));
    draw_portrait(ctx, c, portrait)?;

    let x = portrait.right() + pad;
    let width = (rect.right() - x - pad).max(1) as u32;
    font_cache::draw_text(ctx.canvas, c.display_name(), x, rect.y() + pad, TEXT_COLOR)?;
    let bar_h = ctx.rc.su(14);
    let health = Rect::new(x, rect.y() + ctx.rc.s(30), width, bar_h);
    render::draw_bar(ctx.canvas, health, c.health as i64, c.max_health as i64, HEALTH_COLOR)?;
    let mana = Rect::new(x, health.bottom() + ctx.rc.s(6), width, bar_h);
    render::draw_bar(ctx.canvas, mana, c.mana as i64, c.max_mana as i64, MANA_COLOR)?;
    let level = format!("{} {}", ctx.i18n.text("level"), c.level);
    font_cache::draw_text(ctx.canvas, &level, x, mana.bottom() + ctx.rc.s(6), TEXT_COLOR)?;

    for (index, effect) in c.effects.iter().enumerate() {
        let icon_rect = effect_rect(ctx.rc, rect, index);
        let icon = match avatar.and_then(|a| a.effect_icon(&effect.id)) {
            Some(icon) => icon.to_string(),
            None => ctx.assets.bindings.effect(&effect.id).icon.clone(),
        };
        let texture = ctx.assets.icon(&icon);
        render::draw_texture(ctx.canvas, texture, None, icon_rect)?;
        if let Some(label) = effect_label(effect) {
            font_cache::draw_text(
                ctx.canvas,
                &label,
                icon_rect.x() + 2,
                icon_rect.bottom() - font_cache::LINE_H as i32,
                TEXT_COLOR,
            )?;
        }
    }
    Ok(())
}

fn draw_portrait(ctx: &mut DrawCtx<'_>, c: &Character, rect: Rect) -> Result<(), String> {
    let name = ctx.assets.bindings.avatar(&c.id).portrait.clone();
    match name {
        Some(name) => {
            let texture = ctx.assets.portrait(&name);
            render::draw_texture(ctx.canvas, texture, None, rect)
        }
        None => render::draw_frame(ctx.canvas, rect, render::SLOT_BG, render::SLOT_BORDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mural_core::types::EffectTemplate;

    fn effect(duration_ms: Option<u64>) -> Effect {
        let template = EffectTemplate {
            id: "regen".into(),
            name: "Regeneration".into(),
            duration_ms,
            modifiers: Vec::new(),
        };
        Effect::from_template(&template, "1".into(), None)
    }

    #[test]
    fn timed_effects_show_seconds_left() {
        assert_eq!(effect_label(&effect(Some(2500))).as_deref(), Some("3"));
        assert_eq!(effect_label(&effect(None)), None);
    }

    #[test]
    fn effect_icons_wrap_after_three() {
        let rc = RenderContext::new(1920, 1080, false);
        let frame = frame_rect(&rc, FrameSlot::Player);
        let first = effect_rect(&rc, frame, 0);
        let fourth = effect_rect(&rc, frame, EFFECTS_PER_ROW);
        assert_eq!(first.x(), fourth.x());
        assert!(fourth.y() > first.y());
        assert!(frame_rect(&rc, FrameSlot::Target).x() > frame.right());
    }
}
