//! Pieces shared by every HUD panel: the per-frame contexts, the common
//! panel frame (background, title, close button, action buttons) and a
//! scrollable row list.

use std::ops::Range;

use mural_core::types::{Module, ObjectId};
use sdl2::rect::{Point, Rect};
use sdl2::render::Canvas;
use sdl2::video::Window;

use crate::assets::AssetRegistry;
use crate::font_cache::{self, LINE_H, TEXT_COLOR, TEXT_DIM};
use crate::game::Game;
use crate::i18n::I18n;
use crate::input::InputState;
use crate::layout::Layout;
use crate::render::{self, PANEL_BG, PANEL_BORDER, RenderContext, SLOT_BG, SLOT_BORDER};

use super::message_queue::Message;
use super::slot::Drag;

/// Reference size of the modal panels.
pub const PANEL_W: u32 = 640;
pub const PANEL_H: u32 = 480;
/// Reference height of one row in a panel list.
pub const ROW_H: u32 = 36;
const BUTTON_W: u32 = 140;
const BUTTON_H: u32 = 32;
const BACKGROUND: &str = "panel.png";

/// The modal panels; at most one is open at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelId {
    Menu,
    SaveMenu,
    LoadMenu,
    Inventory,
    Skills,
    Loot,
    Dialog,
    Journal,
    Crafting,
    CharacterInfo,
    Trade,
    Training,
}

impl PanelId {
    /// Panels drawn with egui. While one is open the menu bar takes no
    /// input.
    pub fn is_menu(&self) -> bool {
        matches!(self, PanelId::Menu | PanelId::SaveMenu | PanelId::LoadMenu)
    }
}

/// Requests panels raise for the HUD root to carry out once every panel
/// has updated.
#[derive(Clone, Debug, PartialEq)]
pub enum HudAction {
    Toggle(PanelId),
    Open(PanelId),
    /// Closes the open modal panel.
    Close,
    Loot(ObjectId),
    Talk(ObjectId),
    Trade(ObjectId),
    Train(ObjectId),
    Message(Message),
    /// Console line run locally once the module lock is released.
    Console(String),
    Script { name: String, args: Vec<String> },
    Save(String),
    Load(String),
    RefreshInventory,
    Exit,
    Click,
}

/// Everything a panel may read or change while updating.
pub struct FrameCtx<'a> {
    pub game: &'a Game,
    pub module: &'a mut Module,
    pub pc: &'a ObjectId,
    pub input: &'a mut InputState,
    pub rc: &'a RenderContext,
    pub layout: &'a mut Layout,
    pub drag: &'a mut Option<Drag>,
    pub actions: &'a mut Vec<HudAction>,
}

impl FrameCtx<'_> {
    pub fn act(&mut self, action: HudAction) {
        self.actions.push(action);
    }
}

/// Everything a panel may read while drawing.
pub struct DrawCtx<'a> {
    pub canvas: &'a mut Canvas<Window>,
    pub assets: &'a mut AssetRegistry,
    pub module: &'a Module,
    pub pc: &'a ObjectId,
    pub rc: &'a RenderContext,
    pub i18n: &'a I18n,
    pub layout: Option<&'a Layout>,
    pub drag: Option<&'a Drag>,
    pub mouse: Point,
}

/// Contract of the sprite-drawn panels.
pub trait Panel {
    fn rect(&self, rc: &RenderContext) -> Rect {
        panel_rect(rc)
    }

    /// Reloads the panel content when it opens.
    fn show(&mut self, _module: &Module, _pc: &ObjectId, _layout: &mut Layout) {}

    fn update(&mut self, ctx: &mut FrameCtx<'_>);

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String>;
}

pub fn panel_rect(rc: &RenderContext) -> Rect {
    rc.centered(PANEL_W, PANEL_H)
}

pub fn close_rect(rc: &RenderContext, panel: Rect) -> Rect {
    let size = rc.su(24);
    Rect::new(
        panel.right() - size as i32 - rc.s(6),
        panel.y() + rc.s(6),
        size,
        size,
    )
}

/// Area between the title and the button row.
pub fn content_rect(rc: &RenderContext, panel: Rect) -> Rect {
    Rect::new(
        panel.x() + rc.s(16),
        panel.y() + rc.s(40),
        panel.width().saturating_sub(rc.su(32)).max(1),
        panel.height().saturating_sub(rc.su(96)).max(1),
    )
}

/// Action button `index`, counted from the bottom-right corner.
pub fn button_rect(rc: &RenderContext, panel: Rect, index: i32) -> Rect {
    let w = rc.su(BUTTON_W);
    let h = rc.su(BUTTON_H);
    let gap = rc.s(10);
    Rect::new(
        panel.right() - (index + 1) * (w as i32 + gap) - rc.s(6),
        panel.bottom() - h as i32 - rc.s(12),
        w,
        h,
    )
}

/// Handles the close button and keeps every other click on the panel away
/// from the world. Returns `true` when the close button was hit.
pub fn frame_input(ctx: &mut FrameCtx<'_>, panel: Rect) -> bool {
    if ctx.input.take_left_click(close_rect(ctx.rc, panel)) {
        ctx.act(HudAction::Click);
        ctx.act(HudAction::Close);
        return true;
    }
    false
}

pub fn draw_panel(ctx: &mut DrawCtx<'_>, panel: Rect, title: &str) -> Result<(), String> {
    match ctx.assets.texture(BACKGROUND) {
        Some(texture) => ctx.canvas.copy(texture, None, panel)?,
        None => render::draw_frame(ctx.canvas, panel, PANEL_BG, PANEL_BORDER)?,
    }
    font_cache::draw_text_centered(
        ctx.canvas,
        title,
        panel.x() + panel.width() as i32 / 2,
        panel.y() + ctx.rc.s(14),
        TEXT_COLOR,
    )?;
    let close = close_rect(ctx.rc, panel);
    render::draw_frame(ctx.canvas, close, SLOT_BG, SLOT_BORDER)?;
    font_cache::draw_text_centered(
        ctx.canvas,
        "x",
        close.x() + close.width() as i32 / 2,
        close.y() + (close.height() as i32 - LINE_H as i32) / 2 + 2,
        TEXT_COLOR,
    )
}

pub fn draw_button(
    ctx: &mut DrawCtx<'_>,
    rect: Rect,
    label: &str,
    enabled: bool,
) -> Result<(), String> {
    let hovered = enabled && rect.contains_point(ctx.mouse);
    let fill = if hovered { render::SLOT_SELECTED } else { SLOT_BG };
    render::draw_frame(ctx.canvas, rect, fill, PANEL_BORDER)?;
    font_cache::draw_text_centered(
        ctx.canvas,
        label,
        rect.x() + rect.width() as i32 / 2,
        rect.y() + (rect.height() as i32 - LINE_H as i32) / 2 + 2,
        if enabled { TEXT_COLOR } else { TEXT_DIM },
    )
}

/// Vertical list of fixed height rows with wheel scrolling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollList {
    offset: usize,
}

impl ScrollList {
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn rows_fitting(rc: &RenderContext, area: Rect) -> usize {
        (area.height() / rc.su(ROW_H)).max(1) as usize
    }

    /// Scrolls with the mouse wheel while the cursor is over `area`.
    pub fn scroll(&mut self, input: &InputState, rc: &RenderContext, area: Rect, len: usize) {
        if !area.contains_point(input.mouse()) || input.wheel() == 0 {
            return;
        }
        let max = len.saturating_sub(Self::rows_fitting(rc, area));
        let next = self.offset as i64 - input.wheel() as i64;
        self.offset = next.clamp(0, max as i64) as usize;
    }

    /// Indices of the rows currently on screen.
    pub fn visible(&self, rc: &RenderContext, area: Rect, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(start + Self::rows_fitting(rc, area)).min(len)
    }

    /// Screen rectangle of row `index`, if it is on screen.
    pub fn row_rect(&self, rc: &RenderContext, area: Rect, index: usize) -> Option<Rect> {
        if index < self.offset || index >= self.offset + Self::rows_fitting(rc, area) {
            return None;
        }
        let h = rc.su(ROW_H);
        Some(Rect::new(
            area.x(),
            area.y() + ((index - self.offset) as u32 * h) as i32,
            area.width(),
            h,
        ))
    }

    pub fn row_at(&self, rc: &RenderContext, area: Rect, point: Point, len: usize) -> Option<usize> {
        self.visible(rc, area, len)
            .find(|i| self.row_rect(rc, area, *i).is_some_and(|r| r.contains_point(point)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_list_maps_points_to_rows() {
        let rc = RenderContext::new(1920, 1080, false);
        let area = Rect::new(0, 0, 100, ROW_H * 3);
        let mut list = ScrollList::default();
        assert_eq!(list.visible(&rc, area, 10), 0..3);
        assert_eq!(list.row_at(&rc, area, Point::new(5, ROW_H as i32 + 1), 10), Some(1));
        assert_eq!(list.row_at(&rc, area, Point::new(5, ROW_H as i32 + 1), 1), None);

        list.offset = 7;
        assert_eq!(list.visible(&rc, area, 10), 7..10);
        assert_eq!(list.row_at(&rc, area, Point::new(5, 1), 10), Some(7));
        assert!(list.row_rect(&rc, area, 2).is_none());
    }

    #[test]
    fn buttons_stay_inside_the_panel() {
        let rc = RenderContext::new(1920, 1080, false);
        let panel = panel_rect(&rc);
        for index in 0..2 {
            let button = button_rect(&rc, panel, index);
            assert!(panel.contains_rect(button));
        }
        assert!(panel.contains_rect(close_rect(&rc, panel)));
    }
}
