//! Trade window: both parties pick items, the offer is checked against
//! the value rule and the exchange goes through the game mediator.

use std::collections::BTreeSet;

use mural_core::types::{Module, ObjectId};
use sdl2::rect::Rect;

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM, TEXT_WARN};
use crate::layout::Layout;
use crate::render::{self, SLOT_BG, SLOT_BORDER, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, Panel, ScrollList};

pub const LOW_VALUE: &str = "low_value";

/// One offer row: item key, name and price.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Offer {
    key: String,
    name: String,
    price: i32,
}

/// Barter with a dialog partner. The left list holds the seller's wares,
/// the right one the player's items; clicked rows toggle in and out of the
/// deal.
#[derive(Debug, Default)]
pub struct TradePanel {
    seller: Option<ObjectId>,
    buy: BTreeSet<String>,
    sell: BTreeSet<String>,
    wares: ScrollList,
    own: ScrollList,
}

impl TradePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, seller: ObjectId) {
        self.seller = Some(seller);
        self.clear();
    }

    pub fn seller(&self) -> Option<&ObjectId> {
        self.seller.as_ref()
    }

    fn clear(&mut self) {
        self.buy.clear();
        self.sell.clear();
        self.wares.reset();
        self.own.reset();
    }

    pub fn toggle_buy(&mut self, key: &str) {
        if !self.buy.remove(key) {
            self.buy.insert(key.to_string());
        }
    }

    pub fn toggle_sell(&mut self, key: &str) {
        if !self.sell.remove(key) {
            self.sell.insert(key.to_string());
        }
    }

    /// Value of the offered items minus the price of the wanted ones.
    pub fn value(&self, module: &Module, pc: &ObjectId) -> i32 {
        let (buy, sell) = self.values(module, pc);
        sell - buy
    }

    fn values(&self, module: &Module, pc: &ObjectId) -> (i32, i32) {
        let Some(seller) = &self.seller else {
            return (0, 0);
        };
        let buy: Vec<String> = self.buy.iter().cloned().collect();
        let sell: Vec<String> = self.sell.iter().cloned().collect();
        module.trade_values(seller, pc, &buy, &sell)
    }

    /// Closes the deal if the offer covers the price; otherwise the player
    /// is told the value is too low and nothing changes.
    pub fn accept(&mut self, ctx: &mut FrameCtx<'_>) -> bool {
        let Some(seller) = self.seller.clone() else {
            return false;
        };
        let (buy_value, sell_value) = self.values(ctx.module, ctx.pc);
        if buy_value > sell_value {
            ctx.game.refuse(ctx.module, ctx.pc, LOW_VALUE);
            return false;
        }
        let buy: Vec<String> = self.buy.iter().cloned().collect();
        let sell: Vec<String> = self.sell.iter().cloned().collect();
        match ctx.game.trade(ctx.module, &seller, ctx.pc, &buy, &sell) {
            Ok(()) => {
                log::info!("Traded {:?} for {:?} with {}", buy, sell, seller);
                self.clear();
                ctx.act(HudAction::RefreshInventory);
                true
            }
            Err(err) => {
                log::warn!("Trade failed: {err:#}");
                ctx.game.refuse(ctx.module, ctx.pc, "cant_do_right_now");
                false
            }
        }
    }

    fn seller_offers(&self, module: &Module) -> Vec<Offer> {
        self.seller
            .as_ref()
            .and_then(|s| module.inventory(s))
            .map(|inv| {
                inv.trade_items()
                    .into_iter()
                    .map(|(item, price)| Offer {
                        key: item.key(),
                        name: item.display_name().to_string(),
                        price,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn own_offers(module: &Module, pc: &ObjectId) -> Vec<Offer> {
        module
            .char(pc)
            .map(|c| {
                c.inventory
                    .items()
                    .iter()
                    .filter(|i| !c.equipment.equipped(&i.key()))
                    .map(|i| Offer {
                        key: i.key(),
                        name: i.display_name().to_string(),
                        price: i.value,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn columns(rc: &render::RenderContext, panel: Rect) -> (Rect, Rect) {
        let area = panel::content_rect(rc, panel);
        let half = area.width() / 2;
        let gap = rc.su(8);
        let top = rc.s(font_cache::LINE_H as i32 + 6);
        let h = area.height().saturating_sub(top as u32).max(1);
        (
            Rect::new(area.x(), area.y() + top, half.saturating_sub(gap).max(1), h),
            Rect::new(area.x() + half as i32 + gap as i32, area.y() + top, half.saturating_sub(gap).max(1), h),
        )
    }

    fn draw_offers(
        ctx: &mut DrawCtx<'_>,
        list: &ScrollList,
        area: Rect,
        offers: &[Offer],
        selected: &BTreeSet<String>,
    ) -> Result<(), String> {
        for row in list.visible(ctx.rc, area, offers.len()) {
            let Some(rect) = list.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let offer = &offers[row];
            let fill = if selected.contains(&offer.key) {
                SLOT_SELECTED
            } else {
                SLOT_BG
            };
            render::draw_frame(ctx.canvas, rect, fill, SLOT_BORDER)?;
            let y = rect.y() + (rect.height() as i32 - font_cache::LINE_H as i32) / 2;
            font_cache::draw_text(ctx.canvas, &offer.name, rect.x() + 6, y, TEXT_COLOR)?;
            let price = offer.price.to_string();
            let x = rect.right() - font_cache::text_width(&price) as i32 - 6;
            font_cache::draw_text(ctx.canvas, &price, x, y, TEXT_DIM)?;
        }
        Ok(())
    }
}

impl Panel for TradePanel {
    fn show(&mut self, _module: &Module, _pc: &ObjectId, _layout: &mut Layout) {
        self.clear();
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let (left, right) = Self::columns(ctx.rc, rect);
        let wares = self.seller_offers(ctx.module);
        let own = Self::own_offers(ctx.module, ctx.pc);
        self.wares.scroll(ctx.input, ctx.rc, left, wares.len());
        self.own.scroll(ctx.input, ctx.rc, right, own.len());

        let mouse = ctx.input.mouse();
        if let Some(row) = self.wares.row_at(ctx.rc, left, mouse, wares.len()) {
            if ctx.input.take_left_click(left) {
                self.toggle_buy(&wares[row].key);
            }
        }
        if let Some(row) = self.own.row_at(ctx.rc, right, mouse, own.len()) {
            if ctx.input.take_left_click(right) {
                self.toggle_sell(&own[row].key);
            }
        }
        if ctx.input.take_left_click(panel::button_rect(ctx.rc, rect, 0)) {
            ctx.act(HudAction::Click);
            self.accept(ctx);
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("trade").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let module = ctx.module;
        let (left, right) = Self::columns(ctx.rc, rect);
        let header_y = left.y() - ctx.rc.s(font_cache::LINE_H as i32 + 4);
        let seller_name = self
            .seller
            .as_ref()
            .and_then(|s| module.char(s))
            .map(|c| c.display_name().to_string())
            .unwrap_or_default();
        font_cache::draw_text(ctx.canvas, &seller_name, left.x(), header_y, TEXT_DIM)?;
        let own_label = ctx.i18n.text("your_items").to_string();
        font_cache::draw_text(ctx.canvas, &own_label, right.x(), header_y, TEXT_DIM)?;

        Self::draw_offers(ctx, &self.wares, left, &self.seller_offers(module), &self.buy)?;
        Self::draw_offers(ctx, &self.own, right, &Self::own_offers(module, ctx.pc), &self.sell)?;

        let value = self.value(module, ctx.pc);
        let value_text = format!("{}: {}", ctx.i18n.text("value"), value);
        let button = panel::button_rect(ctx.rc, rect, 0);
        font_cache::draw_text(
            ctx.canvas,
            &value_text,
            rect.x() + ctx.rc.s(20),
            button.y() + ctx.rc.s(10),
            if value < 0 { TEXT_WARN } else { TEXT_COLOR },
        )?;
        let accept = ctx.i18n.text("accept").to_string();
        panel::draw_button(ctx, button, &accept, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::render::RenderContext;
    use crate::testing::{merchant, pc, test_module};
    use mural_core::console::Console;
    use mural_core::types::LogChannel;

    struct Fixture {
        game: Game,
        module: Module,
        layout: Layout,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                game: Game::new(mural_core::share(test_module()), Console::new()),
                module: test_module(),
                layout: Layout::default(),
            }
        }

        fn accept(&mut self, panel: &mut TradePanel) -> (bool, Vec<HudAction>) {
            let rc = RenderContext::new(1920, 1080, false);
            let mut input = InputState::new();
            let (mut drag, mut actions) = (None, Vec::new());
            let pc = pc();
            let mut ctx = FrameCtx {
                game: &self.game,
                module: &mut self.module,
                pc: &pc,
                input: &mut input,
                rc: &rc,
                layout: &mut self.layout,
                drag: &mut drag,
                actions: &mut actions,
            };
            let done = panel.accept(&mut ctx);
            (done, actions)
        }
    }

    #[test]
    fn value_starts_at_zero() {
        let f = Fixture::new();
        let mut panel = TradePanel::new();
        panel.open(merchant());
        assert_eq!(panel.value(&f.module, &pc()), 0);
    }

    #[test]
    fn low_offers_are_refused() {
        let mut f = Fixture::new();
        let mut panel = TradePanel::new();
        panel.open(merchant());
        panel.toggle_buy("gem3");
        panel.toggle_sell("apple2");
        assert_eq!(panel.value(&f.module, &pc()), 5 - 50);

        let (done, actions) = f.accept(&mut panel);
        assert!(!done);
        assert!(actions.is_empty());
        let c = f.module.char(&pc()).unwrap();
        assert!(!c.inventory.contains("gem3"));
        assert_eq!(
            c.log(LogChannel::Private).last().map(|m| m.text.as_str()),
            Some(LOW_VALUE)
        );
    }

    #[test]
    fn covered_offers_swap_items() {
        let mut f = Fixture::new();
        f.module.char_mut(&merchant()).unwrap().inventory.set_trade_price("gem3", 5);
        let mut panel = TradePanel::new();
        panel.open(merchant());
        panel.toggle_buy("gem3");
        panel.toggle_sell("apple2");
        assert_eq!(panel.value(&f.module, &pc()), 0);

        let (done, actions) = f.accept(&mut panel);
        assert!(done);
        assert_eq!(actions, [HudAction::RefreshInventory]);
        assert!(f.module.char(&pc()).unwrap().inventory.contains("gem3"));
        assert!(f.module.char(&merchant()).unwrap().inventory.contains("apple2"));
        assert_eq!(panel.value(&f.module, &pc()), 0);
    }

    #[test]
    fn rows_toggle_in_and_out() {
        let mut panel = TradePanel::new();
        panel.toggle_sell("apple2");
        panel.toggle_sell("apple2");
        assert!(panel.sell.is_empty());
    }
}
