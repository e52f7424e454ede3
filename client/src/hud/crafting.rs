use mural_core::types::{Module, ObjectId, Recipe, UseAction, UseTarget};

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM};
use crate::layout::Layout;
use crate::render::{self, SLOT_BG, SLOT_BORDER, SLOT_SELECTED};

use super::panel::{self, DrawCtx, FrameCtx, HudAction, Panel, ScrollList};

/// Ingredients line shown under a recipe name.
pub fn ingredients(recipe: &Recipe) -> String {
    recipe
        .requirements
        .items
        .iter()
        .map(|(id, amount)| format!("{id} x{amount}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Known recipes of the active player character, grouped by category.
#[derive(Debug, Default)]
pub struct CraftingPanel {
    list: ScrollList,
    selected: Option<String>,
}

impl CraftingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, recipe: &str) {
        self.selected = Some(recipe.to_string());
    }

    fn recipes(module: &Module, pc: &ObjectId) -> Vec<Recipe> {
        let mut recipes = module
            .char(pc)
            .map(|c| c.recipes.clone())
            .unwrap_or_default();
        recipes.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.id.cmp(&b.id)));
        recipes
    }

    /// Starts making the selected recipe.
    pub fn make(&mut self, ctx: &mut FrameCtx<'_>) {
        let Some(recipe) = self.selected.clone() else {
            return;
        };
        if ctx
            .game
            .use_action(ctx.module, ctx.pc, UseAction::Recipe(recipe), UseTarget::Auto)
            .is_ok()
        {
            ctx.act(HudAction::RefreshInventory);
        }
    }
}

impl Panel for CraftingPanel {
    fn show(&mut self, _module: &Module, _pc: &ObjectId, _layout: &mut Layout) {
        self.list.reset();
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let rect = self.rect(ctx.rc);
        if panel::frame_input(ctx, rect) {
            return;
        }
        let area = panel::content_rect(ctx.rc, rect);
        let recipes = Self::recipes(ctx.module, ctx.pc);
        self.list.scroll(ctx.input, ctx.rc, area, recipes.len());
        if let Some(row) = self.list.row_at(ctx.rc, area, ctx.input.mouse(), recipes.len()) {
            if ctx.input.take_left_click(area) {
                self.select(&recipes[row].id);
            }
        }
        if ctx.input.take_left_click(panel::button_rect(ctx.rc, rect, 0)) {
            ctx.act(HudAction::Click);
            self.make(ctx);
        }
        ctx.input.block(rect);
    }

    fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = self.rect(ctx.rc);
        let title = ctx.i18n.text("crafting").to_string();
        panel::draw_panel(ctx, rect, &title)?;
        let area = panel::content_rect(ctx.rc, rect);
        let recipes = Self::recipes(ctx.module, ctx.pc);
        for row in self.list.visible(ctx.rc, area, recipes.len()) {
            let Some(row_rect) = self.list.row_rect(ctx.rc, area, row) else {
                continue;
            };
            let recipe = &recipes[row];
            let fill = if self.selected.as_deref() == Some(recipe.id.as_str()) {
                SLOT_SELECTED
            } else {
                SLOT_BG
            };
            render::draw_frame(ctx.canvas, row_rect, fill, SLOT_BORDER)?;
            let name = if recipe.category.is_empty() {
                recipe.display_name().to_string()
            } else {
                format!("[{}] {}", recipe.category, recipe.display_name())
            };
            font_cache::draw_text(ctx.canvas, &name, row_rect.x() + 6, row_rect.y() + 4, TEXT_COLOR)?;
            font_cache::draw_text(
                ctx.canvas,
                &ingredients(recipe),
                row_rect.x() + 6,
                row_rect.y() + 18,
                TEXT_DIM,
            )?;
        }
        let label = ctx.i18n.text("make").to_string();
        panel::draw_button(ctx, panel::button_rect(ctx.rc, rect, 0), &label, self.selected.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::input::InputState;
    use crate::render::RenderContext;
    use crate::testing::{misc, pc, test_module};
    use mural_core::console::Console;
    use mural_core::types::Requirements;

    fn pie() -> Recipe {
        let mut requirements = Requirements::default();
        requirements.items.push(("apple".into(), 1));
        Recipe {
            id: "pie".into(),
            name: "Apple pie".into(),
            category: "food".into(),
            cast_ms: 0,
            cooldown_ms: 0,
            requirements,
            results: vec![misc("pie", "", 12)],
        }
    }

    #[test]
    fn make_turns_ingredients_into_results() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let mut module = test_module();
        module.char_mut(&pc()).unwrap().recipes.push(pie());
        assert_eq!(ingredients(&pie()), "apple x1");

        let mut panel = CraftingPanel::new();
        panel.select("pie");
        let rc = RenderContext::new(1920, 1080, false);
        let mut input = InputState::new();
        let (mut layout, mut drag, mut actions) = (Layout::default(), None, Vec::new());
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
        panel.make(&mut ctx);
        let inv = &module.char(&pc).unwrap().inventory;
        assert_eq!(inv.count("apple"), 0);
        assert_eq!(inv.count("pie"), 1);
        assert_eq!(actions, [HudAction::RefreshInventory]);
    }
}
