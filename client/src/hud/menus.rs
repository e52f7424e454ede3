//! In-game menus drawn with egui: the main menu with its settings page,
//! the save menu and the load menu.

use egui_sdl2::egui;

use crate::i18n::I18n;
use crate::settings::Settings;

use super::panel::{HudAction, PanelId};

const WINDOW_W: f32 = 320.0;
const BUTTON_SIZE: [f32; 2] = [220.0, 30.0];

/// `true` for names usable as a save file stem.
pub fn valid_save_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn button(ui: &mut egui::Ui, label: &str) -> bool {
    ui.add(egui::Button::new(label).min_size(BUTTON_SIZE.into()))
        .clicked()
}

fn menu_window<'a>(title: &'a str, id: &'a str) -> egui::Window<'a> {
    egui::Window::new(title)
        .id(egui::Id::new(id))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .default_width(WINDOW_W)
}

/// Main in-game menu.
#[derive(Debug, Default)]
pub struct GameMenu {
    settings_open: bool,
}

impl GameMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.settings_open = false;
    }

    /// Shows the menu. Returns `true` when a setting was changed.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        i18n: &I18n,
        settings: &mut Settings,
        actions: &mut Vec<HudAction>,
    ) -> bool {
        let mut changed = false;
        menu_window(i18n.text("menu"), "hud_menu").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if self.settings_open {
                    changed = self.settings_page(ui, i18n, settings);
                    return;
                }
                if button(ui, i18n.text("resume")) {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Close);
                }
                if button(ui, i18n.text("save")) {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Open(PanelId::SaveMenu));
                }
                if button(ui, i18n.text("load")) {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Open(PanelId::LoadMenu));
                }
                if button(ui, i18n.text("settings")) {
                    actions.push(HudAction::Click);
                    self.settings_open = true;
                }
                ui.separator();
                if button(ui, i18n.text("exit")) {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Exit);
                }
            });
        });
        changed
    }

    fn settings_page(&mut self, ui: &mut egui::Ui, i18n: &I18n, settings: &mut Settings) -> bool {
        let mut changed = false;
        ui.heading(i18n.text("settings"));
        ui.separator();
        changed |= ui
            .add(
                egui::Slider::new(&mut settings.music_volume, 0.0..=1.0)
                    .text(i18n.text("music_volume"))
                    .show_value(true),
            )
            .changed();
        changed |= ui
            .checkbox(&mut settings.music_mute, i18n.text("mute"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut settings.effects_volume, 0.0..=1.0)
                    .text(i18n.text("effects_volume"))
                    .show_value(true),
            )
            .changed();
        changed |= ui
            .checkbox(&mut settings.effects_mute, i18n.text("mute"))
            .changed();
        ui.separator();
        if button(ui, i18n.text("back")) {
            self.settings_open = false;
        }
        changed
    }
}

/// Save name field above the list of existing saves.
#[derive(Debug, Default)]
pub struct SaveMenu {
    name: String,
    saves: Vec<String>,
}

impl SaveMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, saves: Vec<String>) {
        self.saves = saves;
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Save action for the typed name, if it is usable.
    pub fn submit(&self) -> Option<HudAction> {
        let name = self.name.trim();
        valid_save_name(name).then(|| HudAction::Save(name.to_string()))
    }

    pub fn show(&mut self, ctx: &egui::Context, i18n: &I18n, actions: &mut Vec<HudAction>) {
        menu_window(i18n.text("save"), "hud_save_menu").show(ctx, |ui| {
            ui.add(egui::TextEdit::singleline(&mut self.name).desired_width(WINDOW_W - 20.0));
            ui.separator();
            egui::ScrollArea::vertical()
                .max_height(240.0)
                .show(ui, |ui| {
                    for save in &self.saves {
                        if ui
                            .selectable_label(self.name == *save, save.as_str())
                            .clicked()
                        {
                            self.name = save.clone();
                        }
                    }
                });
            ui.separator();
            ui.horizontal(|ui| {
                let save = self.submit();
                if ui
                    .add_enabled(save.is_some(), egui::Button::new(i18n.text("save")))
                    .clicked()
                {
                    actions.push(HudAction::Click);
                    actions.extend(save);
                }
                if ui.button(i18n.text("close")).clicked() {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Open(PanelId::Menu));
                }
            });
        });
    }
}

/// List of saves to load.
#[derive(Debug, Default)]
pub struct LoadMenu {
    saves: Vec<String>,
    selected: Option<usize>,
}

impl LoadMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, saves: Vec<String>) {
        self.saves = saves;
        self.selected = None;
    }

    pub fn select(&mut self, index: usize) {
        if index < self.saves.len() {
            self.selected = Some(index);
        }
    }

    pub fn submit(&self) -> Option<HudAction> {
        self.selected
            .and_then(|i| self.saves.get(i))
            .map(|name| HudAction::Load(name.clone()))
    }

    pub fn show(&mut self, ctx: &egui::Context, i18n: &I18n, actions: &mut Vec<HudAction>) {
        menu_window(i18n.text("load"), "hud_load_menu").show(ctx, |ui| {
            if self.saves.is_empty() {
                ui.label(i18n.text("no_saves"));
            }
            egui::ScrollArea::vertical()
                .max_height(240.0)
                .show(ui, |ui| {
                    for (index, save) in self.saves.iter().enumerate() {
                        if ui
                            .selectable_label(self.selected == Some(index), save.as_str())
                            .clicked()
                        {
                            self.selected = Some(index);
                        }
                    }
                });
            ui.separator();
            ui.horizontal(|ui| {
                let load = self.submit();
                if ui
                    .add_enabled(load.is_some(), egui::Button::new(i18n.text("load")))
                    .clicked()
                {
                    actions.push(HudAction::Click);
                    actions.extend(load);
                }
                if ui.button(i18n.text("close")).clicked() {
                    actions.push(HudAction::Click);
                    actions.push(HudAction::Open(PanelId::Menu));
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_names_must_be_plain_stems() {
        assert!(valid_save_name("test01"));
        assert!(valid_save_name("before-boss_2"));
        assert!(!valid_save_name(""));
        assert!(!valid_save_name("../escape"));
        assert!(!valid_save_name("a b"));
    }

    #[test]
    fn save_menu_submits_the_trimmed_name() {
        let mut menu = SaveMenu::new();
        assert_eq!(menu.submit(), None);
        menu.set_name(" test01 ");
        assert_eq!(menu.submit(), Some(HudAction::Save("test01".into())));
    }

    #[test]
    fn load_menu_needs_a_selection() {
        let mut menu = LoadMenu::new();
        menu.refresh(vec!["a".into(), "b".into()]);
        assert_eq!(menu.submit(), None);
        menu.select(5);
        assert_eq!(menu.submit(), None);
        menu.select(1);
        assert_eq!(menu.submit(), Some(HudAction::Load("b".into())));
        menu.refresh(vec!["c".into()]);
        assert_eq!(menu.submit(), None);
    }
}
