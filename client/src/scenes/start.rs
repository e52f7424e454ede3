use std::time::Duration;

use egui_sdl2::egui;
use sdl2::{event::Event, pixels::Color, render::Canvas, video::Window};

use crate::{
    scenes::scene::{Scene, SceneType},
    state::{AppState, Session},
};

const WINDOW_W: f32 = 430.0;
const BUTTON_SIZE: [f32; 2] = [180.0, 32.0];

/// Index of `wanted` in `names`, else the first entry.
fn preselect(names: &[String], wanted: &str) -> Option<usize> {
    names
        .iter()
        .position(|n| n == wanted)
        .or((!names.is_empty()).then_some(0))
}

enum Launch {
    New,
    Load,
    Connect,
}

/// Launcher: pick a module to start, a save to load, or a server to join.
pub struct StartScene {
    modules: Vec<String>,
    saves: Vec<String>,
    module: Option<usize>,
    save: Option<usize>,
    template: String,
    char_name: String,
    server: String,
    error: Option<String>,
}

impl StartScene {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            saves: Vec::new(),
            module: None,
            save: None,
            template: String::new(),
            char_name: String::new(),
            server: String::new(),
            error: None,
        }
    }

    fn launch(&self, app_state: &AppState, launch: Launch) -> Result<Session, String> {
        match launch {
            Launch::New => {
                let name = self
                    .module
                    .and_then(|i| self.modules.get(i))
                    .ok_or("No module selected")?;
                Session::new_local(&app_state.paths, name, self.template.trim(), self.char_name.trim())
            }
            Launch::Load => {
                let name = self
                    .save
                    .and_then(|i| self.saves.get(i))
                    .ok_or("No save selected")?;
                Session::load_local(&app_state.paths, name)
            }
            Launch::Connect => Session::connect(
                self.server.trim(),
                &app_state.settings,
                self.template.trim(),
                self.char_name.trim(),
            ),
        }
    }

    fn list(ui: &mut egui::Ui, id: &str, names: &[String], selected: &mut Option<usize>) {
        egui::ScrollArea::vertical()
            .id_salt(id)
            .max_height(120.0)
            .show(ui, |ui| {
                for (index, name) in names.iter().enumerate() {
                    if ui
                        .selectable_label(*selected == Some(index), name.as_str())
                        .clicked()
                    {
                        *selected = Some(index);
                    }
                }
            });
    }
}

impl Scene for StartScene {
    fn on_enter(&mut self, app_state: &mut AppState) {
        self.modules = app_state.paths.list_modules();
        self.saves = app_state.paths.list_saves();
        self.module = preselect(&self.modules, &app_state.settings.module);
        self.save = None;
        self.server = app_state.settings.server.clone();
        log::info!(
            "{} modules and {} saves found",
            self.modules.len(),
            self.saves.len()
        );
    }

    fn handle_event(&mut self, _app_state: &mut AppState, _event: &Event) -> Option<SceneType> {
        None
    }

    fn update(&mut self, _app_state: &mut AppState, _dt: Duration) -> Option<SceneType> {
        None
    }

    fn render_world(
        &mut self,
        _app_state: &mut AppState,
        canvas: &mut Canvas<Window>,
    ) -> Result<(), String> {
        canvas.set_draw_color(Color::RGB(20, 20, 28));
        canvas.clear();
        Ok(())
    }

    fn render_ui(&mut self, app_state: &mut AppState, ctx: &egui::Context) -> Option<SceneType> {
        let mut next = None;
        let mut launch = None;
        let i18n = app_state.i18n.clone();

        egui::Window::new(i18n.text("mural"))
            .default_width(WINDOW_W)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(i18n.text("modules"));
                Self::list(ui, "start_modules", &self.modules, &mut self.module);
                ui.horizontal(|ui| {
                    ui.label(i18n.text("template"));
                    ui.add(egui::TextEdit::singleline(&mut self.template).desired_width(120.0));
                    ui.label(i18n.text("name"));
                    ui.add(egui::TextEdit::singleline(&mut self.char_name).desired_width(120.0));
                });
                if ui
                    .add(egui::Button::new(i18n.text("new_game")).min_size(BUTTON_SIZE.into()))
                    .clicked()
                {
                    launch = Some(Launch::New);
                }
                ui.separator();

                ui.label(i18n.text("saves"));
                Self::list(ui, "start_saves", &self.saves, &mut self.save);
                if ui
                    .add_enabled(
                        self.save.is_some(),
                        egui::Button::new(i18n.text("load")).min_size(BUTTON_SIZE.into()),
                    )
                    .clicked()
                {
                    launch = Some(Launch::Load);
                }
                ui.separator();

                ui.label(i18n.text("server"));
                ui.add(egui::TextEdit::singleline(&mut self.server).desired_width(260.0));
                if ui
                    .add_enabled(
                        !self.server.trim().is_empty(),
                        egui::Button::new(i18n.text("connect")).min_size(BUTTON_SIZE.into()),
                    )
                    .clicked()
                {
                    launch = Some(Launch::Connect);
                }
                ui.separator();

                if let Some(error) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, error.as_str());
                }
                if ui
                    .add(egui::Button::new(i18n.text("exit")).min_size(BUTTON_SIZE.into()))
                    .clicked()
                {
                    next = Some(SceneType::Exit);
                }
            });

        if let Some(launch) = launch {
            app_state.assets.play_click();
            match self.launch(app_state, launch) {
                Ok(session) => {
                    self.error = None;
                    app_state.session = Some(session);
                    next = Some(SceneType::Game);
                }
                Err(err) => {
                    log::error!("{err}");
                    self.error = Some(err);
                }
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_module_is_preselected() {
        let names = vec!["intro".to_string(), "prologue".to_string()];
        assert_eq!(preselect(&names, "prologue"), Some(1));
        assert_eq!(preselect(&names, "missing"), Some(0));
        assert_eq!(preselect(&[], "prologue"), None);
    }
}
