use std::time::Duration;

use egui_sdl2::egui;
use sdl2::{event::Event, render::Canvas, video::Window};

use crate::{
    scenes::scene::{Scene, SceneType},
    state::AppState,
};

/// Terminal scene. The main loop stops once it is active.
pub struct ExitScene;

impl ExitScene {
    pub fn new() -> Self {
        Self
    }
}

impl Scene for ExitScene {
    fn on_enter(&mut self, app_state: &mut AppState) {
        if let Some(session) = app_state.session.take() {
            session.game.close();
        }
        app_state.assets.sfx.stop_music();
        log::info!("Exiting");
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
        _canvas: &mut Canvas<Window>,
    ) -> Result<(), String> {
        Ok(())
    }

    fn render_ui(&mut self, _app_state: &mut AppState, _ctx: &egui::Context) -> Option<SceneType> {
        None
    }
}
