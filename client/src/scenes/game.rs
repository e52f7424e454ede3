use std::thread::JoinHandle;
use std::time::Duration;

use egui_sdl2::egui;
use sdl2::{event::Event, pixels::Color, render::Canvas, video::Window};

use crate::{
    hud::Hud,
    input::InputState,
    render::RenderContext,
    scenes::scene::{Scene, SceneType},
    state::AppState,
};

/// The running game: owns the HUD root, the frame input and the engine tick.
pub struct GameScene {
    hud: Option<Hud>,
    input: InputState,
    tick: Option<JoinHandle<()>>,
    size: (u32, u32),
}

impl GameScene {
    pub fn new() -> Self {
        Self {
            hud: None,
            input: InputState::new(),
            tick: None,
            size: (1, 1),
        }
    }

    fn shutdown(&mut self) {
        let Some(hud) = self.hud.take() else {
            return;
        };
        let game = std::sync::Arc::clone(hud.game());
        drop(hud);
        game.close();
        if let Some(tick) = self.tick.take() {
            if tick.join().is_err() {
                log::error!("Engine tick panicked");
            }
        }
    }
}

impl Scene for GameScene {
    fn on_enter(&mut self, app_state: &mut AppState) {
        self.input = InputState::new();
        let Some(session) = app_state.session.take() else {
            log::error!("Game scene entered without a game");
            return;
        };
        match session.game.start() {
            Ok(handle) => self.tick = Some(handle),
            Err(err) => {
                log::error!("{err}");
                return;
            }
        }
        let mut hud = Hud::new(
            session.game,
            app_state.paths.clone(),
            app_state.i18n.clone(),
        );
        hud.set_debug(app_state.settings.debug);
        if let Some(data) = session.hud_data {
            hud.apply(data);
        }
        self.hud = Some(hud);
    }

    fn on_exit(&mut self, app_state: &mut AppState) {
        self.shutdown();
        app_state.assets.sfx.stop_music();
    }

    fn handle_event(&mut self, _app_state: &mut AppState, event: &Event) -> Option<SceneType> {
        self.input.handle_event(event);
        None
    }

    fn update(&mut self, app_state: &mut AppState, dt: Duration) -> Option<SceneType> {
        let Some(hud) = self.hud.as_mut() else {
            return Some(SceneType::Start);
        };
        let rc = RenderContext::new(self.size.0, self.size.1, app_state.settings.debug);
        hud.update(
            &mut self.input,
            &rc,
            &mut app_state.assets.bindings,
            dt.as_secs_f32(),
        );
        self.input.begin_frame();
        None
    }

    fn render_world(
        &mut self,
        app_state: &mut AppState,
        canvas: &mut Canvas<Window>,
    ) -> Result<(), String> {
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        self.size = canvas.output_size()?;
        match self.hud.as_mut() {
            Some(hud) => hud.draw(canvas, &mut app_state.assets),
            None => Ok(()),
        }
    }

    fn render_ui(&mut self, app_state: &mut AppState, ctx: &egui::Context) -> Option<SceneType> {
        let hud = self.hud.as_mut()?;
        if hud.render_ui(ctx, &mut app_state.settings) {
            app_state.settings_changed();
        }
        hud.exiting().then_some(SceneType::Exit)
    }
}
