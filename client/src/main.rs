use std::path::Path;
use std::process;
use std::time::{Duration, Instant};

use egui_sdl2::egui;
use sdl2::image::InitFlag;
use sdl2::mixer::{AUDIO_S16LSB, DEFAULT_CHANNELS};

use crate::assets::AssetRegistry;
use crate::filepaths::GuiPaths;
use crate::i18n::I18n;
use crate::scenes::scene::SceneType;
use crate::settings::{SETTINGS_FILE_NAME, Settings};
use crate::state::AppState;

mod area;
mod assets;
mod bindings;
mod camera;
mod dpi_scaling;
mod filepaths;
mod font_cache;
mod game;
mod game_math;
mod gfx_cache;
mod hud;
mod i18n;
mod input;
mod layout;
mod render;
mod scenes;
mod script_host;
mod settings;
mod sfx_cache;
mod state;
#[cfg(test)]
mod testing;

/// Time one frame may take at `max_fps`; zero means unlimited.
fn frame_budget(max_fps: u32) -> Duration {
    if max_fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(1) / max_fps
    }
}

fn main() -> Result<(), String> {
    // Loaded before the logger so its `debug` flag can pick the level.
    let settings = Settings::load(Path::new(SETTINGS_FILE_NAME));
    let level = if settings.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    mural_core::initialize_logger(level, Some("mural.log")).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Exiting.", e);
        process::exit(1);
    });

    log::info!("Initializing SDL2 contexts...");
    let sdl_context = sdl2::init()?;
    let _image_context = sdl2::image::init(InitFlag::PNG)?;
    let _audio_subsystem = sdl_context.audio()?;

    let frequency = 44_100;
    let format = AUDIO_S16LSB;
    let channels = DEFAULT_CHANNELS;
    let chunk_size = 1_024;
    sdl2::mixer::open_audio(frequency, format, channels, chunk_size)?;
    let _mixer_context = sdl2::mixer::init(sdl2::mixer::InitFlag::OGG)?;
    sdl2::mixer::allocate_channels(32);

    log::info!("Creating window and event pump...");
    let video = sdl_context.video()?;
    let mut builder = video.window(
        "Mural",
        settings.resolution_x.max(640),
        settings.resolution_y.max(480),
    );
    builder.position_centered().allow_highdpi().resizable();
    if settings.fullscreen {
        builder.fullscreen_desktop();
    }
    let mut window = builder.build().map_err(|e| e.to_string())?;
    let _ = window.set_minimum_size(640, 480);

    let mut event_pump = sdl_context.event_pump()?;

    log::info!("Initializing canvas...");
    let mut egui = egui_sdl2::EguiCanvas::new(window);

    log::info!("Loading resources...");
    let paths = GuiPaths::new(&settings);
    log::info!("GUI data in {}", paths.gui_dir().display());
    let i18n = I18n::load(&paths.lang_file(&settings.lang));
    let creator = egui.painter.canvas.texture_creator();
    let assets = AssetRegistry::new(&paths, &settings, creator);
    let max_fps = settings.max_fps;
    let mut app_state = AppState::new(settings, paths, i18n, assets);

    let mut scene_manager = scenes::scene::SceneManager::new();
    scene_manager.start(&mut app_state);
    let mut last_frame = Instant::now();

    'running: loop {
        let now = Instant::now();
        let dt = now.duration_since(last_frame);
        last_frame = now;

        let scale = dpi_scaling::hidpi_scale(egui.painter.canvas.window());
        for event in event_pump.poll_iter() {
            if let sdl2::event::Event::Quit { .. } = event {
                scene_manager.request_scene_change(SceneType::Exit, &mut app_state);
            }

            let event = dpi_scaling::adjust_mouse_event_for_hidpi(event, scale);

            let _ = egui.on_event(&event);

            scene_manager.handle_event(&mut app_state, &event);

            if scene_manager.get_scene() == SceneType::Exit {
                break 'running;
            }
        }

        scene_manager.update(&mut app_state, dt);
        scene_manager.render_world(&mut app_state, &mut egui.painter.canvas);

        egui.run(|ctx: &egui::Context| {
            scene_manager.render_ui(&mut app_state, ctx);
        });

        if scene_manager.get_scene() == SceneType::Exit {
            break 'running;
        }

        egui.paint();
        egui.present();

        let spent = now.elapsed();
        let budget = frame_budget(max_fps);
        if spent < budget {
            std::thread::sleep(budget - spent);
        }
    }

    log::info!("Bye");
    Ok(())
}
