use std::path::{Path, PathBuf};

use sdl2::render::{Texture, TextureCreator};
use sdl2::video::WindowContext;

use crate::bindings::Bindings;
use crate::filepaths::GuiPaths;
use crate::gfx_cache::GraphicsCache;
use crate::settings::Settings;
use crate::sfx_cache::SoundCache;

const TEXTURE_PREFIX: &str = "texture/";
const PORTRAIT_PREFIX: &str = "portrait/";
const ICON_PREFIX: &str = "icon/";
const AVATAR_SHEET_PREFIX: &str = "spritesheet/avatar/";

/// Every texture, sound and binding the client draws or plays, loaded once
/// per module and handed to components that need it.
pub struct AssetRegistry {
    pub gfx: GraphicsCache,
    pub sfx: SoundCache,
    pub bindings: Bindings,
    portraits_dir: PathBuf,
    click_sound: String,
}

impl AssetRegistry {
    /// Opens the resource pack of the GUI directory.
    ///
    /// # Arguments
    /// * `paths` - Resolved client paths.
    /// * `settings` - Volumes and the button click sound.
    /// * `creator` - Texture creator of the main window canvas.
    pub fn new(
        paths: &GuiPaths,
        settings: &Settings,
        creator: TextureCreator<WindowContext>,
    ) -> Self {
        let mut sfx = SoundCache::new(&paths.audio_zip());
        sfx.set_effects_volume(settings.effects_level());
        sfx.set_music_volume(settings.music_level());
        Self {
            gfx: GraphicsCache::new(&paths.graphic_zip(), creator),
            sfx,
            bindings: Bindings::load(paths),
            portraits_dir: paths.portraits_dir(),
            click_sound: settings.button_click_sound.clone(),
        }
    }

    pub fn texture(&mut self, name: &str) -> Option<&Texture> {
        self.gfx.texture(&format!("{TEXTURE_PREFIX}{name}"))
    }

    pub fn icon(&mut self, name: &str) -> Option<&Texture> {
        self.gfx.texture(&format!("{ICON_PREFIX}{name}"))
    }

    pub fn avatar_sheet(&mut self, name: &str) -> Option<&Texture> {
        self.gfx.texture(&format!("{AVATAR_SHEET_PREFIX}{name}"))
    }

    /// Portrait from the archive, or from the loose portraits directory.
    pub fn portrait(&mut self, name: &str) -> Option<&Texture> {
        let entry = format!("{PORTRAIT_PREFIX}{name}");
        if self.gfx.contains(&entry) {
            self.gfx.texture(&entry)
        } else {
            let path = self.portraits_dir.join(name);
            self.gfx.texture_file(&path)
        }
    }

    pub fn image_file(&mut self, path: &Path) -> Option<&Texture> {
        self.gfx.texture_file(path)
    }

    pub fn play_click(&mut self) {
        let sound = self.click_sound.clone();
        self.sfx.play_effect(&sound);
    }

    /// Applies changed volume settings.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx.set_effects_volume(settings.effects_level());
        self.sfx.set_music_volume(settings.music_level());
        self.click_sound = settings.button_click_sound.clone();
    }
}
