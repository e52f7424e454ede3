use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::Settings;

/// Subdirectory of the GUI path holding everything this HUD reads.
const HUD_ROOT: &str = "mural";
const SAVE_EXT: &str = "json";

/// Returns the directory containing the running executable.
///
/// Falls back to `"."` if `current_exe()` cannot be resolved (should be rare).
fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolves a configured directory.
///
/// Absolute paths are used as they are. Relative paths are tried against the
/// working directory first and then against the executable directory, so an
/// installed binary finds its data regardless of where it was started from.
fn resolve(configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() || path.exists() {
        return path;
    }
    let next_to_exe = exe_directory().join(&path);
    if next_to_exe.exists() {
        return next_to_exe;
    }
    path
}

/// Lists file stems with the given extension, sorted by name.
fn list_stems(dir: &Path, ext: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        log::warn!("Cannot read directory {}", dir.display());
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Every filesystem location the client knows about.
#[derive(Clone, Debug)]
pub struct GuiPaths {
    gui: PathBuf,
    modules: PathBuf,
}

impl GuiPaths {
    /// Resolves the GUI and modules directories named in the settings.
    ///
    /// # Arguments
    /// * `settings` - Loaded `.mural` configuration.
    ///
    /// # Returns
    /// * `GuiPaths` rooted at `<gui_path>/mural` and `<modules_path>`.
    pub fn new(settings: &Settings) -> Self {
        let paths = Self::from_roots(resolve(&settings.gui_path), resolve(&settings.modules_path));
        log::info!("Using GUI directory at: {}", paths.gui.display());
        log::info!("Using modules directory at: {}", paths.modules.display());
        paths
    }

    pub fn from_roots(gui_path: PathBuf, modules_path: PathBuf) -> Self {
        Self {
            gui: gui_path.join(HUD_ROOT),
            modules: modules_path,
        }
    }

    pub fn gui_dir(&self) -> &Path {
        &self.gui
    }

    pub fn graphic_zip(&self) -> PathBuf {
        self.gui.join("graphic.zip")
    }

    pub fn audio_zip(&self) -> PathBuf {
        self.gui.join("audio.zip")
    }

    /// Directory of graphic bindings of one kind (`avatars`, `items`,
    /// `effects` or `skills`).
    pub fn bindings_dir(&self, kind: &str) -> PathBuf {
        self.gui.join(kind)
    }

    pub fn portraits_dir(&self) -> PathBuf {
        self.gui.join("portraits")
    }

    pub fn lang_file(&self, lang: &str) -> PathBuf {
        self.gui.join("lang").join(lang)
    }

    /// Directory of HUD save files.
    pub fn hud_dir(&self) -> PathBuf {
        self.gui.join("hud")
    }

    pub fn hud_save(&self, name: &str) -> PathBuf {
        self.hud_dir().join(format!("{name}.{SAVE_EXT}"))
    }

    /// Engine export written next to a HUD save of the same name.
    pub fn module_save(&self, name: &str) -> PathBuf {
        self.gui.join("saves").join(format!("{name}.{SAVE_EXT}"))
    }

    pub fn area_dir(&self, chapter: &str, area: &str) -> PathBuf {
        self.gui
            .join("chapters")
            .join(chapter)
            .join("areas")
            .join(area)
    }

    pub fn area_map(&self, chapter: &str, area: &str) -> PathBuf {
        self.area_dir(chapter, area).join("map.tmx")
    }

    pub fn area_scripts(&self, chapter: &str, area: &str) -> PathBuf {
        self.area_dir(chapter, area).join("scripts")
    }

    /// Directory of scripts run from the chat line with `%name`.
    pub fn scripts_dir(&self) -> PathBuf {
        self.gui.join("scripts")
    }

    pub fn module_file(&self, name: &str) -> PathBuf {
        self.modules.join(format!("{name}.json"))
    }

    /// Names of saved games, sorted.
    pub fn list_saves(&self) -> Vec<String> {
        list_stems(&self.hud_dir(), SAVE_EXT)
    }

    /// Names of installed modules, sorted.
    pub fn list_modules(&self) -> Vec<String> {
        list_stems(&self.modules, "json")
    }
}
