use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Name of the configuration file in the working directory.
pub const SETTINGS_FILE_NAME: &str = ".mural";

/// Splits `key:value;` lines into pairs.
///
/// Whitespace around keys and values is trimmed, the trailing `;` is
/// optional and lines without a `:` are skipped. The value keeps any further
/// `:` characters, so `server:localhost:8080;` parses as expected.
pub fn parse_pairs(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_suffix(';').unwrap_or(line);
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Client configuration persisted in `.mural`.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub fullscreen: bool,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub lang: String,
    pub music_volume: f32,
    pub music_mute: bool,
    pub effects_volume: f32,
    pub effects_mute: bool,
    pub server_login: String,
    pub server_password: String,
    /// `host:port` of a game server; empty for local games.
    pub server: String,
    pub main_font: String,
    pub button_click_sound: String,
    pub default_hud_layout: String,
    pub modules_path: String,
    pub gui_path: String,
    pub debug: bool,
    pub max_fps: u32,
    /// Module started by the launcher when none is picked.
    pub module: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fullscreen: false,
            resolution_x: 1280,
            resolution_y: 720,
            lang: "english".to_string(),
            music_volume: 0.5,
            music_mute: false,
            effects_volume: 0.5,
            effects_mute: false,
            server_login: String::new(),
            server_password: String::new(),
            server: String::new(),
            main_font: "SIMSUN.ttf".to_string(),
            button_click_sound: "click.ogg".to_string(),
            default_hud_layout: "default".to_string(),
            modules_path: "modules".to_string(),
            gui_path: "ui".to_string(),
            debug: false,
            max_fps: 60,
            module: String::new(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    /// Parses configuration text. Unknown keys and invalid values are logged
    /// and leave the default in place.
    pub fn parse(text: &str) -> Self {
        let mut settings = Settings::default();
        for (key, value) in parse_pairs(text) {
            if !settings.apply(&key, &value) {
                log::warn!("Ignoring config entry {key}:{value}");
            }
        }
        settings
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        fn set<T: std::str::FromStr>(field: &mut T, value: &str) -> bool {
            value.parse().map(|v| *field = v).is_ok()
        }
        fn set_bool(field: &mut bool, value: &str) -> bool {
            parse_bool(value).map(|v| *field = v).is_some()
        }
        match key {
            "fullscreen" => set_bool(&mut self.fullscreen, value),
            "resolution_x" => set(&mut self.resolution_x, value),
            "resolution_y" => set(&mut self.resolution_y, value),
            "lang" => set(&mut self.lang, value),
            "music_volume" => set(&mut self.music_volume, value),
            "music_mute" => set_bool(&mut self.music_mute, value),
            "effects_volume" => set(&mut self.effects_volume, value),
            "effects_mute" => set_bool(&mut self.effects_mute, value),
            "server_login" => set(&mut self.server_login, value),
            "server_password" => set(&mut self.server_password, value),
            "server" => set(&mut self.server, value),
            "main_font" => set(&mut self.main_font, value),
            "button_click_sound" => set(&mut self.button_click_sound, value),
            "default_hud_layout" => set(&mut self.default_hud_layout, value),
            "modules_path" => set(&mut self.modules_path, value),
            "gui_path" => set(&mut self.gui_path, value),
            "debug" => set_bool(&mut self.debug, value),
            "max_fps" => set(&mut self.max_fps, value),
            "module" => set(&mut self.module, value),
            _ => false,
        }
    }

    /// Loads settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                log::info!("No settings at {} ({err}), using defaults", path.display());
                Settings::default()
            }
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let entries: [(&str, String); 19] = [
            ("fullscreen", self.fullscreen.to_string()),
            ("resolution_x", self.resolution_x.to_string()),
            ("resolution_y", self.resolution_y.to_string()),
            ("lang", self.lang.clone()),
            ("music_volume", self.music_volume.to_string()),
            ("music_mute", self.music_mute.to_string()),
            ("effects_volume", self.effects_volume.to_string()),
            ("effects_mute", self.effects_mute.to_string()),
            ("server_login", self.server_login.clone()),
            ("server_password", self.server_password.clone()),
            ("server", self.server.clone()),
            ("main_font", self.main_font.clone()),
            ("button_click_sound", self.button_click_sound.clone()),
            ("default_hud_layout", self.default_hud_layout.clone()),
            ("modules_path", self.modules_path.clone()),
            ("gui_path", self.gui_path.clone()),
            ("debug", self.debug.to_string()),
            ("max_fps", self.max_fps.to_string()),
            ("module", self.module.clone()),
        ];
        for (key, value) in entries {
            let _ = writeln!(out, "{key}:{value};");
        }
        out
    }

    /// Writes the settings through a temporary file so a crash never leaves
    /// a truncated config behind.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, self.to_text()).map_err(|err| {
            format!(
                "Failed to write settings temp file {}: {err}",
                tmp_path.display()
            )
        })?;
        fs::rename(&tmp_path, path)
            .map_err(|err| format!("Failed to replace settings file {}: {err}", path.display()))
    }

    /// Effective music volume in `0.0..=1.0`.
    pub fn music_level(&self) -> f32 {
        if self.music_mute {
            0.0
        } else {
            self.music_volume.clamp(0.0, 1.0)
        }
    }

    /// Effective sound-effect volume in `0.0..=1.0`.
    pub fn effects_level(&self) -> f32 {
        if self.effects_mute {
            0.0
        } else {
            self.effects_volume.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys_and_skips_garbage() {
        let settings = Settings::parse(
            "fullscreen:true;\nresolution_x: 1920;\nresolution_y:1080\n\
             server:127.0.0.1:8000;\nmax_fps:abc;\nbogus:1;\nno separator\n",
        );
        assert!(settings.fullscreen);
        assert_eq!(settings.resolution_x, 1920);
        assert_eq!(settings.resolution_y, 1080);
        assert_eq!(settings.server, "127.0.0.1:8000");
        assert_eq!(settings.max_fps, 60);
    }

    #[test]
    fn muted_channels_report_zero_volume() {
        let mut settings = Settings {
            music_volume: 1.5,
            ..Settings::default()
        };
        assert_eq!(settings.music_level(), 1.0);
        settings.music_mute = true;
        assert_eq!(settings.music_level(), 0.0);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = std::env::temp_dir().join(format!("mural-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(SETTINGS_FILE_NAME);

        let settings = Settings {
            lang: "polski".into(),
            effects_volume: 0.25,
            debug: true,
            module: "prologue".into(),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("mural-no-such-dir").join(SETTINGS_FILE_NAME);
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
