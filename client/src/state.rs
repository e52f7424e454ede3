use std::path::Path;
use std::sync::Arc;

use mural_core::console::Console;
use mural_core::types::{Chapter, Module, ObjectId, Position};

use crate::assets::AssetRegistry;
use crate::filepaths::GuiPaths;
use crate::game::{Game, server};
use crate::i18n::I18n;
use crate::layout::HudData;
use crate::settings::{SETTINGS_FILE_NAME, Settings};

/// A game ready to be handed to the game scene, with the HUD data of the
/// save it came from.
pub struct Session {
    pub game: Arc<Game>,
    pub hud_data: Option<HudData>,
}

impl Session {
    /// Starts module `name` locally with a character spawned from
    /// `template` at the chapter start.
    pub fn new_local(
        paths: &GuiPaths,
        name: &str,
        template: &str,
        char_name: &str,
    ) -> Result<Self, String> {
        let mut module = Module::load(&paths.module_file(name)).map_err(|e| format!("{e:#}"))?;
        let template = if template.is_empty() {
            module
                .char_templates
                .first()
                .map(|t| t.id.clone())
                .ok_or_else(|| format!("Module {name} has no character templates"))?
        } else {
            template.to_string()
        };
        let area = module.chapter.start_area.clone();
        let start = module.chapter.start_position;

        let game = Arc::new(Game::new(mural_core::share(module), Console::new()));
        let oid = {
            let mut module = game
                .module()
                .write()
                .map_err(|_| "Module lock poisoned".to_string())?;
            let oid = game
                .spawn_char(&mut module, &template, &area, start)
                .map_err(|e| format!("{e:#}"))?;
            if let Some(c) = module.char_mut(&oid) {
                if !char_name.is_empty() {
                    c.name = char_name.to_string();
                }
            }
            oid
        };
        log::info!("New game of {name} as {oid} in {area}");
        game.add_player_char(oid);
        Ok(Self {
            game,
            hud_data: None,
        })
    }

    /// Restores save `name`: the engine export and the HUD data written next
    /// to it. The saved player layouts name the player characters.
    pub fn load_local(paths: &GuiPaths, name: &str) -> Result<Self, String> {
        let hud_data = HudData::load(&paths.hud_save(name))?;
        let module = Module::load(&paths.module_save(name)).map_err(|e| format!("{e:#}"))?;
        let players: Vec<ObjectId> = hud_data
            .players
            .iter()
            .map(|p| ObjectId::new(p.id.clone(), p.serial.clone()))
            .filter(|oid| module.char(oid).is_some())
            .collect();
        if players.is_empty() {
            return Err(format!("Save {name} has no player character"));
        }

        let game = Arc::new(Game::new(mural_core::share(module), Console::new()));
        for oid in players {
            game.add_player_char(oid);
        }
        log::info!("Loaded save {name}");
        Ok(Self {
            game,
            hud_data: Some(hud_data),
        })
    }

    /// Connects to a server and logs in. Player characters arrive with the
    /// server responses; with a `template` a new one is requested.
    pub fn connect(
        address: &str,
        settings: &Settings,
        template: &str,
        char_name: &str,
    ) -> Result<Self, String> {
        let chapter = Chapter {
            id: String::new(),
            name: String::new(),
            areas: Vec::new(),
            start_area: String::new(),
            start_position: Position::default(),
        };
        let module = Module::new("remote", chapter);
        let game = Arc::new(Game::new(mural_core::share(module), Console::new()));
        let link = server::connect(address, Arc::clone(&game))?;
        game.set_server(Some(link));
        game.login(&settings.server_login, &settings.server_password);
        if !template.is_empty() {
            game.new_char(template, char_name);
        }
        Ok(Self {
            game,
            hud_data: None,
        })
    }
}

/// Central application state threaded through every scene.
pub struct AppState {
    pub settings: Settings,
    pub paths: GuiPaths,
    pub i18n: I18n,
    pub assets: AssetRegistry,
    /// Set by the start scene, taken by the game scene.
    pub session: Option<Session>,
}

impl AppState {
    pub fn new(settings: Settings, paths: GuiPaths, i18n: I18n, assets: AssetRegistry) -> Self {
        Self {
            settings,
            paths,
            i18n,
            assets,
            session: None,
        }
    }

    /// Writes the settings back to `.mural` and applies the volumes.
    pub fn settings_changed(&mut self) {
        self.assets.apply_settings(&self.settings);
        if let Err(err) = self.settings.save(Path::new(SETTINGS_FILE_NAME)) {
            log::error!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{CameraData, PlayerData};
    use crate::testing::{pc, test_module};
    use mural_core::types::Character;
    use std::path::PathBuf;

    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new(name: &str) -> Self {
            Self(std::env::temp_dir().join(format!("mural-state-{}-{}", name, std::process::id())))
        }

        fn paths(&self) -> GuiPaths {
            GuiPaths::from_roots(self.0.join("ui"), self.0.join("modules"))
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn new_game_spawns_the_first_template_at_the_start() {
        let root = TempRoot::new("new");
        let paths = root.paths();
        let mut module = test_module();
        module.char_templates.push(Character::new("hero", "", "Hero"));
        module.export(&paths.module_file("prologue")).unwrap();

        let session = Session::new_local(&paths, "prologue", "", "Alda").unwrap();
        let oid = session.game.active_player_char().unwrap();
        let module = session.game.module().read().unwrap();
        let c = module.char(&oid).unwrap();
        assert_eq!(c.id, "hero");
        assert_eq!(c.name, "Alda");
        assert_eq!(c.area, module.chapter.start_area);
        assert!(session.hud_data.is_none());
    }

    #[test]
    fn unknown_template_is_an_error() {
        let root = TempRoot::new("tpl");
        let paths = root.paths();
        test_module().export(&paths.module_file("prologue")).unwrap();
        assert!(Session::new_local(&paths, "prologue", "dragon", "").is_err());
        assert!(Session::new_local(&paths, "missing", "", "").is_err());
    }

    #[test]
    fn saves_restore_players_named_in_the_layouts() {
        let root = TempRoot::new("load");
        let paths = root.paths();
        test_module().export(&paths.module_save("s1")).unwrap();
        let mut data = HudData {
            name: "s1".into(),
            camera: CameraData { x: 1.0, y: 2.0 },
            players: vec![PlayerData {
                id: "player".into(),
                serial: "0".into(),
                inv_slots: Vec::new(),
                bar_slots: Vec::new(),
            }],
        };
        data.save(&paths.hud_save("s1")).unwrap();

        let session = Session::load_local(&paths, "s1").unwrap();
        assert_eq!(session.game.player_chars(), vec![pc()]);
        assert_eq!(session.hud_data, Some(data.clone()));

        data.players[0].id = "ghost".into();
        data.save(&paths.hud_save("s1")).unwrap();
        assert!(Session::load_local(&paths, "s1").is_err());
    }
}
