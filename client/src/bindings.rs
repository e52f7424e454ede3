//! Graphic bindings: which textures, icons and sounds belong to an engine id.
//!
//! Each kind lives in its own directory (`avatars/`, `items/`, `effects/`,
//! `skills/`) as JSON files holding an array of records. Ids without a record
//! get a synthesized default that is registered on first lookup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::filepaths::GuiPaths;

/// Full-body sheet used for avatars without a binding.
pub const DEFAULT_BODY: &str = "default.png";
/// Icon used for items, skills and effects without a binding.
pub const DEFAULT_ICON: &str = "default.png";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AvatarBinding {
    pub id: String,
    #[serde(default)]
    pub portrait: Option<String>,
    #[serde(default)]
    pub torso: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub full_body: Option<String>,
}

impl AvatarBinding {
    pub fn default_for(id: &str) -> Self {
        Self {
            id: id.to_string(),
            portrait: None,
            torso: None,
            head: None,
            full_body: Some(DEFAULT_BODY.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ItemBinding {
    pub id: String,
    pub icon: String,
    /// Weapon overlay sheet drawn over the avatar while equipped.
    #[serde(default)]
    pub spritesheet: Option<String>,
    #[serde(default)]
    pub use_sound: Option<String>,
}

impl ItemBinding {
    pub fn default_for(id: &str) -> Self {
        Self {
            id: id.to_string(),
            icon: DEFAULT_ICON.to_string(),
            spritesheet: None,
            use_sound: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkillBinding {
    pub id: String,
    pub icon: String,
    #[serde(default)]
    pub activation_sound: Option<String>,
}

impl SkillBinding {
    pub fn default_for(id: &str) -> Self {
        Self {
            id: id.to_string(),
            icon: DEFAULT_ICON.to_string(),
            activation_sound: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EffectBinding {
    pub id: String,
    pub icon: String,
}

impl EffectBinding {
    pub fn default_for(id: &str) -> Self {
        Self {
            id: id.to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

trait Binding {
    fn id(&self) -> &str;
}

macro_rules! impl_binding {
    ($($ty:ty),*) => {
        $(impl Binding for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_binding!(AvatarBinding, ItemBinding, SkillBinding, EffectBinding);

fn parse_records<T: DeserializeOwned + Binding>(text: &str) -> Result<Vec<T>, String> {
    serde_json::from_str::<Vec<T>>(text).map_err(|e| e.to_string())
}

fn load_dir<T: DeserializeOwned + Binding>(dir: &Path) -> HashMap<String, T> {
    let mut records = HashMap::new();
    let Ok(entries) = fs::read_dir(dir) else {
        log::warn!("No bindings directory {}", dir.display());
        return records;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_records::<T>(&text));
        match parsed {
            Ok(list) => {
                for record in list {
                    records.insert(record.id().to_string(), record);
                }
            }
            Err(err) => log::error!("Failed to load bindings {}: {err}", path.display()),
        }
    }
    records
}

fn lookup<'a, T>(
    map: &'a mut HashMap<String, T>,
    id: &str,
    kind: &str,
    make: impl FnOnce(&str) -> T,
) -> &'a T {
    map.entry(id.to_string()).or_insert_with(|| {
        log::error!("No {kind} binding for '{id}', using default");
        make(id)
    })
}

#[derive(Debug, Default)]
pub struct Bindings {
    avatars: HashMap<String, AvatarBinding>,
    items: HashMap<String, ItemBinding>,
    skills: HashMap<String, SkillBinding>,
    effects: HashMap<String, EffectBinding>,
}

impl Bindings {
    pub fn load(paths: &GuiPaths) -> Self {
        let bindings = Self {
            avatars: load_dir(&paths.bindings_dir("avatars")),
            items: load_dir(&paths.bindings_dir("items")),
            skills: load_dir(&paths.bindings_dir("skills")),
            effects: load_dir(&paths.bindings_dir("effects")),
        };
        log::info!(
            "Loaded bindings: {} avatars, {} items, {} skills, {} effects",
            bindings.avatars.len(),
            bindings.items.len(),
            bindings.skills.len(),
            bindings.effects.len()
        );
        bindings
    }

    pub fn avatar(&mut self, id: &str) -> &AvatarBinding {
        lookup(&mut self.avatars, id, "avatar", AvatarBinding::default_for)
    }

    pub fn item(&mut self, id: &str) -> &ItemBinding {
        lookup(&mut self.items, id, "item", ItemBinding::default_for)
    }

    pub fn skill(&mut self, id: &str) -> &SkillBinding {
        lookup(&mut self.skills, id, "skill", SkillBinding::default_for)
    }

    pub fn effect(&mut self, id: &str) -> &EffectBinding {
        lookup(&mut self.effects, id, "effect", EffectBinding::default_for)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_avatar_records() {
        let records: Vec<AvatarBinding> = parse_records(
            r#"[{"id":"player","portrait":"hero.png","torso":"torso.png","head":"head.png"}]"#,
        )
        .unwrap();
        assert_eq!(records[0].portrait.as_deref(), Some("hero.png"));
        assert!(records[0].full_body.is_none());
    }

    #[test]
    fn missing_binding_is_synthesized_once() {
        let mut bindings = Bindings::default();
        assert_eq!(bindings.avatar("ghost").full_body.as_deref(), Some(DEFAULT_BODY));
        assert_eq!(bindings.avatars.len(), 1);
        bindings.avatar("ghost");
        assert_eq!(bindings.avatars.len(), 1);
        assert_eq!(bindings.item("rock").icon, DEFAULT_ICON);
    }
}
