use serde::{Deserialize, Serialize};

use super::{EffectTemplate, Item, Requirements};
use crate::constants::ACTION_RANGE;

/// Body animation played when a skill activates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillAnimation {
    Melee,
    Shoot,
    #[default]
    Cast,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cast_ms: u64,
    #[serde(default)]
    pub cooldown_ms: u64,
    #[serde(default = "default_range")]
    pub range: f64,
    #[serde(default)]
    pub mana_cost: i32,
    /// Effects put on the target (or the user when no target is needed).
    #[serde(default)]
    pub effects: Vec<EffectTemplate>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub animation: SkillAnimation,
    #[serde(default)]
    pub needs_target: bool,
}

fn default_range() -> f64 {
    ACTION_RANGE
}

impl Skill {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Crafting recipe. Casting it consumes the required items and creates
/// the results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cast_ms: u64,
    #[serde(default)]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub requirements: Requirements,
    /// Prototypes of produced items; serials are assigned on creation.
    #[serde(default)]
    pub results: Vec<Item>,
}

impl Recipe {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
