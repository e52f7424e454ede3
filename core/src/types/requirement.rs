use serde::{Deserialize, Serialize};

use super::Character;
use crate::traits::Gender;

/// Conditions a character must meet to use a skill, answer a dialog line,
/// start a training or craft a recipe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<i32>,
    /// Item template ids and the amount that must be carried.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<(String, u32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_flags: Vec<String>,
    /// Quest id that must already be completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_completed: Option<String>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        *self == Requirements::default()
    }

    pub fn met_by(&self, c: &Character) -> bool {
        if let Some(level) = self.level {
            if c.level < level {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if c.gender != gender {
                return false;
            }
        }
        if let Some(mana) = self.mana {
            if c.mana < mana {
                return false;
            }
        }
        for (item_id, amount) in &self.items {
            if c.inventory.count(item_id) < *amount as usize {
                return false;
            }
        }
        if !self.flags.iter().all(|f| c.has_flag(f)) {
            return false;
        }
        if self.no_flags.iter().any(|f| c.has_flag(f)) {
            return false;
        }
        if let Some(quest) = &self.quest_completed {
            if !c.journal.iter().any(|q| &q.id == quest && q.completed) {
                return false;
            }
        }
        true
    }
}
