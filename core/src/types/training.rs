use serde::{Deserialize, Serialize};

use super::{Recipe, Requirements, Skill};
use crate::traits::Attribute;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingReward {
    Skill(Skill),
    Recipe(Recipe),
    Attribute(Attribute, i32),
}

/// A lesson a trainer character offers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub requirements: Requirements,
    pub reward: TrainingReward,
}

impl Training {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn describe(&self) -> String {
        match &self.reward {
            TrainingReward::Skill(s) => format!("skill: {}", s.display_name()),
            TrainingReward::Recipe(r) => format!("recipe: {}", r.display_name()),
            TrainingReward::Attribute(a, v) => format!("{} +{}", a.short_name(), v),
        }
    }
}
