use std::fmt;

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    #[default]
    Human,
    Elf,
    Dwarf,
    Gnome,
    Wolf,
    Goblin,
    Beast,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    LawfulGood,
    NeutralGood,
    ChaoticGood,
    LawfulNeutral,
    #[default]
    TrueNeutral,
    ChaoticNeutral,
    LawfulEvil,
    NeutralEvil,
    ChaoticEvil,
}

/// How a character regards another one. Hostile characters may be attacked
/// and never offer dialogs.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Friendly,
    #[default]
    Neutral,
    Hostile,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Constitution,
    Dexterity,
    Intelligence,
    Wisdom,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Strength,
        Attribute::Constitution,
        Attribute::Dexterity,
        Attribute::Intelligence,
        Attribute::Wisdom,
    ];

    /// Short label used by the character window.
    pub fn short_name(self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Constitution => "CON",
            Attribute::Dexterity => "DEX",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
        }
    }
}

macro_rules! display_as_debug {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}", self)
            }
        })*
    };
}

display_as_debug!(Gender, Race, Alignment, Attitude, Attribute);
