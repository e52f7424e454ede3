//! Engine data model consumed by the HUD: characters, areas, items and the
//! module that owns them.

mod area;
mod character;
mod dialog;
mod effect;
mod equipment;
mod inventory;
mod item;
mod log;
mod module;
mod object;
mod quest;
mod requirement;
mod skill;
mod training;

pub use area::{Area, AreaObject, Chapter};
pub use character::{Activation, ActivationKind, Attributes, Cast, Character, UseAction};
pub use dialog::{Dialog, DialogAnswer, DialogModifier, DialogStage, END_STAGE};
pub use effect::{Effect, EffectTemplate, Modifier};
pub use equipment::{EquipSlot, Equipment, EquipmentSlot};
pub use inventory::Inventory;
pub use item::{ArmorData, Item, ItemKind, MiscData, WeaponData, WeaponKind};
pub use log::{Log, LogChannel, LogMessage};
pub use module::{Module, UseError, UseOutcome, UseTarget};
pub use object::{ObjectId, Position};
pub use quest::{Quest, QuestStage};
pub use requirement::Requirements;
pub use skill::{Recipe, Skill, SkillAnimation};
pub use training::{Training, TrainingReward};
