//! Item structure - weapons, armor and miscellaneous carried objects

use serde::{Deserialize, Serialize};

use super::{EffectTemplate, EquipSlot, ObjectId};
use crate::constants::ACTION_RANGE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    #[default]
    Melee,
    Ranged,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub damage: (i32, i32),
    #[serde(default = "default_weapon_range")]
    pub range: f64,
    #[serde(default)]
    pub kind: WeaponKind,
    #[serde(default = "default_weapon_slots")]
    pub slots: Vec<EquipSlot>,
}

fn default_weapon_range() -> f64 {
    ACTION_RANGE
}

fn default_weapon_slots() -> Vec<EquipSlot> {
    vec![EquipSlot::MainHand]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmorData {
    pub armor: i32,
    pub slots: Vec<EquipSlot>,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct MiscData {
    /// Removed from the inventory after one use.
    #[serde(default)]
    pub consumable: bool,
    /// Effects applied to the user on use; an empty list means not usable.
    #[serde(default)]
    pub use_effects: Vec<EffectTemplate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon(WeaponData),
    Armor(ArmorData),
    Misc(MiscData),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub serial: String,
    #[serde(default)]
    pub name: String,
    /// Base trade value.
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub level: u32,
    pub kind: ItemKind,
}

impl Item {
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.id.clone(), self.serial.clone())
    }

    pub fn key(&self) -> String {
        format!("{}{}", self.id, self.serial)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn equipable(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon(_) | ItemKind::Armor(_))
    }

    /// Slots this item can be worn in; empty for misc items.
    pub fn slots(&self) -> &[EquipSlot] {
        match &self.kind {
            ItemKind::Weapon(w) => &w.slots,
            ItemKind::Armor(a) => &a.slots,
            ItemKind::Misc(_) => &[],
        }
    }

    pub fn weapon(&self) -> Option<&WeaponData> {
        match &self.kind {
            ItemKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn misc(&self) -> Option<&MiscData> {
        match &self.kind {
            ItemKind::Misc(m) => Some(m),
            _ => None,
        }
    }

    /// A misc item with use effects.
    pub fn usable(&self) -> bool {
        self.misc().is_some_and(|m| !m.use_effects.is_empty())
    }

    pub fn consumable(&self) -> bool {
        self.misc().is_some_and(|m| m.consumable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> Item {
        Item {
            id: "potion".into(),
            serial: "3".into(),
            name: String::new(),
            value: 10,
            level: 0,
            kind: ItemKind::Misc(MiscData {
                consumable: true,
                use_effects: vec![EffectTemplate {
                    id: "heal".into(),
                    name: "Heal".into(),
                    duration_ms: Some(0),
                    modifiers: vec![super::super::Modifier::Health(20)],
                }],
            }),
        }
    }

    #[test]
    fn misc_item_with_effects_is_usable_and_consumable() {
        let item = potion();
        assert!(item.usable());
        assert!(item.consumable());
        assert!(!item.equipable());
        assert_eq!(item.display_name(), "potion");
        assert_eq!(item.key(), "potion3");
    }

    #[test]
    fn weapon_defaults_to_main_hand_and_action_range() {
        let json = r#"{"id":"sword","serial":"0","kind":{"weapon":{"damage":[2,5]}}}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        let weapon = item.weapon().unwrap();
        assert_eq!(weapon.range, ACTION_RANGE);
        assert_eq!(item.slots(), &[EquipSlot::MainHand]);
        assert!(item.equipable());
    }
}
