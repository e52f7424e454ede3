use serde::{Deserialize, Serialize};

use super::Item;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipSlot {
    Head,
    Neck,
    Chest,
    Hands,
    MainHand,
    OffHand,
    Finger,
    Legs,
    Feet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    pub slot: EquipSlot,
    /// Key (`id + serial`) of the item worn here.
    pub item: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    slots: Vec<EquipmentSlot>,
}

impl Default for Equipment {
    fn default() -> Self {
        use EquipSlot::*;
        let slots = [Head, Neck, Chest, Hands, MainHand, OffHand, Finger, Finger, Legs, Feet]
            .into_iter()
            .map(|slot| EquipmentSlot { slot, item: None })
            .collect();
        Self { slots }
    }
}

impl Equipment {
    pub fn slots(&self) -> &[EquipmentSlot] {
        &self.slots
    }

    pub fn equipped(&self, item_key: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.item.as_deref() == Some(item_key))
    }

    /// Key of the item in the main hand.
    pub fn weapon(&self) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.slot == EquipSlot::MainHand)
            .and_then(|s| s.item.as_deref())
    }

    /// Wears `item` in the first compatible slot, preferring empty ones.
    /// Returns false if the item has no slot on this equipment.
    pub fn equip(&mut self, item: &Item) -> bool {
        let key = item.key();
        if self.equipped(&key) {
            return true;
        }
        let compatible = |s: &EquipmentSlot| item.slots().contains(&s.slot);
        let idx = self
            .slots
            .iter()
            .position(|s| compatible(s) && s.item.is_none())
            .or_else(|| self.slots.iter().position(compatible));
        match idx {
            Some(idx) => {
                self.slots[idx].item = Some(key);
                true
            }
            None => false,
        }
    }

    pub fn unequip(&mut self, item_key: &str) -> bool {
        let mut found = false;
        for slot in self.slots.iter_mut() {
            if slot.item.as_deref() == Some(item_key) {
                slot.item = None;
                found = true;
            }
        }
        found
    }

    pub fn item_keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.item.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, WeaponData, WeaponKind};

    fn sword(serial: &str) -> Item {
        Item {
            id: "sword".into(),
            serial: serial.into(),
            name: "Sword".into(),
            value: 5,
            level: 1,
            kind: ItemKind::Weapon(WeaponData {
                damage: (1, 4),
                range: 50.0,
                kind: WeaponKind::Melee,
                slots: vec![EquipSlot::MainHand],
            }),
        }
    }

    #[test]
    fn equip_replaces_item_in_single_slot() {
        let mut eq = Equipment::default();
        assert!(eq.equip(&sword("0")));
        assert_eq!(eq.weapon(), Some("sword0"));
        assert!(eq.equip(&sword("1")));
        assert_eq!(eq.weapon(), Some("sword1"));
        assert!(!eq.equipped("sword0"));
    }

    #[test]
    fn unequip_clears_slot() {
        let mut eq = Equipment::default();
        eq.equip(&sword("0"));
        assert!(eq.unequip("sword0"));
        assert_eq!(eq.weapon(), None);
        assert!(!eq.unequip("sword0"));
    }
}
