use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Item;
use crate::constants::DEFAULT_INVENTORY_CAPACITY;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default = "default_capacity")]
    capacity: usize,
    /// Item key → asking price for items offered in trade.
    #[serde(default)]
    trade: BTreeMap<String, i32>,
    /// Keys of items others may loot.
    #[serde(default)]
    loot: BTreeSet<String>,
}

fn default_capacity() -> usize {
    DEFAULT_INVENTORY_CAPACITY
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INVENTORY_CAPACITY)
    }
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            trade: BTreeMap::new(),
            loot: BTreeSet::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn add_item(&mut self, item: Item) -> Result<(), Item> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    pub fn remove_item(&mut self, key: &str) -> Option<Item> {
        let idx = self.items.iter().position(|i| i.key() == key)?;
        self.trade.remove(key);
        self.loot.remove(key);
        Some(self.items.remove(idx))
    }

    pub fn item(&self, id: &str, serial: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id && i.serial == serial)
    }

    pub fn item_by_key(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.item_by_key(key).is_some()
    }

    /// Number of carried items created from template `id`.
    pub fn count(&self, id: &str) -> usize {
        self.items.iter().filter(|i| i.id == id).count()
    }

    /// Removes `amount` items of template `id`; returns false (and removes
    /// nothing) when not enough are carried.
    pub fn take(&mut self, id: &str, amount: usize) -> bool {
        if self.count(id) < amount {
            return false;
        }
        let keys: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.id == id)
            .take(amount)
            .map(Item::key)
            .collect();
        for key in keys {
            self.remove_item(&key);
        }
        true
    }

    pub fn set_trade_price(&mut self, key: &str, price: i32) {
        if self.contains(key) {
            self.trade.insert(key.to_string(), price);
        }
    }

    pub fn trade_price(&self, key: &str) -> Option<i32> {
        self.trade.get(key).copied()
    }

    /// Items offered in trade with their prices, in inventory order.
    pub fn trade_items(&self) -> Vec<(&Item, i32)> {
        self.items
            .iter()
            .filter_map(|i| self.trade.get(&i.key()).map(|p| (i, *p)))
            .collect()
    }

    pub fn set_lootable(&mut self, key: &str, lootable: bool) {
        if lootable && self.contains(key) {
            self.loot.insert(key.to_string());
        } else {
            self.loot.remove(key);
        }
    }

    /// Marks every carried item as lootable (used on death).
    pub fn set_all_lootable(&mut self) {
        let keys: Vec<String> = self.items.iter().map(Item::key).collect();
        self.loot.extend(keys);
    }

    pub fn loot_items(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| self.loot.contains(&i.key()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, MiscData};

    fn misc(id: &str, serial: &str) -> Item {
        Item {
            id: id.into(),
            serial: serial.into(),
            name: id.into(),
            value: 3,
            level: 0,
            kind: ItemKind::Misc(MiscData::default()),
        }
    }

    #[test]
    fn add_respects_capacity() {
        let mut inv = Inventory::with_capacity(1);
        assert!(inv.add_item(misc("apple", "0")).is_ok());
        assert!(inv.add_item(misc("apple", "1")).is_err());
    }

    #[test]
    fn take_is_all_or_nothing() {
        let mut inv = Inventory::default();
        inv.add_item(misc("ore", "0")).unwrap();
        inv.add_item(misc("ore", "1")).unwrap();
        assert!(!inv.take("ore", 3));
        assert_eq!(inv.count("ore"), 2);
        assert!(inv.take("ore", 2));
        assert_eq!(inv.count("ore"), 0);
    }

    #[test]
    fn removing_an_item_drops_its_trade_and_loot_marks() {
        let mut inv = Inventory::default();
        inv.add_item(misc("gem", "0")).unwrap();
        inv.set_trade_price("gem0", 40);
        inv.set_lootable("gem0", true);
        assert_eq!(inv.trade_items().len(), 1);
        assert_eq!(inv.loot_items().len(), 1);
        inv.remove_item("gem0");
        inv.add_item(misc("gem", "0")).unwrap();
        assert!(inv.trade_items().is_empty());
        assert!(inv.loot_items().is_empty());
    }
}
