//! Per-player slot layouts and the persisted HUD save record.

use std::fs;
use std::path::Path;

use mural_core::constants::WILDCARD_ID;
use serde::{Deserialize, Serialize};

/// Number of inventory slots.
pub const INV_SLOTS: usize = 90;
/// Number of action bar slots.
pub const BAR_SLOTS: usize = 10;

/// Slot assignments of one player character. Keys are `id + serial` of the
/// placed object, kept in the order they were first placed. Entries may
/// outlive the objects they name; readers skip keys they cannot resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    inv: Vec<(String, usize)>,
    bar: Vec<(String, usize)>,
}

fn save_slot(slots: &mut Vec<(String, usize)>, key: &str, slot: i32, count: usize) -> bool {
    if slot < 0 || slot as usize >= count {
        log::debug!("Rejected slot {slot} for {key}");
        return false;
    }
    let slot = slot as usize;
    slots.retain(|(k, s)| *s != slot || k == key);
    match slots.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = slot,
        None => slots.push((key.to_string(), slot)),
    }
    true
}

fn slot_of(slots: &[(String, usize)], key: &str) -> i32 {
    slots
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, s)| *s as i32)
        .unwrap_or(-1)
}

fn slot_content(slots: &[(String, usize)], slot: usize) -> Option<&str> {
    slots
        .iter()
        .find(|(_, s)| *s == slot)
        .map(|(k, _)| k.as_str())
}

fn slots_data(slots: &[(String, usize)]) -> Vec<SlotData> {
    slots
        .iter()
        .map(|(k, s)| SlotData {
            id: *s as i32,
            content: k.clone(),
        })
        .collect()
}

impl Layout {
    /// Places `key` in inventory slot `slot`, evicting whatever was there.
    /// Out of range slots are rejected.
    pub fn save_inv_slot(&mut self, key: &str, slot: i32) -> bool {
        save_slot(&mut self.inv, key, slot, INV_SLOTS)
    }

    /// Places `key` in bar slot `slot`, evicting whatever was there.
    pub fn save_bar_slot(&mut self, key: &str, slot: i32) -> bool {
        save_slot(&mut self.bar, key, slot, BAR_SLOTS)
    }

    /// Inventory slot of `key`, or -1.
    pub fn inv_slot_id(&self, key: &str) -> i32 {
        slot_of(&self.inv, key)
    }

    /// Bar slot of `key`, or -1.
    pub fn bar_slot_id(&self, key: &str) -> i32 {
        slot_of(&self.bar, key)
    }

    pub fn inv_content(&self, slot: usize) -> Option<&str> {
        slot_content(&self.inv, slot)
    }

    pub fn bar_content(&self, slot: usize) -> Option<&str> {
        slot_content(&self.bar, slot)
    }

    pub fn clear_bar_slot(&mut self, slot: usize) {
        self.bar.retain(|(_, s)| *s != slot);
    }

    pub fn clear_inv(&mut self) {
        self.inv.clear();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotData {
    pub id: i32,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlayerData {
    pub id: String,
    pub serial: String,
    #[serde(default)]
    pub inv_slots: Vec<SlotData>,
    #[serde(default)]
    pub bar_slots: Vec<SlotData>,
}

/// Persisted HUD state, written to `hud/<name>.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HudData {
    pub name: String,
    #[serde(default)]
    pub camera: CameraData,
    #[serde(default)]
    pub players: Vec<PlayerData>,
}

impl HudData {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read HUD save {}: {err}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|err| format!("Failed to parse HUD save {}: {err}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|err| format!("Failed to create save dir {}: {err}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| format!("Failed to serialize HUD save: {err}"))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|err| {
            format!("Failed to write HUD save temp file {}: {err}", tmp_path.display())
        })?;
        fs::rename(&tmp_path, path)
            .map_err(|err| format!("Failed to replace HUD save {}: {err}", path.display()))
    }
}

/// Layouts of every player character, keyed by `(id, serial)` in the order
/// the players first appeared.
#[derive(Clone, Debug, Default)]
pub struct LayoutStore {
    layouts: Vec<((String, String), Layout)>,
}

impl LayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &str, serial: &str) -> Option<usize> {
        self.layouts
            .iter()
            .position(|((i, s), _)| i == id && s == serial)
    }

    /// Layout of a player, copied from the default template on first use.
    pub fn layout(&mut self, id: &str, serial: &str) -> &mut Layout {
        let index = match self.position(id, serial) {
            Some(index) => index,
            None => {
                let template = self.default_template().cloned().unwrap_or_default();
                self.layouts
                    .push(((id.to_string(), serial.to_string()), template));
                self.layouts.len() - 1
            }
        };
        &mut self.layouts[index].1
    }

    /// Layout of a player without materializing it.
    pub fn get(&self, id: &str, serial: &str) -> Option<&Layout> {
        self.position(id, serial).map(|index| &self.layouts[index].1)
    }

    fn default_template(&self) -> Option<&Layout> {
        self.layouts
            .iter()
            .find(|((id, _), _)| id == WILDCARD_ID)
            .map(|(_, layout)| layout)
    }

    /// Replaces every layout with the ones recorded in `players`.
    pub fn apply(&mut self, players: &[PlayerData]) {
        self.layouts.clear();
        for player in players {
            let layout = self.layout(&player.id, &player.serial);
            *layout = Layout::default();
            for slot in &player.inv_slots {
                layout.save_inv_slot(&slot.content, slot.id);
            }
            for slot in &player.bar_slots {
                layout.save_bar_slot(&slot.content, slot.id);
            }
        }
    }

    /// Every layout as save records, in the order they were recorded.
    pub fn players(&self) -> Vec<PlayerData> {
        self.layouts
            .iter()
            .map(|((id, serial), layout)| PlayerData {
                id: id.clone(),
                serial: serial.clone(),
                inv_slots: slots_data(&layout.inv),
                bar_slots: slots_data(&layout.bar),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_slots_are_rejected() {
        let mut layout = Layout::default();
        assert!(!layout.save_bar_slot("sword1", 10));
        assert!(!layout.save_bar_slot("sword1", -1));
        assert!(!layout.save_inv_slot("sword1", INV_SLOTS as i32));
        assert_eq!(layout.bar_slot_id("sword1"), -1);
        assert!(layout.save_bar_slot("sword1", 9));
        assert_eq!(layout.bar_slot_id("sword1"), 9);
    }

    #[test]
    fn saving_into_an_occupied_slot_evicts_it() {
        let mut layout = Layout::default();
        layout.save_inv_slot("sword1", 3);
        layout.save_inv_slot("potion2", 3);
        assert_eq!(layout.inv_slot_id("sword1"), -1);
        assert_eq!(layout.inv_content(3), Some("potion2"));

        layout.save_inv_slot("potion2", 4);
        assert_eq!(layout.inv_content(3), None);
        assert_eq!(layout.inv_content(4), Some("potion2"));
    }

    #[test]
    fn new_players_start_from_default_template() {
        let mut store = LayoutStore::new();
        store.layout(WILDCARD_ID, WILDCARD_ID).save_bar_slot("fireball", 0);
        let layout = store.layout("player", "0");
        assert_eq!(layout.bar_slot_id("fireball"), 0);

        layout.save_bar_slot("heal", 0);
        assert_eq!(
            store.layout(WILDCARD_ID, WILDCARD_ID).bar_content(0),
            Some("fireball")
        );
    }

    #[test]
    fn apply_then_players_keeps_the_recorded_order() {
        let players = vec![
            PlayerData {
                id: "player".into(),
                serial: "0".into(),
                inv_slots: vec![
                    SlotData { id: 12, content: "potion7".into() },
                    SlotData { id: 0, content: "sword1".into() },
                ],
                bar_slots: vec![SlotData { id: 2, content: "fireball".into() }],
            },
            PlayerData {
                id: "archer".into(),
                serial: "3".into(),
                inv_slots: Vec::new(),
                bar_slots: vec![SlotData { id: 0, content: "bow4".into() }],
            },
        ];
        let mut store = LayoutStore::new();
        store.apply(&players);
        assert_eq!(store.players(), players);
    }

    #[test]
    fn hud_data_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("mural-layout-{}", std::process::id()));
        let path = dir.join("hud").join("test01.json");
        let data = HudData {
            name: "test01".into(),
            camera: CameraData { x: 120.0, y: -32.5 },
            players: vec![PlayerData {
                id: "player".into(),
                serial: "0".into(),
                inv_slots: vec![SlotData { id: 1, content: "sword1".into() }],
                bar_slots: Vec::new(),
            }],
        };
        data.save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"inv-slots\""));
        assert_eq!(HudData::load(&path).unwrap(), data);
        fs::remove_dir_all(dir).unwrap();
    }
}
