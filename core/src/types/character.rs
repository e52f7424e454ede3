//! Character structure - represents both player characters and NPCs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{
    Dialog, Effect, Equipment, Inventory, Log, LogChannel, ObjectId, Position, Quest, Recipe,
    Skill, Training,
};
use crate::constants::{AGONY_HEALTH_RATIO, ARRIVE_EPSILON, DEFAULT_MOVE_SPEED, DEFAULT_SIGHT_RANGE};
use crate::traits::{Alignment, Attitude, Attribute, Gender, Race};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub constitution: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub wisdom: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            constitution: 10,
            dexterity: 10,
            intelligence: 10,
            wisdom: 10,
        }
    }
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Constitution => self.constitution,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
        }
    }

    pub fn add(&mut self, attribute: Attribute, value: i32) {
        let field = match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Wisdom => &mut self.wisdom,
        };
        *field += value;
    }
}

/// Something a character can use. Items are referenced by key
/// (`id + serial`), everything else by template id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseAction {
    /// Weapon attack against the target character.
    Hit,
    Skill(String),
    Recipe(String),
    Item(String),
    Training { trainer: ObjectId, training: String },
}

/// Usable currently being cast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub action: UseAction,
    #[serde(default)]
    pub target: Option<ObjectId>,
    pub elapsed_ms: u64,
    pub cast_ms: u64,
}

impl Cast {
    pub fn is_skill(&self) -> bool {
        matches!(self.action, UseAction::Skill(_))
    }

    pub fn is_recipe(&self) -> bool {
        matches!(self.action, UseAction::Recipe(_))
    }

    pub fn done(&self) -> bool {
        self.elapsed_ms >= self.cast_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    Melee,
    Shoot,
    Spell,
    Craft,
    Item,
}

/// Last usable the character activated. `seq` grows with every activation
/// so observers can tell a repeated attack from the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub seq: u64,
    pub kind: ActivationKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub serial: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub dest: Option<Position>,
    #[serde(default = "default_move_speed")]
    pub move_speed: f64,
    #[serde(default = "default_sight_range")]
    pub sight_range: f64,

    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub race: Race,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub attributes: Attributes,

    pub health: i32,
    pub max_health: i32,
    #[serde(default)]
    pub mana: i32,
    #[serde(default)]
    pub max_mana: i32,

    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub trainings: Vec<Training>,
    #[serde(default)]
    pub dialogs: Vec<Dialog>,
    #[serde(default)]
    pub journal: Vec<Quest>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub flags: BTreeSet<String>,

    /// Attitude towards other characters, keyed by character id.
    #[serde(default)]
    pub attitudes: BTreeMap<String, Attitude>,
    #[serde(default)]
    pub default_attitude: Attitude,
    #[serde(default)]
    pub targets: Vec<ObjectId>,

    #[serde(default)]
    pub cast: Option<Cast>,
    /// Remaining cooldown per skill/recipe id.
    #[serde(default)]
    pub cooldowns: BTreeMap<String, u64>,
    #[serde(default)]
    pub global_cooldown_ms: u64,
    #[serde(default)]
    pub last_activation: Option<Activation>,

    #[serde(default)]
    pub chat_log: Log,
    #[serde(default)]
    pub combat_log: Log,
    #[serde(default)]
    pub private_log: Log,
}

fn default_move_speed() -> f64 {
    DEFAULT_MOVE_SPEED
}

fn default_sight_range() -> f64 {
    DEFAULT_SIGHT_RANGE
}

fn default_level() -> u32 {
    1
}

impl Character {
    pub fn new(id: impl Into<String>, serial: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            serial: serial.into(),
            name: name.into(),
            area: String::new(),
            position: Position::default(),
            dest: None,
            move_speed: DEFAULT_MOVE_SPEED,
            sight_range: DEFAULT_SIGHT_RANGE,
            level: 1,
            experience: 0,
            gender: Gender::default(),
            race: Race::default(),
            alignment: Alignment::default(),
            attributes: Attributes::default(),
            health: 100,
            max_health: 100,
            mana: 50,
            max_mana: 50,
            inventory: Inventory::default(),
            equipment: Equipment::default(),
            skills: Vec::new(),
            recipes: Vec::new(),
            trainings: Vec::new(),
            dialogs: Vec::new(),
            journal: Vec::new(),
            effects: Vec::new(),
            flags: BTreeSet::new(),
            attitudes: BTreeMap::new(),
            default_attitude: Attitude::default(),
            targets: Vec::new(),
            cast: None,
            cooldowns: BTreeMap::new(),
            global_cooldown_ms: 0,
            last_activation: None,
            chat_log: Log::default(),
            combat_log: Log::default(),
            private_log: Log::default(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.id.clone(), self.serial.clone())
    }

    pub fn key(&self) -> String {
        format!("{}{}", self.id, self.serial)
    }

    pub fn is(&self, oid: &ObjectId) -> bool {
        oid.matches(&self.id, &self.serial)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn alive(&self) -> bool {
        self.health > 0
    }

    /// Alive but close to death.
    pub fn agony(&self) -> bool {
        self.alive() && (self.health as f64) <= self.max_health as f64 * AGONY_HEALTH_RATIO
    }

    pub fn moving(&self) -> bool {
        self.dest.is_some()
    }

    pub fn set_dest_point(&mut self, pos: Position) {
        if !self.alive() {
            return;
        }
        self.dest = Some(pos);
    }

    /// Walks to the point `range` units left of `target`.
    pub fn move_close_to(&mut self, target: Position, range: f64) {
        self.set_dest_point(Position::new(target.x - range, target.y));
    }

    pub fn set_position(&mut self, pos: Position) {
        self.position = pos;
        self.dest = None;
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag) || self.effects.iter().any(|e| e.flags().any(|f| f == flag))
    }

    pub fn attitude_towards(&self, other: &Character) -> Attitude {
        if self.key() == other.key() {
            return Attitude::Friendly;
        }
        self.attitudes
            .get(&other.id)
            .copied()
            .unwrap_or(self.default_attitude)
    }

    /// Dialogs this character can start with `talker`.
    pub fn dialogs_for(&self, talker: &Character) -> Vec<&Dialog> {
        self.dialogs.iter().filter(|d| d.available_for(talker)).collect()
    }

    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn training(&self, id: &str) -> Option<&Training> {
        self.trainings.iter().find(|t| t.id == id)
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.journal.iter().find(|q| q.id == id)
    }

    pub fn cooldown(&self, id: &str) -> u64 {
        self.cooldowns.get(id).copied().unwrap_or(0)
    }

    pub fn on_cooldown(&self, id: &str) -> bool {
        self.cooldown(id) > 0
    }

    pub fn casting(&self) -> bool {
        self.cast.is_some()
    }

    pub fn log(&self, channel: LogChannel) -> &Log {
        match channel {
            LogChannel::Chat => &self.chat_log,
            LogChannel::Combat => &self.combat_log,
            LogChannel::Private => &self.private_log,
        }
    }

    /// Records an activation and returns its sequence number.
    pub fn activate(&mut self, kind: ActivationKind) -> u64 {
        let seq = self.last_activation.map(|a| a.seq + 1).unwrap_or(1);
        self.last_activation = Some(Activation { seq, kind });
        seq
    }

    pub fn heal(&mut self, amount: i32) {
        if !self.alive() {
            return;
        }
        self.health = (self.health + amount).clamp(0, self.max_health);
    }

    /// Applies damage; returns true if this killed the character.
    pub fn damage(&mut self, amount: i32) -> bool {
        if !self.alive() {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.alive() {
            return false;
        }
        self.die();
        true
    }

    pub fn restore_mana(&mut self, amount: i32) {
        self.mana = (self.mana + amount).clamp(0, self.max_mana);
    }

    fn die(&mut self) {
        self.dest = None;
        self.cast = None;
        self.targets.clear();
        self.effects.clear();
        self.inventory.set_all_lootable();
    }

    /// Advances movement, timers and effects by `delta_ms`. Returns the cast
    /// that finished during this step so the module can resolve it.
    pub fn update(&mut self, delta_ms: u64) -> Option<Cast> {
        if !self.alive() {
            return None;
        }

        if let Some(dest) = self.dest {
            let step = self.move_speed * delta_ms as f64 / 1000.0;
            self.position = self.position.step_towards(&dest, step);
            if self.position.distance(&dest) <= ARRIVE_EPSILON {
                self.position = dest;
                self.dest = None;
            }
        }

        self.global_cooldown_ms = self.global_cooldown_ms.saturating_sub(delta_ms);
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(delta_ms);
            *remaining > 0
        });

        let mut health = 0;
        for effect in self.effects.iter_mut() {
            health += effect.update(delta_ms);
        }
        self.effects.retain(|e| !e.expired());
        if health > 0 {
            self.heal(health);
        } else if health < 0 {
            self.damage(-health);
            if !self.alive() {
                return None;
            }
        }

        let finished = match self.cast.as_mut() {
            Some(cast) => {
                cast.elapsed_ms = (cast.elapsed_ms + delta_ms).min(cast.cast_ms);
                cast.done()
            }
            None => false,
        };
        if finished { self.cast.take() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EffectTemplate, Modifier};

    #[test]
    fn agony_below_tenth_of_health() {
        let mut c = Character::new("hero", "0", "Hero");
        c.health = 10;
        assert!(c.agony());
        c.health = 11;
        assert!(!c.agony());
        c.health = 0;
        assert!(!c.agony());
        assert!(!c.alive());
    }

    #[test]
    fn moves_towards_destination_and_stops() {
        let mut c = Character::new("hero", "0", "Hero");
        c.move_speed = 100.0;
        c.set_dest_point(Position::new(50.0, 0.0));
        c.update(250);
        assert_eq!(c.position, Position::new(25.0, 0.0));
        assert!(c.moving());
        c.update(1000);
        assert_eq!(c.position, Position::new(50.0, 0.0));
        assert!(!c.moving());
    }

    #[test]
    fn move_close_to_stops_left_of_target() {
        let mut c = Character::new("hero", "0", "Hero");
        c.move_close_to(Position::new(200.0, 30.0), 50.0);
        assert_eq!(c.dest, Some(Position::new(150.0, 30.0)));
    }

    #[test]
    fn dead_characters_do_not_move() {
        let mut c = Character::new("hero", "0", "Hero");
        c.damage(500);
        c.set_dest_point(Position::new(10.0, 10.0));
        assert!(c.dest.is_none());
    }

    #[test]
    fn cast_finishes_after_cast_time() {
        let mut c = Character::new("hero", "0", "Hero");
        c.cast = Some(Cast {
            action: UseAction::Skill("fireball".into()),
            target: None,
            elapsed_ms: 0,
            cast_ms: 1_000,
        });
        assert!(c.update(600).is_none());
        let done = c.update(600).unwrap();
        assert!(done.is_skill());
        assert!(!c.casting());
    }

    #[test]
    fn effect_flags_count_as_character_flags() {
        let mut c = Character::new("hero", "0", "Hero");
        let template = EffectTemplate {
            id: "stealth".into(),
            name: String::new(),
            duration_ms: Some(1_000),
            modifiers: vec![Modifier::Flag("hidden".into())],
        };
        c.effects.push(Effect::from_template(&template, "0".into(), None));
        assert!(c.has_flag("hidden"));
        c.update(1_000);
        assert!(!c.has_flag("hidden"));
    }

    #[test]
    fn activation_sequence_increases() {
        let mut c = Character::new("hero", "0", "Hero");
        assert_eq!(c.activate(ActivationKind::Melee), 1);
        assert_eq!(c.activate(ActivationKind::Melee), 2);
        assert_eq!(c.last_activation.map(|a| a.kind), Some(ActivationKind::Melee));
    }

    #[test]
    fn death_marks_inventory_lootable() {
        let mut c = Character::new("wolf", "3", "Wolf");
        c.inventory
            .add_item(crate::types::Item {
                id: "pelt".into(),
                serial: "0".into(),
                name: String::new(),
                value: 5,
                level: 0,
                kind: crate::types::ItemKind::Misc(Default::default()),
            })
            .unwrap();
        assert!(c.damage(1_000));
        assert_eq!(c.inventory.loot_items().len(), 1);
    }
}
