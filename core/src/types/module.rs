//! The module: every character, area and clock of a running game. This is
//! the in-process model ticked locally or replaced by server updates.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    ActivationKind, Area, Cast, Chapter, Character, DialogModifier, Effect, EffectTemplate,
    Inventory, Item, Modifier, ObjectId, Position, SkillAnimation, TrainingReward, UseAction,
    WeaponKind,
};
use crate::constants::{ACTION_RANGE, DIALOG_RANGE, GLOBAL_COOLDOWN_MS, TIME_SCALE};
use crate::traits::Attitude;

/// Reasons the module refuses a use.
#[derive(Clone, Debug, PartialEq)]
pub enum UseError {
    NotFound,
    Requirements,
    Cooldown,
    /// Target is further than `range`; `target` is where it stands.
    Range { range: f64, target: Position },
    Busy,
    Dead,
    NoTarget,
}

impl UseError {
    /// Translation id of the message shown to the player.
    pub fn text_id(&self) -> &'static str {
        match self {
            UseError::NotFound | UseError::NoTarget | UseError::Busy | UseError::Dead => {
                "cant_do_right_now"
            }
            UseError::Requirements => "req_not_meet",
            UseError::Cooldown => "on_cooldown",
            UseError::Range { .. } => "tar_too_far",
        }
    }
}

impl fmt::Display for UseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseError::NotFound => write!(f, "object not found"),
            UseError::Requirements => write!(f, "requirements not met"),
            UseError::Cooldown => write!(f, "on cooldown"),
            UseError::Range { range, .. } => write!(f, "target out of range ({range})"),
            UseError::Busy => write!(f, "busy"),
            UseError::Dead => write!(f, "user is dead"),
            UseError::NoTarget => write!(f, "no valid target"),
        }
    }
}

impl std::error::Error for UseError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    /// A cast started and resolves on a later tick.
    Casting,
    Done,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum UseTarget {
    /// The user's first target, or the user itself for self-cast skills.
    #[default]
    Auto,
    Char(ObjectId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub chapter: Chapter,
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Prototypes for `spawn_char`.
    #[serde(default)]
    pub char_templates: Vec<Character>,
    /// In-world seconds since the module started.
    #[serde(default = "default_clock")]
    pub clock_secs: f64,
    /// Module-wide messages.
    #[serde(default)]
    pub log: super::Log,
    #[serde(default)]
    next_serial: u64,
}

fn default_clock() -> f64 {
    8.0 * 3600.0
}

impl Module {
    pub fn new(id: impl Into<String>, chapter: Chapter) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            chapter,
            characters: Vec::new(),
            char_templates: Vec::new(),
            clock_secs: default_clock(),
            log: super::Log::default(),
            next_serial: 0,
        }
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let mut module: Module = serde_json::from_str(text)?;
        let highest = module
            .characters
            .iter()
            .filter_map(|c| c.serial.parse::<u64>().ok())
            .max()
            .map(|s| s + 1)
            .unwrap_or(0);
        module.next_serial = module.next_serial.max(highest);
        Ok(module)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read module {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse module {}", path.display()))
    }

    /// Writes the module state; the parent directory is created if needed.
    pub fn export(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, self.to_json()?)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("Failed to move {}", path.display()))?;
        Ok(())
    }

    pub fn next_serial(&mut self) -> String {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial.to_string()
    }

    /// In-world hour of day, 0..24.
    pub fn hour(&self) -> u32 {
        ((self.clock_secs / 3600.0) as u64 % 24) as u32
    }

    pub fn set_hour(&mut self, hour: u32) {
        let day = (self.clock_secs / 86_400.0).floor();
        self.clock_secs = day * 86_400.0 + (hour % 24) as f64 * 3600.0;
    }

    pub fn area(&self, id: &str) -> Option<&Area> {
        self.chapter.area(id)
    }

    pub fn char(&self, oid: &ObjectId) -> Option<&Character> {
        self.characters.iter().find(|c| c.is(oid))
    }

    pub fn char_mut(&mut self, oid: &ObjectId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.is(oid))
    }

    fn char_index(&self, oid: &ObjectId) -> Option<usize> {
        self.characters.iter().position(|c| c.is(oid))
    }

    fn two_mut(&mut self, a: usize, b: usize) -> (&mut Character, &mut Character) {
        debug_assert_ne!(a, b);
        if a < b {
            let (left, right) = self.characters.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.characters.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    pub fn area_chars<'a>(&'a self, area: &'a str) -> impl Iterator<Item = &'a Character> + 'a {
        self.characters.iter().filter(move |c| c.area == area)
    }

    /// Adds a character, assigning a serial when it has none.
    pub fn add_char(&mut self, mut character: Character) -> ObjectId {
        if character.serial.is_empty() || self.char(&character.object_id()).is_some() {
            character.serial = self.next_serial();
        }
        let oid = character.object_id();
        log::debug!("Character {} added to area '{}'", oid, character.area);
        self.characters.push(character);
        oid
    }

    pub fn spawn_char(
        &mut self,
        template_id: &str,
        area: &str,
        position: Position,
    ) -> anyhow::Result<ObjectId> {
        if self.area(area).is_none() {
            bail!("Unknown area: {}", area);
        }
        let Some(template) = self.char_templates.iter().find(|c| c.id == template_id) else {
            bail!("Unknown character template: {}", template_id);
        };
        let mut character = template.clone();
        character.serial = String::new();
        character.area = area.to_string();
        character.set_position(position);
        Ok(self.add_char(character))
    }

    pub fn chat(&mut self, oid: &ObjectId, text: &str) -> anyhow::Result<()> {
        let Some(c) = self.char_mut(oid) else {
            bail!("Character not found: {}", oid);
        };
        c.chat_log.add(text);
        Ok(())
    }

    pub fn set_targets(&mut self, oid: &ObjectId, targets: Vec<ObjectId>) -> anyhow::Result<()> {
        let Some(c) = self.char_mut(oid) else {
            bail!("Character not found: {}", oid);
        };
        c.targets = targets;
        Ok(())
    }

    /// Advances the module clock and every character by `delta_ms`.
    pub fn update(&mut self, delta_ms: u64) {
        self.clock_secs += delta_ms as f64 / 1000.0 * TIME_SCALE;
        for idx in 0..self.characters.len() {
            if let Some(cast) = self.characters[idx].update(delta_ms) {
                self.resolve_cast(idx, cast);
            }
        }
    }

    fn resolve_cast(&mut self, user: usize, cast: Cast) {
        let target = cast.target.as_ref().and_then(|t| self.char_index(t));
        let result = match &cast.action {
            UseAction::Skill(id) => self.resolve_skill(user, id, target),
            UseAction::Recipe(id) => self.resolve_recipe(user, id),
            other => {
                log::warn!("Unexpected cast action: {:?}", other);
                Ok(())
            }
        };
        if let Err(err) = result {
            let c = &mut self.characters[user];
            log::debug!("Cast of {} failed: {}", c.object_id(), err);
            c.private_log.add_translated(err.text_id());
        }
    }

    /// Uses `action` as character `user`.
    pub fn use_action(
        &mut self,
        user: &ObjectId,
        action: UseAction,
        target: UseTarget,
    ) -> Result<UseOutcome, UseError> {
        let ui = self.char_index(user).ok_or(UseError::NotFound)?;
        let u = &self.characters[ui];
        if !u.alive() {
            return Err(UseError::Dead);
        }
        if u.casting() {
            return Err(UseError::Busy);
        }
        let ti = match &target {
            UseTarget::Char(oid) => Some(self.char_index(oid).ok_or(UseError::NotFound)?),
            UseTarget::Auto => u.targets.first().and_then(|t| self.char_index(t)),
        };

        match action {
            UseAction::Hit => {
                let ti = ti.filter(|t| *t != ui).ok_or(UseError::NoTarget)?;
                self.hit(ui, ti).map(|_| UseOutcome::Done)
            }
            UseAction::Skill(id) => self.use_skill(ui, &id, ti),
            UseAction::Recipe(id) => self.use_recipe(ui, &id),
            UseAction::Item(key) => self.use_item(ui, &key).map(|_| UseOutcome::Done),
            UseAction::Training { trainer, training } => self
                .train(ui, &trainer, &training)
                .map(|_| UseOutcome::Done),
        }
    }

    /// Range and damage of the user's equipped weapon, or bare hands.
    fn weapon_of(c: &Character) -> ((i32, i32), f64, WeaponKind) {
        c.equipment
            .weapon()
            .and_then(|key| c.inventory.item_by_key(key))
            .and_then(Item::weapon)
            .map(|w| (w.damage, w.range, w.kind))
            .unwrap_or(((1, 2), ACTION_RANGE, WeaponKind::Melee))
    }

    fn roll((min, max): (i32, i32)) -> i32 {
        if max <= min {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        }
    }

    fn hit(&mut self, ui: usize, ti: usize) -> Result<(), UseError> {
        let (damage, range, kind) = Self::weapon_of(&self.characters[ui]);
        let (user, target) = self.two_mut(ui, ti);
        if user.global_cooldown_ms > 0 {
            return Err(UseError::Cooldown);
        }
        if !target.alive() {
            return Err(UseError::NoTarget);
        }
        if user.position.distance(&target.position) > range {
            return Err(UseError::Range {
                range,
                target: target.position,
            });
        }

        user.global_cooldown_ms = GLOBAL_COOLDOWN_MS;
        user.activate(match kind {
            WeaponKind::Melee => ActivationKind::Melee,
            WeaponKind::Ranged => ActivationKind::Shoot,
        });
        let amount = Self::roll(damage);
        let killed = Self::strike(user, target, amount);
        if killed {
            user.experience += 10 * target.level as u64;
        }
        Ok(())
    }

    /// Deals damage and writes the combat logs; returns true on a kill.
    fn strike(user: &mut Character, target: &mut Character, amount: i32) -> bool {
        target
            .attitudes
            .insert(user.id.clone(), Attitude::Hostile);
        let killed = target.damage(amount);
        let attacker = user.display_name().to_string();
        let victim = target.display_name().to_string();
        user.combat_log
            .add(format!("{} hits {} for {}", attacker, victim, amount));
        target
            .combat_log
            .add(format!("{} hits you for {}", attacker, amount));
        if killed {
            user.combat_log.add(format!("{} dies", victim));
        }
        killed
    }

    fn use_skill(&mut self, ui: usize, id: &str, ti: Option<usize>) -> Result<UseOutcome, UseError> {
        let u = &self.characters[ui];
        let skill = u.skill(id).ok_or(UseError::NotFound)?;
        if !skill.requirements.met_by(u) || u.mana < skill.mana_cost {
            return Err(UseError::Requirements);
        }
        if u.global_cooldown_ms > 0 || u.on_cooldown(id) {
            return Err(UseError::Cooldown);
        }
        if skill.needs_target {
            let t = ti.ok_or(UseError::NoTarget)?;
            let target = &self.characters[t];
            if !target.alive() {
                return Err(UseError::NoTarget);
            }
            if u.position.distance(&target.position) > skill.range {
                return Err(UseError::Range {
                    range: skill.range,
                    target: target.position,
                });
            }
        }
        if skill.cast_ms > 0 {
            let cast = Cast {
                action: UseAction::Skill(skill.id.clone()),
                target: ti.map(|t| self.characters[t].object_id()),
                elapsed_ms: 0,
                cast_ms: skill.cast_ms,
            };
            self.characters[ui].cast = Some(cast);
            return Ok(UseOutcome::Casting);
        }
        self.resolve_skill(ui, id, ti)?;
        Ok(UseOutcome::Done)
    }

    fn resolve_skill(&mut self, ui: usize, id: &str, ti: Option<usize>) -> Result<(), UseError> {
        let skill = self.characters[ui]
            .skill(id)
            .cloned()
            .ok_or(UseError::NotFound)?;
        if skill.needs_target && ti.is_none_or(|t| !self.characters[t].alive()) {
            return Err(UseError::NoTarget);
        }
        let u = &mut self.characters[ui];
        u.mana -= skill.mana_cost;
        if skill.cooldown_ms > 0 {
            u.cooldowns.insert(skill.id.clone(), skill.cooldown_ms);
        }
        u.global_cooldown_ms = GLOBAL_COOLDOWN_MS;
        u.activate(match skill.animation {
            SkillAnimation::Melee => ActivationKind::Melee,
            SkillAnimation::Shoot => ActivationKind::Shoot,
            SkillAnimation::Cast => ActivationKind::Spell,
        });
        let target = if skill.needs_target { ti.unwrap_or(ui) } else { ui };
        for effect in &skill.effects {
            self.apply_effect(target, effect, Some(ui));
        }
        Ok(())
    }

    fn use_recipe(&mut self, ui: usize, id: &str) -> Result<UseOutcome, UseError> {
        let u = &self.characters[ui];
        let recipe = u.recipe(id).ok_or(UseError::NotFound)?;
        if !recipe.requirements.met_by(u) {
            return Err(UseError::Requirements);
        }
        if u.global_cooldown_ms > 0 || u.on_cooldown(id) {
            return Err(UseError::Cooldown);
        }
        if recipe.cast_ms > 0 {
            let cast = Cast {
                action: UseAction::Recipe(recipe.id.clone()),
                target: None,
                elapsed_ms: 0,
                cast_ms: recipe.cast_ms,
            };
            self.characters[ui].cast = Some(cast);
            return Ok(UseOutcome::Casting);
        }
        self.resolve_recipe(ui, id)?;
        Ok(UseOutcome::Done)
    }

    fn resolve_recipe(&mut self, ui: usize, id: &str) -> Result<(), UseError> {
        let recipe = self.characters[ui]
            .recipe(id)
            .cloned()
            .ok_or(UseError::NotFound)?;
        if !recipe.requirements.met_by(&self.characters[ui]) {
            return Err(UseError::Requirements);
        }
        let mut made = Vec::with_capacity(recipe.results.len());
        for prototype in &recipe.results {
            let mut item = prototype.clone();
            item.serial = self.next_serial();
            made.push(item);
        }

        let u = &mut self.characters[ui];
        for (item_id, amount) in &recipe.requirements.items {
            u.inventory.take(item_id, *amount as usize);
        }
        for item in made {
            if let Err(item) = u.inventory.add_item(item) {
                log::warn!("Inventory of {} full, crafted {} lost", u.object_id(), item.id);
            }
        }
        if recipe.cooldown_ms > 0 {
            u.cooldowns.insert(recipe.id.clone(), recipe.cooldown_ms);
        }
        u.global_cooldown_ms = GLOBAL_COOLDOWN_MS;
        u.activate(ActivationKind::Craft);
        Ok(())
    }

    fn use_item(&mut self, ui: usize, key: &str) -> Result<(), UseError> {
        let u = &self.characters[ui];
        let item = u.inventory.item_by_key(key).ok_or(UseError::NotFound)?;
        if !item.usable() {
            return Err(UseError::Requirements);
        }
        if u.global_cooldown_ms > 0 {
            return Err(UseError::Cooldown);
        }
        let effects = item.misc().map(|m| m.use_effects.clone()).unwrap_or_default();
        let consumable = item.consumable();

        let u = &mut self.characters[ui];
        if consumable {
            u.inventory.remove_item(key);
        }
        u.global_cooldown_ms = GLOBAL_COOLDOWN_MS;
        u.activate(ActivationKind::Item);
        for effect in &effects {
            self.apply_effect(ui, effect, Some(ui));
        }
        Ok(())
    }

    fn train(&mut self, ui: usize, trainer: &ObjectId, id: &str) -> Result<(), UseError> {
        let ti = self.char_index(trainer).ok_or(UseError::NotFound)?;
        let trainer = &self.characters[ti];
        let training = trainer.training(id).cloned().ok_or(UseError::NotFound)?;
        let user = &self.characters[ui];
        if user.position.distance(&trainer.position) > DIALOG_RANGE {
            return Err(UseError::Range {
                range: DIALOG_RANGE,
                target: trainer.position,
            });
        }
        if !training.requirements.met_by(user) {
            return Err(UseError::Requirements);
        }

        let user = &mut self.characters[ui];
        match training.reward {
            TrainingReward::Skill(skill) => {
                if user.skill(&skill.id).is_none() {
                    user.skills.push(skill);
                }
            }
            TrainingReward::Recipe(recipe) => {
                if user.recipe(&recipe.id).is_none() {
                    user.recipes.push(recipe);
                }
            }
            TrainingReward::Attribute(attribute, value) => user.attributes.add(attribute, value),
        }
        user.private_log.add_translated("completed");
        Ok(())
    }

    /// Applies instant modifiers of `template` to the character at `target`
    /// and attaches a timed effect for the lasting ones.
    fn apply_effect(&mut self, target: usize, template: &EffectTemplate, source: Option<usize>) {
        let source_id = source.map(|s| self.characters[s].object_id());
        for modifier in &template.modifiers {
            match modifier {
                Modifier::Health(v) if *v >= 0 => self.characters[target].heal(*v),
                Modifier::Health(v) => {
                    self.characters[target].damage(-v);
                }
                Modifier::Mana(v) => self.characters[target].restore_mana(*v),
                Modifier::Hit => match source {
                    Some(s) if s != target => {
                        let (damage, _, _) = Self::weapon_of(&self.characters[s]);
                        let amount = Self::roll(damage);
                        let (user, victim) = self.two_mut(s, target);
                        Self::strike(user, victim, amount);
                    }
                    _ => {}
                },
                Modifier::HealthPerSecond(_) | Modifier::Flag(_) => {}
            }
        }

        let lasting = template
            .modifiers
            .iter()
            .any(|m| matches!(m, Modifier::HealthPerSecond(_) | Modifier::Flag(_)));
        if lasting && template.duration_ms != Some(0) && self.characters[target].alive() {
            let serial = self.next_serial();
            let effect = Effect::from_template(template, serial, source_id);
            self.characters[target].effects.push(effect);
        }
    }

    pub fn equip(&mut self, oid: &ObjectId, item_key: &str) -> anyhow::Result<()> {
        let Some(c) = self.char_mut(oid) else {
            bail!("Character not found: {}", oid);
        };
        let Some(item) = c.inventory.item_by_key(item_key) else {
            bail!("{} does not carry {}", oid, item_key);
        };
        if item.level > c.level {
            bail!("{} is too low level for {}", oid, item_key);
        }
        let item = item.clone();
        if !c.equipment.equip(&item) {
            bail!("{} cannot be equipped", item_key);
        }
        Ok(())
    }

    pub fn unequip(&mut self, oid: &ObjectId, item_key: &str) -> anyhow::Result<()> {
        let Some(c) = self.char_mut(oid) else {
            bail!("Character not found: {}", oid);
        };
        if !c.equipment.unequip(item_key) {
            bail!("{} is not equipped", item_key);
        }
        Ok(())
    }

    /// Removes items from a character's inventory for good.
    pub fn throw_items(&mut self, oid: &ObjectId, item_keys: &[String]) -> anyhow::Result<()> {
        let Some(c) = self.char_mut(oid) else {
            bail!("Character not found: {}", oid);
        };
        for key in item_keys {
            c.equipment.unequip(key);
            if c.inventory.remove_item(key).is_none() {
                log::warn!("{} does not carry {}", oid, key);
            }
        }
        Ok(())
    }

    /// Inventory of a character or area object.
    pub fn inventory(&self, oid: &ObjectId) -> Option<&Inventory> {
        if let Some(c) = self.char(oid) {
            return Some(&c.inventory);
        }
        self.chapter
            .areas
            .iter()
            .find_map(|a| a.object(oid))
            .map(|o| &o.inventory)
    }

    fn inventory_mut(&mut self, oid: &ObjectId) -> Option<&mut Inventory> {
        if let Some(idx) = self.char_index(oid) {
            return Some(&mut self.characters[idx].inventory);
        }
        self.chapter
            .areas
            .iter_mut()
            .find_map(|a| a.object_mut(oid))
            .map(|o| &mut o.inventory)
    }

    /// Moves items between two inventories; nothing moves if any item is
    /// missing or the receiver lacks space.
    pub fn transfer_items(
        &mut self,
        from: &ObjectId,
        to: &ObjectId,
        item_keys: &[String],
    ) -> anyhow::Result<()> {
        let Some(source) = self.inventory(from) else {
            bail!("Object not found: {}", from);
        };
        if let Some(missing) = item_keys.iter().find(|k| !source.contains(k)) {
            bail!("{} does not hold {}", from, missing);
        }
        let Some(dest) = self.inventory(to) else {
            bail!("Object not found: {}", to);
        };
        if dest.items().len() + item_keys.len() > dest.capacity() {
            bail!("Inventory of {} is full", to);
        }

        let mut moved = Vec::with_capacity(item_keys.len());
        if let Some(c) = self.char_mut(from) {
            for key in item_keys {
                c.equipment.unequip(key);
            }
        }
        if let Some(source) = self.inventory_mut(from) {
            for key in item_keys {
                if let Some(item) = source.remove_item(key) {
                    moved.push(item);
                }
            }
        }
        if let Some(dest) = self.inventory_mut(to) {
            for item in moved {
                if let Err(item) = dest.add_item(item) {
                    log::error!("Lost item {} moving to {}", item.key(), to);
                }
            }
        }
        Ok(())
    }

    /// Price of the given seller items and value of the buyer's items.
    pub fn trade_values(
        &self,
        seller: &ObjectId,
        buyer: &ObjectId,
        buy: &[String],
        sell: &[String],
    ) -> (i32, i32) {
        let buy_value = self
            .inventory(seller)
            .map(|inv| {
                buy.iter()
                    .filter_map(|k| {
                        inv.trade_price(k)
                            .or_else(|| inv.item_by_key(k).map(|i| i.value))
                    })
                    .sum()
            })
            .unwrap_or(0);
        let sell_value = self
            .inventory(buyer)
            .map(|inv| sell.iter().filter_map(|k| inv.item_by_key(k)).map(|i| i.value).sum())
            .unwrap_or(0);
        (buy_value, sell_value)
    }

    /// Exchanges `buy` items of the seller for `sell` items of the buyer.
    pub fn trade(
        &mut self,
        seller: &ObjectId,
        buyer: &ObjectId,
        buy: &[String],
        sell: &[String],
    ) -> anyhow::Result<()> {
        let (buy_value, sell_value) = self.trade_values(seller, buyer, buy, sell);
        if buy_value > sell_value {
            bail!("Trade value too low: {} > {}", buy_value, sell_value);
        }
        self.transfer_items(buyer, seller, sell)?;
        if let Err(err) = self.transfer_items(seller, buyer, buy) {
            self.transfer_items(seller, buyer, sell)?;
            return Err(err);
        }
        Ok(())
    }

    pub fn start_dialog(
        &mut self,
        owner: &ObjectId,
        talker: &ObjectId,
        dialog_id: &str,
    ) -> anyhow::Result<()> {
        let (Some(oi), Some(ti)) = (self.char_index(owner), self.char_index(talker)) else {
            bail!("Dialog participants not found: {} {}", owner, talker);
        };
        if oi == ti {
            bail!("{} cannot talk to itself", owner);
        }
        let (owner_char, talker_char) = self.two_mut(oi, ti);
        let Some(dialog) = owner_char.dialogs.iter_mut().find(|d| d.id == dialog_id) else {
            bail!("{} has no dialog {}", owner, dialog_id);
        };
        if !dialog.start(talker_char) {
            bail!("Dialog {} not available for {}", dialog_id, talker);
        }
        Ok(())
    }

    pub fn answer_dialog(
        &mut self,
        owner: &ObjectId,
        talker: &ObjectId,
        answer_id: &str,
    ) -> anyhow::Result<()> {
        let (Some(oi), Some(ti)) = (self.char_index(owner), self.char_index(talker)) else {
            bail!("Dialog participants not found: {} {}", owner, talker);
        };
        if oi == ti {
            bail!("{} cannot talk to itself", owner);
        }
        let (owner_char, talker_char) = self.two_mut(oi, ti);
        let Some(dialog) = owner_char
            .dialogs
            .iter_mut()
            .find(|d| d.target.as_ref() == Some(talker))
        else {
            bail!("{} is not talking to {}", owner, talker);
        };
        let Some(modifiers) = dialog.answer(answer_id, talker_char) else {
            bail!("Answer {} not available", answer_id);
        };

        for modifier in modifiers {
            let talker_char = &mut self.characters[ti];
            match modifier {
                DialogModifier::StartQuest(mut quest) => {
                    if talker_char.quest(&quest.id).is_none() {
                        quest.start();
                        talker_char.journal.push(quest);
                    }
                }
                DialogModifier::QuestStage { quest, stage } => {
                    if let Some(q) = talker_char.journal.iter_mut().find(|q| q.id == quest) {
                        q.set_stage(&stage);
                    }
                }
                DialogModifier::AddFlag(flag) => {
                    talker_char.flags.insert(flag);
                }
                DialogModifier::RemoveFlag(flag) => {
                    talker_char.flags.remove(&flag);
                }
                DialogModifier::Effect(template) => self.apply_effect(ti, &template, Some(oi)),
                DialogModifier::Trade | DialogModifier::Train => {}
            }
        }
        Ok(())
    }

    pub fn end_dialog(&mut self, owner: &ObjectId, talker: &ObjectId) -> anyhow::Result<()> {
        let Some(owner_char) = self.char_mut(owner) else {
            bail!("Character not found: {}", owner);
        };
        for dialog in owner_char
            .dialogs
            .iter_mut()
            .filter(|d| d.target.as_ref() == Some(talker))
        {
            dialog.restart();
        }
        Ok(())
    }

    /// Dialog the owner is holding with `talker`, if any.
    pub fn active_dialog(&self, owner: &ObjectId, talker: &ObjectId) -> Option<&super::Dialog> {
        self.char(owner)?
            .dialogs
            .iter()
            .find(|d| d.target.as_ref() == Some(talker))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{
        Dialog, DialogAnswer, DialogStage, ItemKind, MiscData, Requirements, Skill, Training,
        WeaponData, END_STAGE,
    };

    pub(crate) fn sword(serial: &str) -> Item {
        Item {
            id: "sword".into(),
            serial: serial.into(),
            name: "Sword".into(),
            value: 30,
            level: 1,
            kind: ItemKind::Weapon(WeaponData {
                damage: (10, 10),
                range: ACTION_RANGE,
                kind: WeaponKind::Melee,
                slots: vec![crate::types::EquipSlot::MainHand],
            }),
        }
    }

    pub(crate) fn misc(id: &str, serial: &str, value: i32) -> Item {
        Item {
            id: id.into(),
            serial: serial.into(),
            name: id.into(),
            value,
            level: 0,
            kind: ItemKind::Misc(MiscData::default()),
        }
    }

    pub(crate) fn test_module() -> Module {
        let mut chapter = Chapter {
            id: "prologue".into(),
            name: "Prologue".into(),
            areas: vec![Area::new("village")],
            start_area: "village".into(),
            start_position: Position::new(50.0, 50.0),
        };
        chapter.areas.push(Area::new("forest"));
        let mut module = Module::new("test", chapter);

        let mut pc = Character::new("player", "0", "Hero");
        pc.area = "village".into();
        pc.position = Position::new(50.0, 50.0);
        pc.inventory.add_item(sword("1")).unwrap();
        pc.equipment.equip(&sword("1"));
        module.characters.push(pc);

        let mut wolf = Character::new("wolf", "5", "Wolf");
        wolf.area = "village".into();
        wolf.position = Position::new(90.0, 50.0);
        wolf.health = 15;
        wolf.max_health = 15;
        wolf.default_attitude = Attitude::Hostile;
        module.characters.push(wolf);
        module
    }

    fn pc() -> ObjectId {
        ObjectId::new("player", "0")
    }

    fn wolf() -> ObjectId {
        ObjectId::new("wolf", "5")
    }

    #[test]
    fn hit_in_range_damages_and_triggers_melee() {
        let mut module = test_module();
        let outcome = module
            .use_action(&pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap();
        assert_eq!(outcome, UseOutcome::Done);
        assert_eq!(module.char(&wolf()).unwrap().health, 5);
        let activation = module.char(&pc()).unwrap().last_activation.unwrap();
        assert_eq!(activation.kind, ActivationKind::Melee);
    }

    #[test]
    fn hit_respects_global_cooldown() {
        let mut module = test_module();
        module
            .use_action(&pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap();
        let err = module
            .use_action(&pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap_err();
        assert_eq!(err, UseError::Cooldown);
        module.update(GLOBAL_COOLDOWN_MS);
        module
            .use_action(&pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap();
        let w = module.char(&wolf()).unwrap();
        assert!(!w.alive());
        assert_eq!(w.inventory.loot_items().len(), w.inventory.items().len());
    }

    #[test]
    fn hit_out_of_range_reports_target_position() {
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().position = Position::new(250.0, 50.0);
        let err = module
            .use_action(&pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap_err();
        assert_eq!(
            err,
            UseError::Range {
                range: ACTION_RANGE,
                target: Position::new(250.0, 50.0)
            }
        );
        assert_eq!(err.text_id(), "tar_too_far");
    }

    #[test]
    fn timed_skill_casts_then_resolves() {
        let mut module = test_module();
        let heal = Skill {
            id: "heal".into(),
            name: "Heal".into(),
            cast_ms: 500,
            cooldown_ms: 3_000,
            range: ACTION_RANGE,
            mana_cost: 10,
            effects: vec![EffectTemplate {
                id: "heal".into(),
                name: String::new(),
                duration_ms: Some(0),
                modifiers: vec![Modifier::Health(20)],
            }],
            requirements: Requirements::default(),
            animation: SkillAnimation::Cast,
            needs_target: false,
        };
        {
            let c = module.char_mut(&pc()).unwrap();
            c.skills.push(heal);
            c.health = 50;
            c.targets.clear();
        }
        let outcome = module
            .use_action(&pc(), UseAction::Skill("heal".into()), UseTarget::Auto)
            .unwrap();
        assert_eq!(outcome, UseOutcome::Casting);
        assert!(module.char(&pc()).unwrap().cast.as_ref().unwrap().is_skill());
        module.update(500);
        let c = module.char(&pc()).unwrap();
        assert!(c.cast.is_none());
        assert_eq!(c.health, 70);
        assert_eq!(c.mana, 40);
        assert!(c.on_cooldown("heal"));
    }

    #[test]
    fn trade_rejects_low_value() {
        let mut module = test_module();
        let merchant = ObjectId::new("merchant", "9");
        let mut m = Character::new("merchant", "9", "Merchant");
        m.inventory.add_item(misc("gem", "2", 50)).unwrap();
        m.inventory.set_trade_price("gem2", 50);
        module.characters.push(m);
        module
            .char_mut(&pc())
            .unwrap()
            .inventory
            .add_item(misc("pelt", "3", 20))
            .unwrap();

        let buy = vec!["gem2".to_string()];
        let sell = vec!["pelt3".to_string()];
        assert!(module.trade(&merchant, &pc(), &buy, &sell).is_err());
        assert!(module.char(&pc()).unwrap().inventory.contains("pelt3"));

        module.char_mut(&merchant).unwrap().inventory.set_trade_price("gem2", 20);
        module.trade(&merchant, &pc(), &buy, &sell).unwrap();
        assert!(module.char(&pc()).unwrap().inventory.contains("gem2"));
        assert!(module.char(&merchant).unwrap().inventory.contains("pelt3"));
    }

    #[test]
    fn training_rewards_skill() {
        let mut module = test_module();
        let mut trainer = Character::new("trainer", "7", "Trainer");
        trainer.position = Position::new(60.0, 50.0);
        trainer.trainings.push(Training {
            id: "t1".into(),
            name: String::new(),
            requirements: Requirements::default(),
            reward: TrainingReward::Attribute(crate::traits::Attribute::Strength, 2),
        });
        module.characters.push(trainer);
        let action = UseAction::Training {
            trainer: ObjectId::new("trainer", "7"),
            training: "t1".into(),
        };
        module.use_action(&pc(), action, UseTarget::Auto).unwrap();
        assert_eq!(module.char(&pc()).unwrap().attributes.strength, 12);
    }

    #[test]
    fn dialog_answer_applies_flags() {
        let mut module = test_module();
        let mut npc = Character::new("elder", "4", "Elder");
        npc.dialogs.push(Dialog {
            id: "talk".into(),
            requirements: Requirements::default(),
            stages: vec![DialogStage {
                id: "s".into(),
                text: "Hello".into(),
                start: true,
                requirements: Requirements::default(),
                answers: vec![DialogAnswer {
                    id: "a".into(),
                    text: "Bless me".into(),
                    to: END_STAGE.into(),
                    requirements: Requirements::default(),
                    modifiers: vec![DialogModifier::AddFlag("blessed".into())],
                }],
            }],
            active_stage: None,
            target: None,
            finished: false,
            trading: false,
            training: false,
        });
        module.characters.push(npc);
        let elder = ObjectId::new("elder", "4");
        module.start_dialog(&elder, &pc(), "talk").unwrap();
        assert!(module.active_dialog(&elder, &pc()).is_some());
        module.answer_dialog(&elder, &pc(), "a").unwrap();
        assert!(module.char(&pc()).unwrap().has_flag("blessed"));
        assert!(module.active_dialog(&elder, &pc()).unwrap().finished);
        module.end_dialog(&elder, &pc()).unwrap();
        assert!(module.active_dialog(&elder, &pc()).is_none());
    }

    #[test]
    fn clock_advances_scaled() {
        let mut module = test_module();
        module.set_hour(5);
        assert_eq!(module.hour(), 5);
        module.update(360_000);
        assert_eq!(module.hour(), 6);
    }

    #[test]
    fn json_round_trip_keeps_serials_unique() {
        let mut module = test_module();
        let text = module.to_json().unwrap();
        let mut loaded = Module::from_json(&text).unwrap();
        assert_eq!(loaded.characters.len(), module.characters.len());
        let serial = loaded.next_serial();
        assert!(loaded.characters.iter().all(|c| c.serial != serial));
        module.next_serial();
        assert_ne!(module.to_json().unwrap(), text);
    }
}
