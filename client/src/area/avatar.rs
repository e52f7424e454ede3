//! Graphical wrapper over an engine character in the current area.

use std::collections::BTreeMap;

use mural_core::types::{ActivationKind, Character, ObjectId, Position, UseAction};

use super::sprite::{AvatarSprite, BodyParts};
use crate::bindings::{AvatarBinding, Bindings, DEFAULT_BODY, EffectBinding, ItemBinding, SkillBinding};

/// Seconds a chat bubble stays over the avatar.
pub const BUBBLE_SECS: f32 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ChatBubble {
    pub text: String,
    pub age: f32,
}

pub struct Avatar {
    id: ObjectId,
    name: String,
    position: Position,
    alive: bool,
    portrait: Option<String>,
    sprite: AvatarSprite,
    bubble: Option<ChatBubble>,
    chat_seen: u64,
    last_cast: Option<UseAction>,
    pub hovered: bool,
    pub silenced: bool,
    equipped: BTreeMap<String, ItemBinding>,
    effects: BTreeMap<String, EffectBinding>,
    skills: BTreeMap<String, SkillBinding>,
}

fn body_parts(binding: &AvatarBinding) -> BodyParts {
    match (&binding.torso, &binding.head) {
        (Some(torso), Some(head)) => BodyParts::Split {
            torso: torso.clone(),
            head: head.clone(),
            weapon: None,
        },
        _ => BodyParts::Full {
            body: binding
                .full_body
                .clone()
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
            weapon: None,
        },
    }
}

impl Avatar {
    pub fn new(c: &Character, bindings: &mut Bindings) -> Self {
        let binding = bindings.avatar(&c.id).clone();
        let mut avatar = Self {
            id: c.object_id(),
            name: c.display_name().to_string(),
            position: c.position,
            alive: c.alive(),
            portrait: binding.portrait.clone(),
            sprite: AvatarSprite::new(body_parts(&binding), c),
            bubble: None,
            chat_seen: c.chat_log.last().map(|m| m.id).unwrap_or(0),
            last_cast: None,
            hovered: false,
            silenced: false,
            equipped: BTreeMap::new(),
            effects: BTreeMap::new(),
            skills: BTreeMap::new(),
        };
        avatar.sync_bindings(c, bindings);
        avatar
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn portrait(&self) -> Option<&str> {
        self.portrait.as_deref()
    }

    pub fn sprite(&self) -> &AvatarSprite {
        &self.sprite
    }

    pub fn bubble(&self) -> Option<&ChatBubble> {
        self.bubble.as_ref()
    }

    pub fn effect_icon(&self, effect_id: &str) -> Option<&str> {
        self.effects.get(effect_id).map(|b| b.icon.as_str())
    }

    pub fn skill_icon(&self, skill_id: &str) -> Option<&str> {
        self.skills.get(skill_id).map(|b| b.icon.as_str())
    }

    pub fn equipped_icon(&self, item_key: &str) -> Option<&str> {
        self.equipped.get(item_key).map(|b| b.icon.as_str())
    }

    /// Keeps the equipment, effect and skill graphics in step with the
    /// character, and puts the equipped weapon's sheet on the sprite.
    fn sync_bindings(&mut self, c: &Character, bindings: &mut Bindings) {
        let keys: Vec<&str> = c.equipment.item_keys().collect();
        self.equipped.retain(|key, _| keys.contains(&key.as_str()));
        for key in &keys {
            if self.equipped.contains_key(*key) {
                continue;
            }
            if let Some(item) = c.inventory.item_by_key(key) {
                self.equipped
                    .insert(key.to_string(), bindings.item(&item.id).clone());
            }
        }

        self.effects.retain(|id, _| c.effects.iter().any(|e| &e.id == id));
        for effect in &c.effects {
            if !self.effects.contains_key(&effect.id) {
                self.effects
                    .insert(effect.id.clone(), bindings.effect(&effect.id).clone());
            }
        }

        self.skills.retain(|id, _| c.skills.iter().any(|s| &s.id == id));
        for skill in &c.skills {
            if !self.skills.contains_key(&skill.id) {
                self.skills
                    .insert(skill.id.clone(), bindings.skill(&skill.id).clone());
            }
        }

        let weapon_sheet = c
            .equipment
            .weapon()
            .and_then(|key| self.equipped.get(key))
            .and_then(|b| b.spritesheet.clone());
        self.sprite.set_weapon(weapon_sheet);
    }

    /// Advances the avatar by `dt` seconds. Returns the sound the avatar
    /// makes this frame, unless it is silenced.
    pub fn update(&mut self, c: &Character, bindings: &mut Bindings, dt: f32) -> Option<String> {
        self.name = c.display_name().to_string();
        self.position = c.position;
        self.alive = c.alive();
        self.sync_bindings(c, bindings);

        if let Some(bubble) = &mut self.bubble {
            bubble.age += dt;
            if bubble.age >= BUBBLE_SECS {
                self.bubble = None;
            }
        }
        if let Some(msg) = c.chat_log.since(self.chat_seen).last() {
            self.bubble = Some(ChatBubble {
                text: msg.text.clone(),
                age: 0.0,
            });
        }
        if let Some(msg) = c.chat_log.last() {
            self.chat_seen = msg.id;
        }

        if let Some(cast) = &c.cast {
            self.last_cast = Some(cast.action.clone());
        }

        let kind = self.sprite.update(c, dt)?;
        let sound = self.activation_sound(c, kind);
        if self.silenced { None } else { sound }
    }

    fn activation_sound(&self, c: &Character, kind: ActivationKind) -> Option<String> {
        match kind {
            ActivationKind::Melee | ActivationKind::Shoot => c
                .equipment
                .weapon()
                .and_then(|key| self.equipped.get(key))
                .and_then(|b| b.use_sound.clone()),
            ActivationKind::Spell => match &self.last_cast {
                Some(UseAction::Skill(id)) => {
                    self.skills.get(id).and_then(|b| b.activation_sound.clone())
                }
                _ => None,
            },
            ActivationKind::Craft | ActivationKind::Item => None,
        }
    }
}
