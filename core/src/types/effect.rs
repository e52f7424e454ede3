//! Timed effects applied by skills, items and dialog answers.

use serde::{Deserialize, Serialize};

use super::ObjectId;

/// A single change an effect makes to its target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modifier {
    /// Instant health change (negative values damage).
    Health(i32),
    /// Instant mana change.
    Mana(i32),
    /// Health change applied once per second while the effect lasts.
    HealthPerSecond(i32),
    /// Damage rolled from the source character's weapon.
    Hit,
    /// Flag carried by the target while the effect is active.
    Flag(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `None` means the effect never expires.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    pub serial: String,
    pub name: String,
    pub remaining_ms: Option<u64>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub source: Option<ObjectId>,
    #[serde(default)]
    tick_ms: u64,
}

impl Effect {
    pub fn from_template(template: &EffectTemplate, serial: String, source: Option<ObjectId>) -> Self {
        Self {
            id: template.id.clone(),
            serial,
            name: template.name.clone(),
            remaining_ms: template.duration_ms,
            modifiers: template.modifiers.clone(),
            source,
            tick_ms: 0,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.id.clone(), self.serial.clone())
    }

    pub fn is_infinite(&self) -> bool {
        self.remaining_ms.is_none()
    }

    pub fn expired(&self) -> bool {
        self.remaining_ms == Some(0)
    }

    /// Remaining whole seconds, rounded up; `None` for infinite effects.
    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_ms.map(|ms| ms.div_ceil(1000))
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.modifiers.iter().filter_map(|m| match m {
            Modifier::Flag(f) => Some(f.as_str()),
            _ => None,
        })
    }

    /// Advances the timer and returns the health change due this step from
    /// periodic modifiers.
    pub fn update(&mut self, delta_ms: u64) -> i32 {
        let step = match self.remaining_ms {
            Some(remaining) => {
                let step = delta_ms.min(remaining);
                self.remaining_ms = Some(remaining - step);
                step
            }
            None => delta_ms,
        };

        self.tick_ms += step;
        let mut health = 0;
        while self.tick_ms >= 1000 {
            self.tick_ms -= 1000;
            for modifier in &self.modifiers {
                if let Modifier::HealthPerSecond(v) = modifier {
                    health += v;
                }
            }
        }
        health
    }
}
