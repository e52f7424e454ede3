//! Local AI for NPCs flagged with [`AI_FLAG`]. Only used when no server
//! drives the module.

use std::collections::BTreeSet;

use rand::Rng;

use crate::constants::AI_FLAG;
use crate::traits::Attitude;
use crate::types::{Character, Module, ObjectId, Position, UseAction, UseError, UseTarget};

/// Wander radius around the current position, in world units.
const WANDER_RANGE: f64 = 40.0;
/// Chance per tick that an idle NPC starts wandering.
const WANDER_CHANCE: f64 = 0.005;

#[derive(Debug, Default)]
pub struct AiDriver {
    npcs: BTreeSet<ObjectId>,
}

impl AiDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn npcs(&self) -> impl Iterator<Item = &ObjectId> {
        self.npcs.iter()
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Registers every flagged character not yet driven; forgets characters
    /// removed from the module. Returns the number of newly added NPCs.
    pub fn refresh(&mut self, module: &Module) -> usize {
        self.npcs.retain(|oid| module.char(oid).is_some());
        let mut added = 0;
        for c in module.characters.iter().filter(|c| c.has_flag(AI_FLAG)) {
            if self.npcs.insert(c.object_id()) {
                log::debug!("AI takes control of {}", c.object_id());
                added += 1;
            }
        }
        added
    }

    /// Lets every driven NPC pick its next action.
    pub fn update(&mut self, module: &mut Module) {
        let mut rng = rand::thread_rng();
        for oid in self.npcs.iter() {
            let Some(npc) = module.char(oid) else {
                continue;
            };
            if !npc.alive() || npc.casting() {
                continue;
            }

            match Self::enemy_of(module, npc) {
                Some(enemy) => {
                    let result = module.use_action(oid, UseAction::Hit, UseTarget::Char(enemy));
                    match result {
                        Err(UseError::Range { range, target }) => {
                            if let Some(npc) = module.char_mut(oid) {
                                npc.move_close_to(target, range * 0.9);
                            }
                        }
                        Err(UseError::Cooldown) | Ok(_) => {
                            if let Some(npc) = module.char_mut(oid) {
                                npc.dest = None;
                            }
                        }
                        Err(err) => log::trace!("AI {} cannot hit: {}", oid, err),
                    }
                }
                None => {
                    if !npc.moving() && rng.gen_bool(WANDER_CHANCE) {
                        let pos = npc.position;
                        let dest = Position::new(
                            pos.x + rng.gen_range(-WANDER_RANGE..=WANDER_RANGE),
                            pos.y + rng.gen_range(-WANDER_RANGE..=WANDER_RANGE),
                        );
                        if let Some(npc) = module.char_mut(oid) {
                            npc.set_dest_point(dest);
                        }
                    }
                }
            }
        }
    }

    /// Closest living hostile character in sight in the same area.
    fn enemy_of(module: &Module, npc: &Character) -> Option<ObjectId> {
        module
            .area_chars(&npc.area)
            .filter(|c| c.alive() && c.key() != npc.key())
            .filter(|c| npc.attitude_towards(c) == Attitude::Hostile)
            .map(|c| (c, npc.position.distance(&c.position)))
            .filter(|(_, d)| *d <= npc.sight_range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.object_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Area, Chapter};

    fn module() -> Module {
        let chapter = Chapter {
            id: "c".into(),
            name: String::new(),
            areas: vec![Area::new("a")],
            start_area: "a".into(),
            start_position: Position::default(),
        };
        let mut module = Module::new("m", chapter);
        let mut pc = Character::new("player", "0", "Hero");
        pc.area = "a".into();
        module.characters.push(pc);

        let mut bandit = Character::new("bandit", "1", "Bandit");
        bandit.area = "a".into();
        bandit.position = Position::new(200.0, 0.0);
        bandit.flags.insert(AI_FLAG.into());
        bandit.default_attitude = Attitude::Hostile;
        module.characters.push(bandit);
        module
    }

    #[test]
    fn refresh_registers_flagged_characters_once() {
        let module = module();
        let mut ai = AiDriver::new();
        assert_eq!(ai.refresh(&module), 1);
        assert_eq!(ai.refresh(&module), 0);
        assert_eq!(ai.len(), 1);
    }

    #[test]
    fn hostile_npc_approaches_then_attacks() {
        let mut module = module();
        let mut ai = AiDriver::new();
        ai.refresh(&module);

        ai.update(&mut module);
        let bandit = module.char(&ObjectId::new("bandit", "1")).unwrap();
        assert!(bandit.moving());

        module.char_mut(&ObjectId::new("bandit", "1")).unwrap().position = Position::new(20.0, 0.0);
        ai.update(&mut module);
        let pc = module.char(&ObjectId::new("player", "0")).unwrap();
        assert!(pc.health < pc.max_health);
    }
}
