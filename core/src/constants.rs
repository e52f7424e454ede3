//! Engine-wide tuning constants shared by the HUD and the module simulation.

/// Maximum world distance for using an object or attacking bare-handed.
pub const ACTION_RANGE: f64 = 50.0;
/// Maximum world distance for opening a corpse or container.
pub const LOOT_RANGE: f64 = 50.0;
/// Maximum world distance for starting a conversation.
pub const DIALOG_RANGE: f64 = 50.0;

/// Default sight range for characters without an explicit value.
pub const DEFAULT_SIGHT_RANGE: f64 = 300.0;
/// Default movement speed in world units per second.
pub const DEFAULT_MOVE_SPEED: f64 = 60.0;

/// Global cooldown applied after any successful use, in milliseconds.
pub const GLOBAL_COOLDOWN_MS: u64 = 1_000;

/// Characters at or below this share of their maximum health are in agony.
pub const AGONY_HEALTH_RATIO: f64 = 0.1;

/// In-world seconds that pass per real second.
pub const TIME_SCALE: f64 = 10.0;

/// Distance under which a moving character counts as arrived.
pub const ARRIVE_EPSILON: f64 = 0.5;

/// Capacity of each character log channel.
pub const LOG_CAPACITY: usize = 200;

/// Default inventory capacity (number of items).
pub const DEFAULT_INVENTORY_CAPACITY: usize = 200;

/// Character flag that hands an NPC to the local AI driver.
pub const AI_FLAG: &str = "igniteNpc";

/// Serial used by the default layout template and wildcard lookups.
pub const WILDCARD_ID: &str = "*";
