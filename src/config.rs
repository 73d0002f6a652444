//! Simulation tuning parameters
//!
//! Loaded from JSON by the embedding server or built from defaults. Kept
//! separate from the definition catalog: this is per-deployment tuning,
//! not game content.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tunable simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Equipped inventory slots (spawn petal bunches)
    pub equipped_slots: usize,
    /// Preparation inventory slots (hold definitions only)
    pub preparation_slots: usize,
    /// Orbit radius of the petal ring (world units)
    pub ring_range: f32,
    /// Base revolution advance per tick (radians)
    pub revolution_step: f32,
    /// Cooldown before a use-effect petal may trigger again (seconds)
    pub use_cooldown: f32,
    /// Interaction radius for use-effect proximity checks
    pub heal_interact_radius: f32,
    /// Player hitbox radius
    pub player_radius: f32,
    /// Player max health before modifiers
    pub player_max_health: f32,
    /// Player movement speed before modifiers (units/s)
    pub player_speed: f32,
    /// Spatial hash cell size (world units)
    pub grid_cell_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            equipped_slots: EQUIPPED_SLOTS,
            preparation_slots: PREPARATION_SLOTS,
            ring_range: RING_RANGE,
            revolution_step: REVOLUTION_STEP,
            use_cooldown: PETAL_USE_COOLDOWN,
            heal_interact_radius: HEAL_INTERACT_RADIUS,
            player_radius: PLAYER_RADIUS,
            player_max_health: PLAYER_MAX_HEALTH,
            player_speed: PLAYER_SPEED,
            grid_cell_size: GRID_CELL_SIZE,
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
