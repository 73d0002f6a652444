//! Petal Arena - authoritative server-side simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (petal state machines, collisions, ring layout)
//! - `defs`: Immutable petal definition catalog
//! - `config`: Data-driven simulation tuning

pub mod config;
pub mod defs;
pub mod sim;

pub use config::SimConfig;
pub use defs::{PetalDefId, PetalDefinition, PetalRegistry};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (30 Hz server tick)
    pub const SIM_DT: f32 = 1.0 / 30.0;

    /// Default orbit radius of the petal ring (world units)
    pub const RING_RANGE: f32 = 3.0;
    /// Ring revolution advance per tick (radians, not dt-scaled)
    pub const REVOLUTION_STEP: f32 = 0.02;

    /// Cooldown before a use-effect petal may trigger again (seconds)
    pub const PETAL_USE_COOLDOWN: f32 = 0.5;
    /// Interaction radius for use-effect proximity checks (e.g. healing)
    pub const HEAL_INTERACT_RADIUS: f32 = 10.0;
    /// Fraction of the remaining distance a using petal closes per tick
    pub const USE_APPROACH_FACTOR: f32 = 0.25;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 1.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 6.0;

    /// Inventory slot counts
    pub const EQUIPPED_SLOTS: usize = 5;
    pub const PREPARATION_SLOTS: usize = 5;

    /// Spatial hash cell size (world units)
    pub const GRID_CELL_SIZE: f32 = 4.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
