//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by entity ID)
//! - Commands buffered between ticks, applied atomically at tick start
//! - No wall-clock timers; deferred effects are tick-scheduled
//! - No rendering or platform dependencies

pub mod bunch;
pub mod grid;
pub mod hitbox;
pub mod inventory;
pub mod petal;
pub mod state;
pub mod tick;

pub use bunch::PetalBunch;
pub use grid::{GridEntry, SpatialGrid};
pub use hitbox::CircleHitbox;
pub use inventory::{Inventory, OwnerCtx};
pub use petal::{Petal, PetalPhase, PetalSnapshot};
pub use state::{
    CommandError, EntityId, EntityKind, GameEvent, GameState, Mob, Player, SlotCommand,
};
pub use tick::tick;
