//! Petal lifecycle state machine and collision resolution
//!
//! A petal cycles through three phases:
//! - `Reloading`: respawning at the owner's position, collision-inactive
//! - `Attacking`: orbiting on the ring, scanning the grid for hits
//! - `Using`: executing a timed effect (healing), easing toward the owner
//!
//! Phase transitions that flip the reloading observable mark the petal
//! dirty exactly once, so the network layer can send delta updates only on
//! state change.

use glam::Vec2;
use serde::Serialize;

use super::grid::SpatialGrid;
use super::hitbox::CircleHitbox;
use super::inventory::OwnerCtx;
use super::state::{EntityId, EntityKind};
use crate::config::SimConfig;
use crate::consts::USE_APPROACH_FACTOR;
use crate::defs::{PetalDefId, PetalDefinition};

/// Current phase of a petal's lifecycle
///
/// Reloading and using are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetalPhase {
    /// Respawning; completes after the definition's reload time
    Reloading,
    /// Live on the ring, collision-active
    Attacking,
    /// Use effect in flight, completing at the given tick
    Using { complete_at: u64 },
}

/// A combat effect produced by a petal scan
///
/// Effects are gathered while a player's petals tick and applied by the
/// tick driver right after, before the next player's petals run.
#[derive(Debug, Clone, Copy)]
pub enum Impact {
    /// Contact damage against another entity
    Damage {
        target: EntityId,
        target_kind: EntityKind,
        amount: f32,
        source: EntityId,
    },
    /// Heal applied to the petal's owner
    Heal { player: EntityId, amount: f32 },
}

/// Per-petal delta snapshot for network synchronization
#[derive(Debug, Clone, Serialize)]
pub struct PetalSnapshot {
    pub id: EntityId,
    pub pos: Vec2,
    pub def: PetalDefId,
    pub is_reloading: bool,
}

/// One simulated petal instance
#[derive(Debug, Clone)]
pub struct Petal {
    pub id: EntityId,
    pub pos: Vec2,
    pub hitbox_radius: f32,
    /// Absent means the petal cannot be damaged
    pub health: Option<f32>,
    phase: PetalPhase,
    reload_elapsed: f32,
    use_reload: f32,
    dirty: bool,
}

impl Petal {
    /// Spawn a petal at its owner's position, starting in `Reloading`
    pub fn new(id: EntityId, def: &PetalDefinition, owner_pos: Vec2) -> Self {
        Self {
            id,
            pos: owner_pos,
            hitbox_radius: def.hitbox_radius,
            health: def.health,
            phase: PetalPhase::Reloading,
            reload_elapsed: 0.0,
            use_reload: 0.0,
            // Spawning is a state change the network layer must see
            dirty: true,
        }
    }

    pub fn phase(&self) -> PetalPhase {
        self.phase
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.phase, PetalPhase::Reloading)
    }

    pub fn is_using(&self) -> bool {
        matches!(self.phase, PetalPhase::Using { .. })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn hitbox(&self) -> CircleHitbox {
        CircleHitbox::new(self.pos, self.hitbox_radius)
    }

    pub fn snapshot(&self, def: PetalDefId) -> PetalSnapshot {
        PetalSnapshot {
            id: self.id,
            pos: self.pos,
            def,
            is_reloading: self.is_reloading(),
        }
    }

    /// Off use cooldown, or the definition has no use time at all
    fn can_use(&self, def: &PetalDefinition, cfg: &SimConfig) -> bool {
        def.use_time.is_none() || self.use_reload >= cfg.use_cooldown
    }

    fn enter_reloading(&mut self) {
        debug_assert!(!self.is_reloading());
        self.phase = PetalPhase::Reloading;
        self.reload_elapsed = 0.0;
        self.dirty = true;
    }

    fn enter_attacking(&mut self, def: &PetalDefinition) {
        debug_assert!(self.is_reloading());
        self.phase = PetalPhase::Attacking;
        self.health = def.health;
        self.dirty = true;
    }

    /// Advance the state machine by one tick
    ///
    /// `ring_pos` is the position assigned by the ring layout; it only
    /// applies while attacking. Combat effects are appended to `impacts`.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        def: &PetalDefinition,
        owner: &OwnerCtx,
        ring_pos: Vec2,
        grid: &SpatialGrid,
        cfg: &SimConfig,
        now_ticks: u64,
        dt: f32,
        impacts: &mut Vec<Impact>,
    ) {
        match self.phase {
            PetalPhase::Reloading => {
                self.reload_elapsed += dt;
                let done = match def.reload_time {
                    None => true,
                    Some(rt) => rt <= 0.0 || self.reload_elapsed >= rt,
                };
                if done {
                    self.enter_attacking(def);
                }
                // Held by the owner until back in formation
                self.pos = owner.pos;
            }
            PetalPhase::Using { complete_at } => {
                if now_ticks >= complete_at {
                    // Forced reloads cancel the phase entirely, so a stale
                    // completion can never double-fire here
                    if let Some(heal) = def.heal {
                        impacts.push(Impact::Heal {
                            player: owner.id,
                            amount: heal,
                        });
                    }
                    self.use_reload = 0.0;
                    self.enter_reloading();
                } else {
                    // Exponential approach toward the owner
                    self.pos += (owner.pos - self.pos) * USE_APPROACH_FACTOR;
                }
            }
            PetalPhase::Attacking => {
                self.pos = ring_pos;
                self.scan_collisions(def, owner, grid, impacts);

                if def.use_time.is_some() {
                    self.use_reload += dt;
                }

                if def.heal.is_some()
                    && self.can_use(def, cfg)
                    && owner.health < owner.max_health
                    && self
                        .hitbox()
                        .with_radius(cfg.heal_interact_radius)
                        .intersects(&CircleHitbox::new(owner.pos, owner.radius))
                {
                    let delay_ticks = match def.use_time {
                        Some(t) if dt > 0.0 => (t / dt).ceil() as u64,
                        _ => 0,
                    };
                    self.phase = PetalPhase::Using {
                        complete_at: now_ticks + delay_ticks,
                    };
                }
            }
        }
    }

    /// Query the grid and emit damage against eligible overlapping entities
    fn scan_collisions(
        &self,
        def: &PetalDefinition,
        owner: &OwnerCtx,
        grid: &SpatialGrid,
        impacts: &mut Vec<Impact>,
    ) {
        let Some(damage) = def.damage else {
            return;
        };

        let hitbox = self.hitbox();
        for candidate in grid.query(&hitbox) {
            if candidate.id == self.id {
                continue;
            }
            match candidate.kind {
                EntityKind::Player => {
                    if candidate.id == owner.id {
                        continue;
                    }
                }
                EntityKind::Petal => {
                    // No friendly fire between one player's own petals
                    if candidate.owner == Some(owner.id) {
                        continue;
                    }
                }
                EntityKind::Mob => {}
            }
            // Broad-phase candidates need the precise check
            if hitbox.intersects(&candidate.hitbox) {
                impacts.push(Impact::Damage {
                    target: candidate.id,
                    target_kind: candidate.kind,
                    amount: damage,
                    source: owner.id,
                });
            }
        }
    }

    /// Take contact damage; returns true if the petal broke
    ///
    /// Ignored while reloading or when the definition carries no health.
    pub fn receive_damage(&mut self, amount: f32) -> bool {
        if self.is_reloading() {
            return false;
        }
        let Some(health) = self.health.as_mut() else {
            return false;
        };
        *health -= amount;
        if *health <= 0.0 {
            // A kill mid-use cancels the pending effect
            if self.is_using() {
                self.use_reload = 0.0;
            }
            self.enter_reloading();
            return true;
        }
        false
    }
}
