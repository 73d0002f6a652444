//! World state and core simulation types
//!
//! `GameState` owns every live entity plus the shared spatial grid, the
//! buffered slot commands, and the outbound event/snapshot queues. All
//! entity vectors stay sorted by id so iteration order is deterministic.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::SpatialGrid;
use super::hitbox::CircleHitbox;
use super::inventory::{Inventory, OwnerCtx};
use super::petal::{Petal, PetalSnapshot};
use crate::config::SimConfig;
use crate::defs::{PetalDefId, PetalRegistry};

/// World-unique entity identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity type discriminator used by collision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Petal,
    Mob,
}

/// A player (flower) entity
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    /// Max health before equipment modifiers
    pub base_max_health: f32,
    /// Max health with modifiers applied (refreshed every tick)
    pub max_health: f32,
    /// Movement factor from modifiers (refreshed every tick)
    pub speed_multiplier: f32,
    pub alive: bool,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2, cfg: &SimConfig) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: cfg.player_radius,
            health: cfg.player_max_health,
            base_max_health: cfg.player_max_health,
            max_health: cfg.player_max_health,
            speed_multiplier: 1.0,
            alive: true,
            inventory: Inventory::new(cfg),
        }
    }

    pub fn hitbox(&self) -> CircleHitbox {
        CircleHitbox::new(self.pos, self.radius)
    }

    /// Read-only owner view handed to petals while they tick
    pub fn owner_ctx(&self) -> OwnerCtx {
        OwnerCtx {
            id: self.id,
            pos: self.pos,
            health: self.health,
            max_health: self.max_health,
            radius: self.radius,
        }
    }

    /// Take damage; returns true if the player died
    pub fn receive_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Heal, clamped to max health
    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.health = (self.health + amount).min(self.max_health);
        }
    }
}

/// A mob entity (damage sink; behavior lives outside the core)
#[derive(Debug, Clone)]
pub struct Mob {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
}

impl Mob {
    pub fn new(id: EntityId, pos: Vec2, radius: f32, health: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            health,
            max_health: health,
            alive: true,
        }
    }

    pub fn hitbox(&self) -> CircleHitbox {
        CircleHitbox::new(self.pos, self.radius)
    }

    /// Take damage; returns true if the mob died
    pub fn receive_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// Observable simulation events, drained by the embedding server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A petal's health was exhausted and it dropped into reload
    PetalBroken {
        petal: EntityId,
        owner: EntityId,
        attacker: EntityId,
    },
    /// A use-effect heal landed on a player
    PlayerHealed { player: EntityId, amount: f32 },
    PlayerDied { player: EntityId, killer: EntityId },
    MobDied { mob: EntityId, killer: EntityId },
}

/// Validated inventory command, buffered until the next tick
#[derive(Debug, Clone)]
pub enum SlotCommand {
    Equip {
        player: EntityId,
        slot: usize,
        def: PetalDefId,
    },
    Delete {
        player: EntityId,
        slot: usize,
    },
    Swap {
        player: EntityId,
        a: usize,
        b: usize,
    },
}

/// Rejection of a malformed external command at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownDefinition(String),
    UnknownPlayer(EntityId),
    SlotOutOfRange(usize),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownDefinition(name) => {
                write!(f, "unknown petal definition '{name}'")
            }
            CommandError::UnknownPlayer(id) => write!(f, "unknown player {id}"),
            CommandError::SlotOutOfRange(slot) => write!(f, "slot {slot} out of range"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: SimConfig,
    pub defs: PetalRegistry,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Active players (sorted by id for determinism)
    pub players: Vec<Player>,
    /// Active mobs (sorted by id for determinism)
    pub mobs: Vec<Mob>,
    /// Shared broad-phase index, rebuilt at the start of every tick
    pub grid: SpatialGrid,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    /// Commands waiting for the next tick boundary
    pub(crate) pending_commands: Vec<SlotCommand>,
    pub(crate) next_id: u32,
}

impl GameState {
    pub fn new(config: SimConfig, defs: PetalRegistry) -> Self {
        let grid = SpatialGrid::new(config.grid_cell_size);
        Self {
            config,
            defs,
            time_ticks: 0,
            players: Vec::new(),
            mobs: Vec::new(),
            grid,
            events: Vec::new(),
            pending_commands: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn_player(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let player = Player::new(id, pos, &self.config);
        self.players.push(player);
        id
    }

    pub fn spawn_mob(&mut self, pos: Vec2, radius: f32, health: f32) -> EntityId {
        let id = self.next_entity_id();
        self.mobs.push(Mob::new(id, pos, radius, health));
        id
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.mobs.iter().find(|m| m.id == id)
    }

    pub fn mob_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        self.mobs.iter_mut().find(|m| m.id == id)
    }

    /// Drop a player and everything it owns before the next tick
    pub fn despawn_player(&mut self, id: EntityId) {
        if let Some(player) = self.player(id) {
            let petal_ids: Vec<EntityId> =
                player.inventory.petals().map(|(_, p)| p.id).collect();
            for petal_id in petal_ids {
                self.grid.remove(petal_id);
            }
        }
        self.grid.remove(id);
        self.players.retain(|p| p.id != id);
    }

    fn validate_slot(&self, player: EntityId, slot: usize) -> Result<(), CommandError> {
        let player = self
            .player(player)
            .ok_or(CommandError::UnknownPlayer(player))?;
        if slot >= player.inventory.slot_count() {
            return Err(CommandError::SlotOutOfRange(slot));
        }
        Ok(())
    }

    /// Buffer an equip command; the definition name is resolved (and
    /// rejected if unknown) here at the boundary
    pub fn queue_equip(
        &mut self,
        player: EntityId,
        slot: usize,
        def_name: &str,
    ) -> Result<(), CommandError> {
        self.validate_slot(player, slot)?;
        let def = self
            .defs
            .get(def_name)
            .ok_or_else(|| CommandError::UnknownDefinition(def_name.to_string()))?;
        self.pending_commands
            .push(SlotCommand::Equip { player, slot, def });
        Ok(())
    }

    /// Buffer a slot delete
    pub fn queue_delete(&mut self, player: EntityId, slot: usize) -> Result<(), CommandError> {
        self.validate_slot(player, slot)?;
        self.pending_commands.push(SlotCommand::Delete { player, slot });
        Ok(())
    }

    /// Buffer a two-slot swap
    pub fn queue_swap(
        &mut self,
        player: EntityId,
        a: usize,
        b: usize,
    ) -> Result<(), CommandError> {
        self.validate_slot(player, a)?;
        self.validate_slot(player, b)?;
        self.pending_commands.push(SlotCommand::Swap { player, a, b });
        Ok(())
    }

    /// Drain events accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshots of petals whose reloading state changed, clearing the
    /// dirty flags (delta synchronization)
    pub fn drain_dirty_petals(&mut self) -> Vec<PetalSnapshot> {
        let mut out = Vec::new();
        for player in &mut self.players {
            player.inventory.drain_dirty(&mut out);
        }
        out
    }

    /// Snapshots of every live petal (initial full synchronization)
    pub fn full_petal_snapshot(&self) -> Vec<PetalSnapshot> {
        self.players
            .iter()
            .flat_map(|p| p.inventory.petals())
            .map(|(def, petal)| petal.snapshot(def))
            .collect()
    }

    /// Locate a petal and its owning player's id
    pub fn petal_mut(&mut self, id: EntityId) -> Option<(EntityId, &mut Petal)> {
        for player in &mut self.players {
            let owner = player.id;
            if let Some(petal) = player.inventory.petal_mut(id) {
                return Some((owner, petal));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(SimConfig::default(), PetalRegistry::builtin())
    }

    #[test]
    fn test_spawn_ids_increase() {
        let mut st = state();
        let a = st.spawn_player(Vec2::ZERO);
        let b = st.spawn_mob(Vec2::ONE, 1.0, 50.0);
        assert!(a < b);
    }

    #[test]
    fn test_queue_equip_rejects_unknown_definition() {
        let mut st = state();
        let p = st.spawn_player(Vec2::ZERO);
        assert_eq!(
            st.queue_equip(p, 0, "nonexistent"),
            Err(CommandError::UnknownDefinition("nonexistent".into()))
        );
        assert!(st.pending_commands.is_empty());
    }

    #[test]
    fn test_queue_equip_rejects_bad_slot_and_player() {
        let mut st = state();
        let p = st.spawn_player(Vec2::ZERO);
        let bad_slot = st.config.equipped_slots + st.config.preparation_slots;
        assert_eq!(
            st.queue_equip(p, bad_slot, "basic"),
            Err(CommandError::SlotOutOfRange(bad_slot))
        );
        assert_eq!(
            st.queue_equip(EntityId(999), 0, "basic"),
            Err(CommandError::UnknownPlayer(EntityId(999)))
        );
    }

    #[test]
    fn test_player_heal_clamps_to_max() {
        let mut st = state();
        let id = st.spawn_player(Vec2::ZERO);
        let player = st.player_mut(id).unwrap();
        player.health = 90.0;
        player.heal(25.0);
        assert!((player.health - player.max_health).abs() < f32::EPSILON);
    }

    #[test]
    fn test_despawn_player_drops_petals() {
        let mut st = state();
        let id = st.spawn_player(Vec2::ZERO);
        st.queue_equip(id, 0, "basic").unwrap();
        crate::sim::tick(&mut st, crate::consts::SIM_DT);
        assert_eq!(st.full_petal_snapshot().len(), 1);

        st.despawn_player(id);
        assert!(st.players.is_empty());
        assert!(st.full_petal_snapshot().is_empty());
    }
}
