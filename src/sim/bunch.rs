//! Petal bunches: same-definition groups sharing one inventory slot
//!
//! Duplicate definitions ("sand", "peas"-style petals) spawn one petal per
//! visual piece; everything else spawns a single petal. The bunch spreads
//! its petals evenly across the angular slice the inventory assigns it.

use glam::Vec2;

use super::grid::SpatialGrid;
use super::inventory::OwnerCtx;
use super::petal::{Impact, Petal};
use super::state::EntityId;
use crate::config::SimConfig;
use crate::defs::{PetalDefId, PetalDefinition};
use crate::polar_to_cartesian;

/// A group of petal instances spawned from one slot's definition
#[derive(Debug, Clone)]
pub struct PetalBunch {
    def_id: PetalDefId,
    petals: Vec<Petal>,
}

impl PetalBunch {
    /// Spawn the bunch's petals at the owner's position
    pub fn new(
        def_id: PetalDefId,
        def: &PetalDefinition,
        owner_pos: Vec2,
        next_id: &mut u32,
    ) -> Self {
        let count = def.displayed_pieces();
        let mut petals = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = EntityId(*next_id);
            *next_id += 1;
            petals.push(Petal::new(id, def, owner_pos));
        }
        Self { def_id, petals }
    }

    pub fn def_id(&self) -> PetalDefId {
        self.def_id
    }

    /// Visual pieces this bunch occupies on the ring
    ///
    /// Reloading and using petals still count, so the ring does not jump
    /// when a petal temporarily leaves formation.
    pub fn total_displayed_pieces(&self) -> u32 {
        self.petals.len() as u32
    }

    pub fn petals(&self) -> &[Petal] {
        &self.petals
    }

    pub fn petals_mut(&mut self) -> &mut [Petal] {
        &mut self.petals
    }

    /// Advance every petal, assigning each an equal sub-slice of the
    /// bunch's angular slice starting at `base_angle`
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        def: &PetalDefinition,
        owner: &OwnerCtx,
        grid: &SpatialGrid,
        cfg: &SimConfig,
        now_ticks: u64,
        dt: f32,
        radius: f32,
        base_angle: f32,
        piece_slice: f32,
        impacts: &mut Vec<Impact>,
    ) {
        for (i, petal) in self.petals.iter_mut().enumerate() {
            let angle = base_angle + piece_slice * i as f32;
            let ring_pos = owner.pos + polar_to_cartesian(radius, angle);
            petal.tick(def, owner, ring_pos, grid, cfg, now_ticks, dt, impacts);
        }
    }
}
