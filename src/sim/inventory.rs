//! Inventory and ring layout
//!
//! Owns one player's ordered bunches and arranges their pieces evenly
//! around the orbit circle. All bunches share a single revolution angle so
//! the ring stays visually synchronized; each bunch is assigned a
//! contiguous angular slice proportional to its displayed pieces, in
//! stable slot order (equipped slots first, then preparation), which makes
//! the layout deterministic given the same equip history.

use std::f32::consts::TAU;

use glam::Vec2;

use super::bunch::PetalBunch;
use super::grid::SpatialGrid;
use super::petal::{Impact, Petal, PetalSnapshot};
use super::state::EntityId;
use crate::config::SimConfig;
use crate::defs::{Modifiers, PetalDefId, PetalRegistry};

/// Owner fields a petal needs while ticking (read-only view of the player)
#[derive(Debug, Clone, Copy)]
pub struct OwnerCtx {
    pub id: EntityId,
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub radius: f32,
}

/// One player's petal slots and ring state
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Slots `0..equipped_count` spawn bunches; the rest are preparation
    equipped_count: usize,
    slots: Vec<Option<PetalDefId>>,
    /// Parallel to the equipped slots
    bunches: Vec<Option<PetalBunch>>,
    /// Shared ring rotation (radians, wrapped mod 2π)
    pub revolution_angle: f32,
    /// Orbit radius (world units)
    pub range: f32,
}

impl Inventory {
    pub fn new(cfg: &SimConfig) -> Self {
        Self {
            equipped_count: cfg.equipped_slots,
            slots: vec![None; cfg.equipped_slots + cfg.preparation_slots],
            bunches: vec![None; cfg.equipped_slots],
            revolution_angle: 0.0,
            range: cfg.ring_range,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn equipped_count(&self) -> usize {
        self.equipped_count
    }

    pub fn slot(&self, index: usize) -> Option<PetalDefId> {
        self.slots.get(index).copied().flatten()
    }

    /// Set a slot's definition and reconcile its bunch
    ///
    /// Idempotent: re-equipping the definition a slot already holds keeps
    /// the existing bunch (and its petals' reload progress) untouched.
    pub fn set_slot(
        &mut self,
        index: usize,
        def: Option<PetalDefId>,
        defs: &PetalRegistry,
        owner_pos: Vec2,
        next_id: &mut u32,
    ) {
        debug_assert!(index < self.slots.len());
        self.slots[index] = def;
        self.reconcile_slot(index, defs, owner_pos, next_id);
    }

    /// Exchange two slots' definitions and reconcile both
    pub fn swap_slots(
        &mut self,
        a: usize,
        b: usize,
        defs: &PetalRegistry,
        owner_pos: Vec2,
        next_id: &mut u32,
    ) {
        debug_assert!(a < self.slots.len() && b < self.slots.len());
        self.slots.swap(a, b);
        self.reconcile_slot(a, defs, owner_pos, next_id);
        self.reconcile_slot(b, defs, owner_pos, next_id);
    }

    /// Rebuild a slot's bunch only when its definition actually changed
    fn reconcile_slot(
        &mut self,
        index: usize,
        defs: &PetalRegistry,
        owner_pos: Vec2,
        next_id: &mut u32,
    ) {
        if index >= self.equipped_count {
            return; // preparation slots spawn nothing
        }
        let desired = self.slots[index];
        let current = self.bunches[index].as_ref().map(|b| b.def_id());
        if desired == current {
            return;
        }
        self.bunches[index] =
            desired.map(|id| PetalBunch::new(id, defs.def(id), owner_pos, next_id));
    }

    /// Sum of displayed pieces across all bunches
    pub fn total_displayed_pieces(&self) -> u32 {
        self.bunches
            .iter()
            .flatten()
            .map(|b| b.total_displayed_pieces())
            .sum()
    }

    /// Fold the equipped definitions' owner modifiers together
    pub fn aggregate_modifiers(&self, defs: &PetalRegistry) -> Modifiers {
        let mut acc = Modifiers::default();
        for slot in &self.slots[..self.equipped_count] {
            if let Some(id) = slot {
                acc.combine(&defs.def(*id).modifiers);
            }
        }
        acc
    }

    pub fn bunches(&self) -> impl Iterator<Item = &PetalBunch> {
        self.bunches.iter().flatten()
    }

    pub fn petals(&self) -> impl Iterator<Item = (PetalDefId, &Petal)> {
        self.bunches
            .iter()
            .flatten()
            .flat_map(|b| b.petals().iter().map(move |p| (b.def_id(), p)))
    }

    pub fn petals_mut(&mut self) -> impl Iterator<Item = &mut Petal> {
        self.bunches
            .iter_mut()
            .flatten()
            .flat_map(|b| b.petals_mut().iter_mut())
    }

    pub fn petal_mut(&mut self, id: EntityId) -> Option<&mut Petal> {
        self.petals_mut().find(|p| p.id == id)
    }

    /// Collect snapshots of dirty petals and clear their flags
    pub fn drain_dirty(&mut self, out: &mut Vec<PetalSnapshot>) {
        for bunch in self.bunches.iter_mut().flatten() {
            let def = bunch.def_id();
            for petal in bunch.petals_mut() {
                if petal.is_dirty() {
                    out.push(petal.snapshot(def));
                    petal.clear_dirty();
                }
            }
        }
    }

    /// Advance the ring one tick: rotation, slice assignment, petal ticks
    ///
    /// `extra_revolution` is the aggregated `revolution_speed` modifier
    /// (radians/tick on top of the base step). With zero displayed pieces
    /// the whole layout is skipped and the angle does not advance.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        owner: &OwnerCtx,
        grid: &SpatialGrid,
        defs: &PetalRegistry,
        cfg: &SimConfig,
        now_ticks: u64,
        dt: f32,
        extra_revolution: f32,
        impacts: &mut Vec<Impact>,
    ) {
        let total = self.total_displayed_pieces();
        if total == 0 {
            return;
        }

        self.revolution_angle =
            (self.revolution_angle + cfg.revolution_step + extra_revolution) % TAU;

        // Each piece gets an equal share; a bunch's slice is its piece
        // count times that share, accumulated in slot order
        let piece_slice = TAU / total as f32;
        let mut base_angle = self.revolution_angle;
        let range = self.range;

        for bunch in self.bunches.iter_mut().flatten() {
            let def = defs.def(bunch.def_id());
            bunch.tick(
                def,
                owner,
                grid,
                cfg,
                now_ticks,
                dt,
                range,
                base_angle,
                piece_slice,
                impacts,
            );
            base_angle += piece_slice * bunch.total_displayed_pieces() as f32;
        }
    }
}
