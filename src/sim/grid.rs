//! Uniform spatial hash over circle hitboxes
//!
//! Broad-phase index shared by the whole world. Entries are registered into
//! every cell their hitbox touches; queries gather candidate entries from
//! the covered cells and may therefore contain false positives - callers
//! must re-check with a precise intersection test. Results are sorted by
//! entity id so iteration order is deterministic.
//!
//! The world rebuilds the grid at the start of each tick; within a tick it
//! is read-only (single-threaded sequential access, no locking).

use std::collections::HashMap;

use super::hitbox::CircleHitbox;
use super::state::{EntityId, EntityKind};

/// One indexed entity
#[derive(Debug, Clone, Copy)]
pub struct GridEntry {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Owning player, for petals (ownership exclusions during collision)
    pub owner: Option<EntityId>,
    pub hitbox: CircleHitbox,
}

/// Spatial hash keyed by integer cell coordinates
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<GridEntry>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Cell range covered by a hitbox's bounding box
    fn cell_range(&self, hitbox: &CircleHitbox) -> ((i32, i32), (i32, i32)) {
        let min = self.cell_of(hitbox.pos.x - hitbox.radius, hitbox.pos.y - hitbox.radius);
        let max = self.cell_of(hitbox.pos.x + hitbox.radius, hitbox.pos.y + hitbox.radius);
        (min, max)
    }

    /// Drop all entries, keeping cell allocations for reuse
    pub fn clear(&mut self) {
        for entries in self.cells.values_mut() {
            entries.clear();
        }
    }

    /// Register an entity into every cell its hitbox touches
    pub fn insert(&mut self, entry: GridEntry) {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(&entry.hitbox);
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(entry);
            }
        }
    }

    /// Remove an entity from all cells (despawn path)
    pub fn remove(&mut self, id: EntityId) {
        for entries in self.cells.values_mut() {
            entries.retain(|e| e.id != id);
        }
    }

    /// Candidate entries whose cells overlap the query hitbox
    ///
    /// Sorted by id, deduplicated. May include entries that do not actually
    /// intersect the query circle.
    pub fn query(&self, hitbox: &CircleHitbox) -> Vec<GridEntry> {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(hitbox);
        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(entries) = self.cells.get(&(cx, cy)) {
                    found.extend_from_slice(entries);
                }
            }
        }
        found.sort_by_key(|e| e.id);
        found.dedup_by_key(|e| e.id);
        found
    }
}
