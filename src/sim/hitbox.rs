//! Circular hitboxes and intersection tests
//!
//! Every simulated entity (player, mob, petal) carries a circle hitbox.
//! The spatial grid answers broad-phase queries with possible false
//! positives; `intersects` is the precise check.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A circular collision region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleHitbox {
    pub pos: Vec2,
    pub radius: f32,
}

impl CircleHitbox {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    /// Same center with a different radius (interaction-range checks)
    pub fn with_radius(&self, radius: f32) -> Self {
        Self {
            pos: self.pos,
            radius,
        }
    }

    /// Precise circle-circle overlap test
    pub fn intersects(&self, other: &CircleHitbox) -> bool {
        let r = self.radius + other.radius;
        self.pos.distance_squared(other.pos) < r * r
    }
}
