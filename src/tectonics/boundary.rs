//! Plate boundary classification.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Type of plate boundary based on relative motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryType {
    /// Plates moving toward each other (collision/subduction zones).
    Convergent,
    /// Plates moving apart (spreading ridges/rifts).
    Divergent,
    /// Plates sliding past each other (transform faults).
    Transform,
}

/// Relative motion of two plates across one cell edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryMotion {
    pub kind: BoundaryType,
    /// Rate at which the plates close (negative when separating).
    pub closing_rate: f32,
    pub shear_rate: f32,
}

impl BoundaryMotion {
    /// Magnitude of the relative motion.
    pub fn speed(&self) -> f32 {
        (self.closing_rate * self.closing_rate + self.shear_rate * self.shear_rate).sqrt()
    }
}

/// Classifies the motion of the plate carrying `drift_a` against the plate
/// carrying `drift_b`, across an edge pointing from A toward B along `normal`.
pub fn classify_boundary(drift_a: Vec2, drift_b: Vec2, normal: Vec2) -> BoundaryMotion {
    let relative = drift_a - drift_b;
    let normal = normal.normalize_or_zero();

    // Positive when A advances into B.
    let closing_rate = relative.dot(normal);
    let shear_rate = (relative - normal * closing_rate).length();

    let total_rate = (closing_rate.abs() + shear_rate).max(1e-10);
    let approach_fraction = closing_rate.abs() / total_rate;

    let kind = if approach_fraction > 0.4 {
        if closing_rate > 0.0 {
            BoundaryType::Convergent
        } else {
            BoundaryType::Divergent
        }
    } else {
        BoundaryType::Transform
    };

    BoundaryMotion { kind, closing_rate, shear_rate }
}
