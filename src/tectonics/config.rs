//! Configuration for the tectonic relief stages.

use serde::{Deserialize, Serialize};

/// Tunables for plate assignment, stress and relief.
///
/// Elevations are in grid units (0..=255); heights and caps are quoted for
/// 1 g and divided by surface gravity when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TectonicConfig {
    /// Fraction of cells on continental plates (0.3-0.4 for Earth-like).
    pub continental_fraction: f32,
    /// Extra flood-fill cost per step drawn from the hash (0 = uniform growth).
    pub growth_noise: f32,

    /// Mean plate drift speed (arbitrary units, cm/year scale).
    pub drift_scale: f32,
    /// Random variation in drift speed (0.0-1.0).
    pub drift_randomness: f32,

    /// Stress weight of converging plates.
    pub collision_stress: f32,
    /// Stress weight of separating plates.
    pub divergence_stress: f32,
    /// Stress weight of plates sliding past each other.
    pub shear_stress: f32,
    /// Rings of cells that boundary stress spreads into.
    pub stress_spread: usize,
    /// Decay per ring of spread.
    pub stress_falloff: f32,

    /// Base elevation of continental crust.
    pub continental_base: f32,
    /// Base elevation of oceanic crust.
    pub oceanic_base: f32,
    /// Amplitude of per-cell elevation jitter.
    pub elevation_jitter: f32,
    /// Elevation gained per unit stress.
    pub uplift_scale: f32,

    /// Stress at which a convergent boundary raises mountains.
    pub mountain_stress: f32,
    /// Stress at which a boundary raises hills.
    pub hill_stress: f32,
    pub mountain_height: f32,
    pub hill_height: f32,
    /// Highest elevation relief may reach at 1 g.
    pub relief_cap: f32,

    /// World volcanism intensity (0.0-1.0).
    pub volcanism: f32,
    /// Per-cell hotspot probability at full intensity.
    pub hotspot_rate: f32,
    pub volcano_height: f32,
}

impl Default for TectonicConfig {
    fn default() -> Self {
        Self {
            continental_fraction: 0.35,
            growth_noise: 0.6,
            drift_scale: 5.0,
            drift_randomness: 0.3,
            collision_stress: 1.0,
            divergence_stress: 0.45,
            shear_stress: 0.25,
            stress_spread: 2,
            stress_falloff: 0.5,
            continental_base: 110.0,
            oceanic_base: 60.0,
            elevation_jitter: 8.0,
            uplift_scale: 30.0,
            mountain_stress: 0.55,
            hill_stress: 0.25,
            mountain_height: 60.0,
            hill_height: 20.0,
            relief_cap: 230.0,
            volcanism: 0.3,
            hotspot_rate: 0.002,
            volcano_height: 20.0,
        }
    }
}

impl TectonicConfig {
    /// Earth-like defaults.
    pub fn earth_like() -> Self {
        Self::default()
    }

    /// Fast, violent tectonics with more volcanism.
    pub fn active() -> Self {
        Self {
            drift_scale: 8.0,
            drift_randomness: 0.4,
            uplift_scale: 40.0,
            mountain_height: 75.0,
            volcanism: 0.6,
            ..Default::default()
        }
    }

    /// Slow plates and worn relief.
    pub fn stable() -> Self {
        Self {
            drift_scale: 2.0,
            drift_randomness: 0.2,
            uplift_scale: 20.0,
            mountain_height: 40.0,
            volcanism: 0.1,
            ..Default::default()
        }
    }

    /// Elevation ceiling for relief on a planet with the given surface gravity.
    pub fn cap_for_gravity(&self, gravity: f32) -> f32 {
        (self.relief_cap / gravity.max(0.1)).min(255.0)
    }
}
