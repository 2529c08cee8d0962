//! Erosion configuration.

use serde::{Deserialize, Serialize};

/// Parameters for the iterative erosion solver.
///
/// Rates are per iteration, in elevation units; `talus` is the height step
/// (elevation units) a slope tolerates before thermal creep starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosionConfig {
    /// Number of erosion iterations.
    pub iterations: u32,

    /// Talus threshold in elevation units.
    pub talus: f32,
    /// Fraction of excess slope moved per iteration.
    pub thermal_strength: f32,

    /// Hydraulic removal per (mm/day of precipitation × slope above talus).
    pub hydraulic_rate: f32,

    /// Aeolian removal per (10 m/s of wind × dryness).
    pub aeolian_rate: f32,

    /// Largest fraction of its elevation a cell may lose in one iteration.
    pub max_removal_fraction: f32,
    /// Fraction of thermal + hydraulic removal deposited on the downhill neighbor.
    pub deposition_fraction: f32,

    /// Reclassify relief every this many iterations (0 = only at the end).
    pub reclassify_every: u32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            iterations: 40,
            talus: 8.0,
            thermal_strength: 0.25,
            hydraulic_rate: 0.02,
            aeolian_rate: 0.05,
            max_removal_fraction: 0.05,
            deposition_fraction: 0.5,
            reclassify_every: 10,
        }
    }
}

impl ErosionConfig {
    /// Fewer iterations for small grids and tests.
    pub fn fast() -> Self {
        Self { iterations: 10, reclassify_every: 5, ..Self::default() }
    }
}
