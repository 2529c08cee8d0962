//! Run-wide generation settings.

use serde::{Deserialize, Serialize};

use crate::climate::ClimateConfig;
use crate::erosion::ErosionConfig;
use crate::rivers::RiverConfig;
use crate::tectonics::TectonicConfig;

/// Relief class boundaries, in elevation units above sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliefThresholds {
    pub hills: u8,
    pub mountains: u8,
}

impl Default for ReliefThresholds {
    fn default() -> Self {
        Self { hills: 30, mountains: 70 }
    }
}

/// Seed plus every tunable coefficient of a run.
///
/// Read-only input: stages receive it through the `WorldContext` and never
/// consult ambient process state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub seed: u64,
    /// Run per-cell maps on the rayon pool. Results are identical either way.
    pub parallel: bool,
    /// Overrides the ocean fraction implied by the planet's water coverage.
    pub ocean_coverage: Option<f32>,
    pub relief: ReliefThresholds,
    /// Meters represented by one elevation unit.
    pub elevation_step_m: f32,
    pub tectonics: TectonicConfig,
    pub climate: ClimateConfig,
    pub erosion: ErosionConfig,
    pub rivers: RiverConfig,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            parallel: true,
            ocean_coverage: None,
            relief: ReliefThresholds::default(),
            elevation_step_m: 50.0,
            tectonics: TectonicConfig::default(),
            climate: ClimateConfig::default(),
            erosion: ErosionConfig::default(),
            rivers: RiverConfig::default(),
        }
    }
}

impl GenerationSettings {
    /// Default settings with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Default::default() }
    }

    /// Reduced iteration counts for small grids and tests.
    pub fn fast(seed: u64) -> Self {
        Self {
            seed,
            climate: ClimateConfig::fast(),
            erosion: ErosionConfig::fast(),
            ..Default::default()
        }
    }
}
