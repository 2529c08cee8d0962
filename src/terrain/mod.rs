//! World data model.
//!
//! Provides the cell arena, the planet description, the run settings and the
//! per-run `WorldContext`, plus the base surface classification.

mod cell;
mod planet;
mod settings;
mod context;
mod surface;

pub use cell::{Cell, RiverKind, RiverState, SurfaceType};
pub use planet::{
    PlanetConfiguration, RotationDirection, WaterCoverage, AIRLESS_DENSITY_THRESHOLD,
    EARTH_SURFACE_PRESSURE_HPA,
};
pub use settings::{GenerationSettings, ReliefThresholds};
pub use context::WorldContext;
pub use surface::{classify_base_surface, classify_relief, sea_level_for_fraction, SurfaceSummary};
