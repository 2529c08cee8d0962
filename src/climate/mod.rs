//! Climate, wind and moisture solver.
//!
//! Phase A builds a banded (or day-to-night) wind field, phase B relaxes it
//! and advects temperature, phase C runs a multi-day moisture budget. The
//! phases repeat for each seasonal sample.

mod config;
mod grid;
mod moisture;
mod pressure;
mod solver;
mod temperature;
mod util;
mod wind;

pub use config::ClimateConfig;
pub use grid::ClimateGrid;
pub use moisture::{advect_vapor, run_moisture_cycle, AdvectionPlan, MoistureFields};
pub use pressure::surface_pressure;
pub use solver::{simulate_climate, ClimateSummary};
pub use temperature::{advect_temperature, diurnal_amplitude, diurnal_offset, equilibrium_temperature};
pub use util::{
    boiling_point_c, saturation_column_mm, saturation_vapor_pressure_hpa, season_phase_sin,
    supports_liquid_water,
};
pub use wind::{band_wind, initial_wind, relax_wind};
