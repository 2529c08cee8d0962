//! Climate configuration parameters.

use serde::{Deserialize, Serialize};

/// Configuration for the climate, wind and moisture solver.
///
/// Units:
/// - temperatures: °C
/// - wind: m/s
/// - heights and distances: km
/// - moisture: mm of water (kg/m²), rates in mm/day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateConfig {
    // Season sampling
    pub seasons: u32,
    pub season_phase: f32, // fraction of year [0,1)

    // Temperature model
    /// Share of the planet's temperature span kept in reserve for seasonal
    /// and diurnal swings when placing the equator and pole baselines.
    pub extreme_margin: f32,
    pub seasonality_c: f32, // seasonal amplitude at the poles for ~23.5° tilt
    pub lapse_rate_c_per_km: f32,
    pub locked_heat_transport: f32,
    pub diurnal_range_c: f32,

    // Pressure model
    pub scale_height_km: f32,
    pub thermal_low_hpa_per_c: f32,

    // Phase A: initial wind field
    pub band_speed_m_s: f32,
    pub itcz_shift_deg: f32,
    pub meridional_strength: f32, // 0..1, mixes north/south into zonal flow
    pub wind_jitter_m_s: f32,
    pub roughness_damping: f32,

    // Phase B: relaxation
    pub wind_iterations: u32,
    pub wind_smoothing: f32,
    /// m/s per (hPa/km) of pressure gradient.
    pub pressure_force: f32,
    /// m/s per (°C/km) of temperature gradient.
    pub thermal_force: f32,
    pub channeling: f32,
    pub uphill_resistance: f32,
    pub valley_bias: f32,
    /// Time scale of the Coriolis deflection of gradient forcing, in seconds.
    pub coriolis_step_s: f32,
    pub drag: f32,
    pub turbulence_m_s: f32,
    pub max_wind_m_s: f32,

    // Temperature advection
    pub advection_steps: u32,
    pub advection_rate: f32,
    pub eddy_mixing: f32,
    pub seasonal_asymmetry: f32,
    pub radiative_relaxation: f32,

    // Phase C: moisture cycle
    pub steps_per_day: u32,
    pub spinup_days: u32,
    pub initial_humidity: f32,
    pub soil_capacity_mm: f32,
    pub initial_soil: f32,
    pub ocean_evaporation_mm_day: f32,
    pub land_evaporation_mm_day: f32,
    pub ice_sublimation: f32,
    /// Fractional evaporation boost per m/s of wind.
    pub wind_evaporation: f32,
    pub max_outflow: f32,
    /// Transport penalty per km of rise toward a neighbor.
    pub uphill_penalty: f32,
    pub stratiform_rate: f32,
    pub condensation_rate: f32,
    pub convective_threshold_c: f32,
    pub convective_rate: f32,
    pub orographic_rate: f32,
    pub rain_shadow: f32,
    pub land_rain_cap: f32,
    pub water_rain_cap: f32,
    pub infiltration_base: f32,
    pub infiltration_soil: f32,
    pub infiltration_slope: f32,
    pub soil_diffusion: f32,
    pub wetland_diffusion: f32,
    pub ocean_target_humidity: f32,
    pub ocean_relaxation: f32,
    pub vapor_mixing: f32,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        // Tuned for believable outputs rather than strict physical realism.
        Self {
            seasons: 4,
            season_phase: 0.0,

            extreme_margin: 0.12,
            seasonality_c: 25.0,
            lapse_rate_c_per_km: 6.5,
            locked_heat_transport: 0.5,
            diurnal_range_c: 10.0,

            scale_height_km: 8.5,
            thermal_low_hpa_per_c: 0.4,

            band_speed_m_s: 8.0,
            itcz_shift_deg: 10.0,
            meridional_strength: 0.25,
            wind_jitter_m_s: 0.8,
            roughness_damping: 0.35,

            wind_iterations: 24,
            wind_smoothing: 0.3,
            pressure_force: 150.0,
            thermal_force: 250.0,
            channeling: 0.3,
            uphill_resistance: 2.0,
            valley_bias: 0.5,
            coriolis_step_s: 6000.0,
            drag: 0.04,
            turbulence_m_s: 0.3,
            max_wind_m_s: 40.0,

            advection_steps: 8,
            advection_rate: 0.25,
            eddy_mixing: 0.1,
            seasonal_asymmetry: 0.3,
            radiative_relaxation: 0.15,

            steps_per_day: 8,
            spinup_days: 3,
            initial_humidity: 0.5,
            soil_capacity_mm: 150.0,
            initial_soil: 0.3,
            ocean_evaporation_mm_day: 4.0,
            land_evaporation_mm_day: 3.0,
            ice_sublimation: 0.1,
            wind_evaporation: 0.08,
            max_outflow: 0.6,
            uphill_penalty: 1.5,
            stratiform_rate: 1.0,
            condensation_rate: 0.5,
            convective_threshold_c: 20.0,
            convective_rate: 0.6,
            orographic_rate: 4.0,
            rain_shadow: 10.0,
            land_rain_cap: 0.5,
            water_rain_cap: 0.35,
            infiltration_base: 0.4,
            infiltration_soil: 0.4,
            infiltration_slope: 4.0,
            soil_diffusion: 0.1,
            wetland_diffusion: 0.3,
            ocean_target_humidity: 0.8,
            ocean_relaxation: 0.2,
            vapor_mixing: 0.05,
        }
    }
}

impl ClimateConfig {
    pub fn earth_like() -> Self {
        Self::default()
    }

    /// Fewer seasons, iterations and sub-steps; for small grids and tests.
    pub fn fast() -> Self {
        Self {
            seasons: 1,
            wind_iterations: 8,
            advection_steps: 3,
            steps_per_day: 4,
            spinup_days: 1,
            ..Self::default()
        }
    }

    /// Length of one moisture sub-step in days.
    pub fn step_days(&self) -> f32 {
        1.0 / self.steps_per_day.max(1) as f32
    }
}
