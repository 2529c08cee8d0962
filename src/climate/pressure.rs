//! Surface pressure model.

use super::ClimateConfig;
use crate::terrain::{PlanetConfiguration, EARTH_SURFACE_PRESSURE_HPA};

/// Surface pressure (hPa) at a cell.
///
/// Sea-level pressure from density and gravity, reduced with height over a
/// gravity-scaled scale height, plus a thermal anomaly: air warmer than
/// `reference_c` sits in a low, colder air in a high.
pub fn surface_pressure(
    planet: &PlanetConfiguration,
    cfg: &ClimateConfig,
    height_km: f32,
    temperature_c: f32,
    reference_c: f32,
) -> f32 {
    let sea_level = planet.surface_pressure_hpa();
    if sea_level <= 0.0 {
        return 0.0;
    }
    let scale_height = cfg.scale_height_km / planet.gravity.max(0.1);
    let hydrostatic = sea_level * (-height_km.max(0.0) / scale_height).exp();
    let anomaly = -cfg.thermal_low_hpa_per_c * (temperature_c - reference_c) * sea_level / EARTH_SURFACE_PRESSURE_HPA;
    (hydrostatic + anomaly).max(0.0)
}
