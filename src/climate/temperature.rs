//! Temperature model: radiative baseline, diurnal swing and advection.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

use super::grid::ClimateGrid;
use super::ClimateConfig;
use crate::exec::fill_cells;
use crate::terrain::PlanetConfiguration;

/// Radiative-equilibrium temperature (°C) for one cell.
///
/// Spun planets use a latitudinal gradient between the planet's extremes plus
/// a tilt-scaled seasonal term; tidally locked planets are warmest at the
/// substellar point (0°, 0°) and coldest on the night side, softened by
/// atmospheric heat transport.
pub fn equilibrium_temperature(
    latitude_rad: f32,
    longitude_rad: f32,
    height_km: f32,
    is_water: bool,
    season_sin: f32,
    planet: &PlanetConfiguration,
    cfg: &ClimateConfig,
) -> f32 {
    let span = (planet.max_temperature_c - planet.min_temperature_c).max(0.0);
    let hot = planet.max_temperature_c - cfg.extreme_margin * span;
    let cold = planet.min_temperature_c + cfg.extreme_margin * span;

    let baseline = if planet.tidally_locked {
        let insolation = (latitude_rad.cos() * longitude_rad.cos()).max(0.0);
        let local = cold + (hot - cold) * insolation.powf(0.25);
        let density = planet.atmosphere_density.max(0.0);
        let transport = cfg.locked_heat_transport * density / (density + 1.0);
        local + (0.5 * (hot + cold) - local) * transport
    } else {
        // Nonlinear curve gives larger polar contrast.
        let t = (latitude_rad.abs() / FRAC_PI_2).clamp(0.0, 1.0);
        let lat_w = t.powf(1.15);
        let base = hot * (1.0 - lat_w) + cold * lat_w;

        // season_sin is +1 at northern summer; the latitude sign flips seasons across hemispheres.
        let tilt_scale = (planet.axial_tilt_deg / 23.44).clamp(0.0, 2.0);
        let seasonal = season_sin * cfg.seasonality_c * (span / 80.0).min(2.0) * tilt_scale * latitude_rad.sin();
        // Water is moderated; land gets the full seasonal swing.
        base + if is_water { seasonal * 0.35 } else { seasonal }
    };

    let lapse = if planet.is_airless() { 0.0 } else { cfg.lapse_rate_c_per_km * height_km.max(0.0) };
    baseline - lapse
}

/// Half the day/night temperature range of a cell.
pub fn diurnal_amplitude(is_water: bool, planet: &PlanetConfiguration, cfg: &ClimateConfig) -> f32 {
    if planet.tidally_locked {
        return 0.0;
    }
    let surface = if is_water { 0.3 } else { 1.0 };
    let spin = (planet.rotation_period_hours / 24.0).max(0.0).sqrt().clamp(0.3, 4.0);
    let buffering = 2.0 / (1.0 + planet.atmosphere_density.max(0.0));
    0.5 * cfg.diurnal_range_c * surface * spin * buffering
}

/// Temperature offset at day fraction `phase` for a cell at `longitude_rad`.
///
/// Peaks in the local afternoon; averages to zero over a day.
pub fn diurnal_offset(amplitude: f32, phase: f32, longitude_rad: f32) -> f32 {
    amplitude * (TAU * phase + longitude_rad - PI * 0.6).cos()
}

/// Advects temperature along the wind for `cfg.advection_steps` sub-iterations.
///
/// Each step blends the upwind-weighted neighbor temperature into the cell,
/// mixes with neighbors near the 30° and 60° shear bands (stronger in the
/// winter hemisphere), and relaxes toward `equilibrium`.
pub fn advect_temperature(
    grid: &ClimateGrid,
    cfg: &ClimateConfig,
    wind: &[Vec2],
    equilibrium: &[f32],
    season_sin: f32,
) -> Vec<f32> {
    let mut current = equilibrium.to_vec();
    let mut next = vec![0.0f32; grid.len()];

    for _ in 0..cfg.advection_steps {
        fill_cells(grid.parallel, &mut next, |i| {
            let t = current[i];
            let w = wind[i];
            let speed = w.length();

            let mut advected = t;
            if speed > 1e-3 {
                let dir = w / speed;
                let (mut sum, mut weight) = (0.0, 0.0);
                for (k, &j) in grid.neighbors(i).iter().enumerate() {
                    // Neighbors opposite the wind direction lie upwind.
                    let upwind = (-dir.dot(grid.frames.directions[i][k])).max(0.0);
                    sum += upwind * current[j];
                    weight += upwind;
                }
                if weight > 1e-6 {
                    let courant = (cfg.advection_rate * speed / cfg.max_wind_m_s.max(1.0) * 4.0).min(0.5);
                    advected += courant * (sum / weight - t);
                }
            }

            let lat = grid.latitude[i].to_degrees();
            let band = (-((lat.abs() - 30.0) / 8.0).powi(2)).exp() + (-((lat.abs() - 60.0) / 8.0).powi(2)).exp();
            let winter = -season_sin * lat.signum();
            let asymmetry = (1.0 + cfg.seasonal_asymmetry * winter).clamp(0.0, 2.0);
            let eddy = (cfg.eddy_mixing * band * asymmetry).min(0.5);
            advected += eddy * (grid.neighbor_mean(&current, i) - t);

            advected + cfg.radiative_relaxation * (equilibrium[i] - advected)
        });
        std::mem::swap(&mut current, &mut next);
    }

    current
}
