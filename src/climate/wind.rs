//! Wind field: banded initial state (phase A) and iterative relaxation (phase B).

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;

use super::grid::ClimateGrid;
use super::util::{soft_clamp, EARTH_ROTATION_RATE};
use super::ClimateConfig;
use crate::exec::{fill_cells, map_cells};
use crate::geometry::{lat_lon_to_unit, to_local};
use crate::noise::{hash_signed, salt};
use crate::terrain::PlanetConfiguration;

/// Prevailing wind (east, north) in m/s for a spinning planet.
///
/// Simplified three-cell approximation relative to the seasonally shifted ITCZ:
/// - 0–30°: easterlies, surface flow toward the equator
/// - 30–60°: westerlies, poleward
/// - 60–90°: polar easterlies, equatorward
///
/// Speed peaks mid-band and weakens toward the calm band edges. Retrograde
/// spin mirrors the zonal component; faster spin strengthens it.
pub fn band_wind(latitude_deg: f32, season_sin: f32, planet: &PlanetConfiguration, cfg: &ClimateConfig) -> Vec2 {
    let tilt_scale = (planet.axial_tilt_deg / 23.44).clamp(0.0, 2.0);
    let itcz = cfg.itcz_shift_deg * season_sin * tilt_scale;
    let rel_lat = latitude_deg - itcz;
    let abs_lat = rel_lat.abs().min(90.0);

    let band = ((abs_lat / 30.0) as u32).min(2);
    let within = (abs_lat - band as f32 * 30.0) / 30.0;
    let amplitude = 0.3 + 0.7 * (std::f32::consts::PI * within).sin();

    let zonal_sign = if band == 1 { 1.0 } else { -1.0 } * planet.rotation.sign();
    let hemisphere = if rel_lat >= 0.0 { 1.0 } else { -1.0 };
    let meridional_sign = if band == 1 { hemisphere } else { -hemisphere };

    let spin = (planet.rotation_rate_rad_s().abs() / EARTH_ROTATION_RATE).clamp(0.2, 3.0).sqrt();
    Vec2::new(
        zonal_sign * amplitude * spin,
        meridional_sign * amplitude * cfg.meridional_strength,
    ) * cfg.band_speed_m_s
}

/// Day-to-night transport for a tidally locked planet, peaking at the terminator.
fn terminator_wind(grid: &ClimateGrid, i: usize, cfg: &ClimateConfig) -> Vec2 {
    let p = grid.frames.points[i];
    let substellar = lat_lon_to_unit(0.0, 0.0);
    let cos_z = p.dot(substellar).clamp(-1.0, 1.0);
    let away = p * cos_z - substellar;
    let dir = to_local(p, away).normalize_or_zero();
    let sin_z = (1.0 - cos_z * cos_z).max(0.0).sqrt();
    dir * (sin_z * cfg.band_speed_m_s * 1.5)
}

/// Phase A: the initial wind field.
///
/// Band (or terminator) flow, jittered by the hash, pushed down the pressure
/// gradient and toward warmer air, damped by surface roughness.
pub fn initial_wind(
    grid: &ClimateGrid,
    planet: &PlanetConfiguration,
    cfg: &ClimateConfig,
    temperature: &[f32],
    pressure: &[f32],
    season_sin: f32,
) -> Vec<Vec2> {
    let pressure_gradient = grid.gradient(pressure);
    let thermal_gradient = grid.gradient(temperature);

    map_cells(grid.parallel, grid.len(), |i| {
        let base = if planet.tidally_locked {
            terminator_wind(grid, i, cfg)
        } else {
            band_wind(grid.latitude[i].to_degrees(), season_sin, planet, cfg)
        };
        let id = i as u64;
        let jitter = Vec2::new(
            hash_signed(grid.seed, id, salt::WIND_JITTER_X),
            hash_signed(grid.seed, id, salt::WIND_JITTER_Y),
        ) * cfg.wind_jitter_m_s;

        let mut w = base + jitter - pressure_gradient[i] * cfg.pressure_force
            + thermal_gradient[i] * cfg.thermal_force;
        w *= (1.0 - grid.surface(i).roughness() * cfg.roughness_damping).max(0.0);
        soft_clamp(w, cfg.max_wind_m_s)
    })
}

/// Bends `v` toward passable directions: away from steep rises, mildly into valleys.
fn channel(grid: &ClimateGrid, cfg: &ClimateConfig, i: usize, v: Vec2) -> Vec2 {
    let speed = v.length();
    if speed < 1e-4 || grid.slope[i] <= 0.0 {
        return v;
    }
    let dir = v / speed;
    let mut acc = Vec2::ZERO;
    for (k, &j) in grid.neighbors(i).iter().enumerate() {
        let d = grid.frames.directions[i][k];
        let align = dir.dot(d);
        if align <= 0.0 {
            continue;
        }
        // Percent grade toward the neighbor.
        let grade = (grid.height_km[j] - grid.height_km[i]) / grid.frames.distances_km[i][k] * 100.0;
        let passable = if grade > 0.0 {
            1.0 / (1.0 + cfg.uphill_resistance * grade)
        } else {
            1.0 + cfg.valley_bias * (-grade).min(1.0)
        };
        acc += d * (align * passable);
    }
    let target = acc.normalize_or_zero() * speed;
    if target == Vec2::ZERO {
        return v;
    }
    let blend = cfg.channeling * (grid.slope[i] * 100.0).min(1.0);
    v.lerp(target, blend)
}

/// Phase B: relaxes the wind for `cfg.wind_iterations` iterations.
///
/// Each iteration reads the previous field and writes a complete next field,
/// then the buffers swap. Forces: neighbor smoothing, pressure and thermal
/// gradients with Coriolis deflection (none when tidally locked), terrain
/// channeling, drag and hashed turbulence; magnitudes pass through a `tanh`
/// soft clamp at `cfg.max_wind_m_s`.
pub fn relax_wind(
    grid: &ClimateGrid,
    planet: &PlanetConfiguration,
    cfg: &ClimateConfig,
    temperature: &[f32],
    pressure: &[f32],
    initial: Vec<Vec2>,
) -> Vec<Vec2> {
    let pressure_gradient = grid.gradient(pressure);
    let thermal_gradient = grid.gradient(temperature);
    let omega = planet.rotation_rate_rad_s();
    let relax = 1.0 / cfg.wind_iterations.max(1) as f32;

    let mut current = initial;
    let mut next = vec![Vec2::ZERO; grid.len()];

    for iteration in 0..cfg.wind_iterations {
        let turbulence_salt = (iteration as u64 + 1) << 16;
        fill_cells(grid.parallel, &mut next, |i| {
            let w = current[i];

            let (mut sum, mut weight) = (Vec2::ZERO, 0.0);
            for (k, &j) in grid.neighbors(i).iter().enumerate() {
                let wk = 1.0 / grid.frames.distances_km[i][k];
                sum += current[j] * wk;
                weight += wk;
            }
            let mut v = if weight > 0.0 { w.lerp(sum / weight, cfg.wind_smoothing) } else { w };

            // The band flow already carries its Coriolis balance; only the
            // gradient forcing is deflected, to the right in the northern
            // hemisphere for prograde spin.
            let forcing = (thermal_gradient[i] * cfg.thermal_force - pressure_gradient[i] * cfg.pressure_force) * relax;
            let f = 2.0 * omega * grid.latitude[i].sin();
            let deflection = (-f * cfg.coriolis_step_s).clamp(-FRAC_PI_2, FRAC_PI_2);
            v += Vec2::from_angle(deflection).rotate(forcing);
            v = channel(grid, cfg, i, v);

            let roughness = grid.surface(i).roughness() + (grid.slope[i] * 100.0).min(1.0);
            v *= 1.0 - (cfg.drag * roughness).clamp(0.0, 0.9);

            let id = i as u64;
            v += Vec2::new(
                hash_signed(grid.seed, id, salt::TURBULENCE_X + turbulence_salt),
                hash_signed(grid.seed, id, salt::TURBULENCE_Y + turbulence_salt),
            ) * cfg.turbulence_m_s;

            soft_clamp(v, cfg.max_wind_m_s)
        });
        std::mem::swap(&mut current, &mut next);
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::grid::tests::land_grid;
    use crate::terrain::{Cell, SurfaceType};

    #[test]
    fn bands_follow_three_cell_pattern() {
        let cfg = ClimateConfig::default();
        let planet = PlanetConfiguration::earth_like();
        assert!(band_wind(15.0, 0.0, &planet, &cfg).x < 0.0, "trade winds blow westward");
        assert!(band_wind(45.0, 0.0, &planet, &cfg).x > 0.0, "westerlies");
        assert!(band_wind(75.0, 0.0, &planet, &cfg).x < 0.0, "polar easterlies");
        assert!(band_wind(15.0, 0.0, &planet, &cfg).y < 0.0, "northern trades flow toward the equator");
        assert!(band_wind(-15.0, 0.0, &planet, &cfg).y > 0.0);
    }

    #[test]
    fn retrograde_spin_mirrors_zonal_flow() {
        let cfg = ClimateConfig::default();
        let venus = PlanetConfiguration::venus_like();
        assert!(band_wind(15.0, 0.0, &venus, &cfg).x > 0.0);
    }

    fn ocean_world(level: u32) -> Vec<Cell> {
        let mut cells = land_grid(level, 0);
        for c in &mut cells {
            c.surface = SurfaceType::Ocean;
        }
        cells
    }

    #[test]
    fn relaxed_wind_is_bounded_and_deterministic() {
        let cells = ocean_world(3);
        let cfg = ClimateConfig { max_wind_m_s: 20.0, ..ClimateConfig::fast() };
        let planet = PlanetConfiguration::earth_like();
        let temperature = vec![15.0; cells.len()];
        let pressure = vec![1013.0; cells.len()];

        let run = |parallel: bool| {
            let grid = ClimateGrid::new(&cells, planet.radius_km, 0, 50.0, 11, parallel);
            let w0 = initial_wind(&grid, &planet, &cfg, &temperature, &pressure, 0.0);
            relax_wind(&grid, &planet, &cfg, &temperature, &pressure, w0)
        };
        let a = run(true);
        let b = run(false);
        assert_eq!(a, b);
        assert!(a.iter().all(|w| w.is_finite() && w.length() <= 20.0 + 1e-3));
    }

    #[test]
    fn locked_planet_flows_toward_night_side() {
        let cells = ocean_world(3);
        let cfg = ClimateConfig { wind_jitter_m_s: 0.0, ..ClimateConfig::fast() };
        let planet = PlanetConfiguration::tidally_locked_terran();
        let flat = vec![0.0; cells.len()];
        let grid = ClimateGrid::new(&cells, planet.radius_km, 0, 50.0, 1, false);
        let wind = initial_wind(&grid, &planet, &cfg, &flat, &flat, 0.0);
        // A cell on the equator east of the substellar point blows further east.
        let i = cells
            .iter()
            .filter(|c| c.latitude.abs() < 10.0 && (60.0..120.0).contains(&c.longitude))
            .map(|c| c.id)
            .next()
            .unwrap();
        assert!(wind[i].x > 0.0);
    }
}
