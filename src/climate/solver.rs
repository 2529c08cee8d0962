//! Climate driver: runs the three phases per season and writes the cells.

use glam::Vec2;
use tracing::debug;

use super::grid::ClimateGrid;
use super::moisture::{run_moisture_cycle, MoistureFields};
use super::pressure::surface_pressure;
use super::temperature::{advect_temperature, diurnal_amplitude, equilibrium_temperature};
use super::util::season_phase_sin;
use super::wind::{initial_wind, relax_wind};
use super::ClimateConfig;
use crate::exec::map_cells;
use crate::terrain::{Cell, GenerationSettings, PlanetConfiguration};

/// Global aggregates of a climate run, for logging and reports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClimateSummary {
    pub seasons: u32,
    pub airless: bool,
    pub mean_temperature_c: f32,
    pub mean_precipitation_mm_day: f32,
    pub max_wind_m_s: f32,
}

/// Fields of one seasonal sample.
struct Season {
    wind: Vec<Vec2>,
    pressure: Vec<f32>,
    moisture: MoistureFields,
}

fn solve_season(grid: &ClimateGrid, planet: &PlanetConfiguration, cfg: &ClimateConfig, season_sin: f32) -> Season {
    let equilibrium = map_cells(grid.parallel, grid.len(), |i| {
        equilibrium_temperature(
            grid.latitude[i],
            grid.longitude[i],
            grid.height_km[i],
            grid.cells[i].is_water(),
            season_sin,
            planet,
            cfg,
        )
    });
    let reference = equilibrium.iter().sum::<f32>() / equilibrium.len().max(1) as f32;
    let pressure_for = |temperature: &[f32]| {
        map_cells(grid.parallel, grid.len(), |i| {
            surface_pressure(planet, cfg, grid.height_km[i], temperature[i], reference)
        })
    };

    if planet.is_airless() {
        // Radiative temperatures only: no wind, no moisture.
        let mut moisture = MoistureFields::dry(&equilibrium);
        for i in 0..grid.len() {
            let amplitude = diurnal_amplitude(grid.cells[i].is_water(), planet, cfg);
            moisture.temperature_min[i] -= amplitude;
            moisture.temperature_max[i] += amplitude;
        }
        return Season {
            wind: vec![Vec2::ZERO; grid.len()],
            pressure: pressure_for(&equilibrium),
            moisture,
        };
    }

    let pressure = pressure_for(&equilibrium);
    let wind = initial_wind(grid, planet, cfg, &equilibrium, &pressure, season_sin);
    let wind = relax_wind(grid, planet, cfg, &equilibrium, &pressure, wind);
    let temperature = advect_temperature(grid, cfg, &wind, &equilibrium, season_sin);
    let moisture = run_moisture_cycle(grid, planet, cfg, &wind, &temperature);
    let pressure = pressure_for(&moisture.temperature);

    Season { wind, pressure, moisture }
}

/// Runs the climate solver over `ClimateConfig::seasons` orbital phases.
///
/// Instantaneous fields (wind, temperature, pressure, moisture, daily totals)
/// come from the first phase; the seasonal precipitation, evaporation and
/// runoff are means over all phases. Airless planets get radiative
/// temperatures and pressure only.
pub fn simulate_climate(
    cells: &mut [Cell],
    planet: &PlanetConfiguration,
    settings: &GenerationSettings,
    sea_level: u8,
) -> ClimateSummary {
    let cfg = &settings.climate;
    let seasons = cfg.seasons.max(1);
    let n = cells.len();

    let (first, seasonal) = {
        let grid = ClimateGrid::new(
            cells,
            planet.radius_km,
            sea_level,
            settings.elevation_step_m,
            settings.seed,
            settings.parallel,
        );
        let mut first: Option<Season> = None;
        let mut seasonal = vec![[0.0f32; 3]; n];
        for s in 0..seasons {
            let season_sin = season_phase_sin(s, seasons, cfg.season_phase);
            let season = solve_season(&grid, planet, cfg, season_sin);
            let m = &season.moisture;
            for (i, acc) in seasonal.iter_mut().enumerate() {
                acc[0] += m.precipitation[i] / seasons as f32;
                acc[1] += m.evaporation[i] / seasons as f32;
                acc[2] += m.runoff[i] / seasons as f32;
            }
            debug!(season = s, season_sin, "climate season solved");
            if first.is_none() {
                first = Some(season);
            }
        }
        (first, seasonal)
    };

    let Some(first) = first else {
        return ClimateSummary::default();
    };
    let m = &first.moisture;
    for (i, cell) in cells.iter_mut().enumerate() {
        cell.wind = first.wind[i];
        cell.pressure = first.pressure[i];
        cell.temperature = m.temperature[i];
        cell.temperature_min = m.temperature_min[i];
        cell.temperature_max = m.temperature_max[i];
        cell.atmospheric_moisture = m.vapor[i];
        cell.soil_moisture = m.soil_moisture[i];
        cell.precipitation = m.precipitation[i];
        cell.evaporation = m.evaporation[i];
        cell.runoff = m.runoff[i];
        cell.seasonal_precipitation = seasonal[i][0];
        cell.seasonal_evaporation = seasonal[i][1];
        cell.seasonal_runoff = seasonal[i][2];
    }

    let count = n.max(1) as f32;
    ClimateSummary {
        seasons,
        airless: planet.is_airless(),
        mean_temperature_c: cells.iter().map(|c| c.temperature).sum::<f32>() / count,
        mean_precipitation_mm_day: cells.iter().map(|c| c.precipitation).sum::<f32>() / count,
        max_wind_m_s: cells.iter().map(|c| c.wind.length()).fold(0.0, f32::max),
    }
}
