//! Phase C: multi-day moisture budget.
//!
//! Tracks integrated water vapor (mm) per cell plus a soil reservoir on land.
//! Every sub-step reads the previous state and produces fresh buffers:
//!
//! 1. evaporation bounded by saturation deficit and soil store
//! 2. conservative vapor advection along the wind
//! 3. condensation (stratiform, super-saturation, convective, orographic),
//!    infiltration and runoff
//! 4. conservative soil diffusion between land neighbors
//! 5. ocean humidity relaxation
//! 6. saturation cap with rain-out, then conservative vapor mixing
//!
//! Spin-up days are discarded; totals are summed over the final day only.

use glam::Vec2;

use super::grid::ClimateGrid;
use super::temperature::{diurnal_amplitude, diurnal_offset};
use super::util::{saturation_column_mm, saturation_vapor_pressure_hpa};
use super::ClimateConfig;
use crate::exec::{fill_cells, map_cells};
use crate::terrain::{PlanetConfiguration, SurfaceType};

/// Per-cell results of one moisture cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoistureFields {
    /// Vapor column at the end of the sampled day (mm).
    pub vapor: Vec<f32>,
    /// Soil moisture, percent of capacity.
    pub soil_moisture: Vec<f32>,
    /// Totals over the sampled day (mm/day).
    pub precipitation: Vec<f32>,
    pub evaporation: Vec<f32>,
    pub runoff: Vec<f32>,
    /// Mean, min and max of the per-step diurnal temperatures.
    pub temperature: Vec<f32>,
    pub temperature_min: Vec<f32>,
    pub temperature_max: Vec<f32>,
}

impl MoistureFields {
    /// All-zero fields, with the temperatures set from `temperature`.
    pub fn dry(temperature: &[f32]) -> Self {
        let n = temperature.len();
        Self {
            vapor: vec![0.0; n],
            soil_moisture: vec![0.0; n],
            precipitation: vec![0.0; n],
            evaporation: vec![0.0; n],
            runoff: vec![0.0; n],
            temperature: temperature.to_vec(),
            temperature_min: temperature.to_vec(),
            temperature_max: temperature.to_vec(),
        }
    }
}

/// Outflow fraction and per-neighbor shares of vapor transport for a fixed wind.
///
/// `shares[i][k]` is the part of cell `i`'s outflow sent to its `k`-th
/// neighbor; the shares of a moving cell sum to one. Only neighbors that list
/// `i` back receive a share, so a gather over the reverse slots collects
/// every unit that leaves.
#[derive(Debug, Clone)]
pub struct AdvectionPlan {
    pub outflow: Vec<f32>,
    pub shares: Vec<Vec<f32>>,
}

impl AdvectionPlan {
    pub fn new(grid: &ClimateGrid, wind: &[Vec2], step_seconds: f32, cfg: &ClimateConfig) -> Self {
        let spacing_m = grid.frames.mean_spacing_km.max(1e-3) * 1000.0;
        let per_cell: Vec<(f32, Vec<f32>)> = map_cells(grid.parallel, grid.len(), |i| {
            let n = grid.neighbors(i).len();
            let speed = wind[i].length();
            if speed < 1e-4 {
                return (0.0, vec![0.0; n]);
            }
            let dir = wind[i] / speed;
            let mut shares: Vec<f32> = grid
                .neighbors(i)
                .iter()
                .enumerate()
                .map(|(k, &j)| {
                    if grid.frames.reverse_slot[i][k].is_none() {
                        return 0.0;
                    }
                    let align = dir.dot(grid.frames.directions[i][k]);
                    if align <= 0.0 {
                        return 0.0;
                    }
                    let rise = (grid.height_km[j] - grid.height_km[i]).max(0.0);
                    align / (1.0 + cfg.uphill_penalty * rise)
                })
                .collect();
            let total: f32 = shares.iter().sum();
            if total <= 1e-6 {
                return (0.0, vec![0.0; n]);
            }
            shares.iter_mut().for_each(|s| *s /= total);
            let outflow = (speed * step_seconds / spacing_m).clamp(0.0, cfg.max_outflow.clamp(0.0, 1.0));
            (outflow, shares)
        });
        let (outflow, shares) = per_cell.into_iter().unzip();
        Self { outflow, shares }
    }
}

/// Moves vapor one step along the plan, writing the result into `out`.
///
/// Each cell keeps `1 - outflow` of its column and gathers the shares its
/// upwind neighbors sent toward it. Total mass is unchanged.
pub fn advect_vapor(grid: &ClimateGrid, plan: &AdvectionPlan, vapor: &[f32], out: &mut [f32]) {
    fill_cells(grid.parallel, out, |i| {
        let mut v = vapor[i] * (1.0 - plan.outflow[i]);
        for (k, &j) in grid.neighbors(i).iter().enumerate() {
            if let Some(r) = grid.frames.reverse_slot[i][k] {
                v += vapor[j] * plan.outflow[j] * plan.shares[j][r];
            }
        }
        v
    });
}

/// Runs the moisture cycle for one season and returns the sampled-day fields.
pub fn run_moisture_cycle(
    grid: &ClimateGrid,
    planet: &PlanetConfiguration,
    cfg: &ClimateConfig,
    wind: &[Vec2],
    temperature: &[f32],
) -> MoistureFields {
    let cycle = MoistureCycle::new(grid, planet, cfg, wind);
    cycle.run(temperature)
}

struct MoistureCycle<'g, 'a> {
    grid: &'g ClimateGrid<'a>,
    cfg: &'g ClimateConfig,
    density: f32,
    plan: AdvectionPlan,
    speed: Vec<f32>,
    /// Upslope wind component (m/s × slope); negative on lee slopes.
    lift: Vec<f32>,
    amplitude: Vec<f32>,
    step_days: f32,
    capacity: f32,
}

/// One sub-step's contribution to the sampled totals.
#[derive(Debug, Clone, Copy, Default)]
struct Flux {
    precipitation: f32,
    evaporation: f32,
    runoff: f32,
}

impl<'g, 'a> MoistureCycle<'g, 'a> {
    fn new(grid: &'g ClimateGrid<'a>, planet: &PlanetConfiguration, cfg: &'g ClimateConfig, wind: &[Vec2]) -> Self {
        let step_days = cfg.step_days();
        Self {
            grid,
            cfg,
            density: planet.atmosphere_density,
            plan: AdvectionPlan::new(grid, wind, step_days * 86_400.0, cfg),
            speed: wind.iter().map(|w| w.length()).collect(),
            lift: wind.iter().zip(&grid.height_gradient).map(|(w, g)| w.dot(*g)).collect(),
            amplitude: (0..grid.len())
                .map(|i| diurnal_amplitude(grid.cells[i].is_water(), planet, cfg))
                .collect(),
            step_days,
            capacity: cfg.soil_capacity_mm.max(1.0),
        }
    }

    fn is_land(&self, i: usize) -> bool {
        self.grid.surface(i).is_land()
    }

    fn run(&self, temperature: &[f32]) -> MoistureFields {
        let n = self.grid.len();
        let parallel = self.grid.parallel;
        let cfg = self.cfg;
        let steps = cfg.steps_per_day.max(1);
        let days = cfg.spinup_days + 1;

        let mut vapor = map_cells(parallel, n, |i| {
            cfg.initial_humidity * saturation_column_mm(temperature[i], self.density)
        });
        let mut soil = map_cells(parallel, n, |i| {
            if self.is_land(i) {
                cfg.initial_soil.clamp(0.0, 1.0) * self.capacity
            } else {
                0.0
            }
        });
        let mut scratch = vec![0.0f32; n];

        let mut out = MoistureFields::dry(temperature);
        out.temperature.iter_mut().for_each(|t| *t = 0.0);
        out.temperature_min.iter_mut().for_each(|t| *t = f32::INFINITY);
        out.temperature_max.iter_mut().for_each(|t| *t = f32::NEG_INFINITY);

        for day in 0..days {
            let sampled = day + 1 == days;
            for step in 0..steps {
                let phase = step as f32 / steps as f32;
                let t_step = map_cells(parallel, n, |i| {
                    temperature[i] + diurnal_offset(self.amplitude[i], phase, self.grid.longitude[i])
                });
                let saturation = map_cells(parallel, n, |i| saturation_column_mm(t_step[i], self.density));

                // 1. evaporation
                let evaporated = map_cells(parallel, n, |i| {
                    self.evaporation(i, t_step[i], saturation[i], vapor[i], soil[i])
                });
                for i in 0..n {
                    vapor[i] += evaporated[i];
                    if self.is_land(i) {
                        soil[i] -= evaporated[i];
                    }
                }

                // 2. advection
                advect_vapor(self.grid, &self.plan, &vapor, &mut scratch);
                std::mem::swap(&mut vapor, &mut scratch);

                // 3. condensation, infiltration, runoff
                let rain = map_cells(parallel, n, |i| {
                    let p = self.precipitation(i, t_step[i], saturation[i], vapor[i]);
                    (p, self.infiltration(i, p, soil[i]))
                });

                // 4. soil diffusion on the post-rain reservoir
                for i in 0..n {
                    vapor[i] -= rain[i].0;
                    soil[i] += rain[i].1;
                }
                self.diffuse_soil(&soil, &mut scratch);
                std::mem::swap(&mut soil, &mut scratch);

                // 5. ocean humidity relaxation
                let relaxed = map_cells(parallel, n, |i| self.ocean_relaxation(i, saturation[i], vapor[i]));

                // 6. saturation cap and mixing
                let rained_out = map_cells(parallel, n, |i| {
                    (vapor[i] + relaxed[i] - saturation[i]).max(0.0)
                });
                for i in 0..n {
                    vapor[i] += relaxed[i] - rained_out[i];
                }
                self.mix_vapor(&vapor, &mut scratch);
                std::mem::swap(&mut vapor, &mut scratch);

                if sampled {
                    for i in 0..n {
                        let land = self.is_land(i);
                        let flux = Flux {
                            precipitation: rain[i].0 + rained_out[i],
                            evaporation: evaporated[i] + relaxed[i],
                            runoff: if land { rain[i].0 - rain[i].1 + rained_out[i] } else { 0.0 },
                        };
                        out.precipitation[i] += flux.precipitation;
                        out.evaporation[i] += flux.evaporation;
                        out.runoff[i] += flux.runoff;
                        out.temperature[i] += t_step[i] / steps as f32;
                        out.temperature_min[i] = out.temperature_min[i].min(t_step[i]);
                        out.temperature_max[i] = out.temperature_max[i].max(t_step[i]);
                    }
                }
            }
        }

        out.vapor = vapor;
        out.soil_moisture = soil.iter().map(|s| (s / self.capacity * 100.0).clamp(0.0, 100.0)).collect();
        out
    }

    fn evaporation(&self, i: usize, t: f32, saturation: f32, vapor: f32, soil: f32) -> f32 {
        let deficit = (saturation - vapor).max(0.0);
        if deficit <= 0.0 {
            return 0.0;
        }
        let cfg = self.cfg;
        let surface = self.grid.surface(i);
        let base = match surface {
            SurfaceType::Ocean => cfg.ocean_evaporation_mm_day,
            SurfaceType::Ice => cfg.ocean_evaporation_mm_day * cfg.ice_sublimation,
            SurfaceType::Swamp => cfg.land_evaporation_mm_day * 1.5 * soil / self.capacity,
            s if s.is_land() => cfg.land_evaporation_mm_day * soil / self.capacity,
            _ => 0.0,
        };
        let temp_factor =
            (saturation_vapor_pressure_hpa(t) / saturation_vapor_pressure_hpa(25.0)).clamp(0.02, 2.0);
        let wind_factor = 1.0 + cfg.wind_evaporation * self.speed[i];
        let mut e = (base * temp_factor * wind_factor * self.step_days).min(deficit);
        if surface.is_land() {
            e = e.min(soil);
        }
        e.max(0.0)
    }

    fn precipitation(&self, i: usize, t: f32, saturation: f32, vapor: f32) -> f32 {
        if vapor <= 0.0 {
            return 0.0;
        }
        let cfg = self.cfg;
        let dt = self.step_days;
        let humidity = vapor / saturation.max(1e-3);

        let stratiform = vapor * cfg.stratiform_rate * dt * ((humidity - 0.8) / 0.2).clamp(0.0, 1.0);
        let supersaturated = (vapor - saturation).max(0.0) * cfg.condensation_rate;
        let convective = if t > cfg.convective_threshold_c && humidity > 0.6 {
            vapor * cfg.convective_rate * dt * ((t - cfg.convective_threshold_c) / 10.0).min(1.0) * humidity.min(1.0)
        } else {
            0.0
        };
        let lift = self.lift[i];
        let orographic = vapor * cfg.orographic_rate * lift.max(0.0) * dt;
        let shadow = 1.0 / (1.0 + cfg.rain_shadow * (-lift).max(0.0));

        let cap = if self.is_land(i) { cfg.land_rain_cap } else { cfg.water_rain_cap };
        ((stratiform + supersaturated + convective + orographic) * shadow)
            .min(vapor * cap.clamp(0.0, 1.0))
            .max(0.0)
    }

    /// Part of `rain` that soaks into the soil; the rest runs off.
    fn infiltration(&self, i: usize, rain: f32, soil: f32) -> f32 {
        if !self.is_land(i) || rain <= 0.0 {
            return 0.0;
        }
        let cfg = self.cfg;
        let fraction = (cfg.infiltration_base + cfg.infiltration_soil * soil / self.capacity
            - cfg.infiltration_slope * self.grid.slope[i])
            .clamp(0.05, 0.95);
        (rain * fraction).min((self.capacity - soil).max(0.0))
    }

    /// Diffusion resistance: wetlands and river channels hold their water.
    fn soil_conductance(&self, i: usize) -> f32 {
        let cell = &self.grid.cells[i];
        if cell.surface == SurfaceType::Swamp || cell.river.is_river {
            self.cfg.wetland_diffusion
        } else {
            1.0
        }
    }

    fn diffuse_soil(&self, soil: &[f32], out: &mut [f32]) {
        let grid = self.grid;
        fill_cells(grid.parallel, out, |i| {
            if !self.is_land(i) {
                return soil[i];
            }
            let ci = self.soil_conductance(i);
            let delta: f32 = grid
                .neighbors(i)
                .iter()
                .filter(|&&j| self.is_land(j))
                .map(|&j| {
                    let c = ci.min(self.soil_conductance(j));
                    self.cfg.soil_diffusion * c * grid.pair_weight(i, j) * (soil[j] - soil[i])
                })
                .sum();
            soil[i] + delta
        });
    }

    fn ocean_relaxation(&self, i: usize, saturation: f32, vapor: f32) -> f32 {
        if self.grid.surface(i) != SurfaceType::Ocean {
            return 0.0;
        }
        let target = self.cfg.ocean_target_humidity * saturation;
        (self.cfg.ocean_relaxation * (target - vapor)).max(0.0)
    }

    fn mix_vapor(&self, vapor: &[f32], out: &mut [f32]) {
        let grid = self.grid;
        let mixing = self.cfg.vapor_mixing;
        fill_cells(grid.parallel, out, |i| {
            let delta: f32 = grid
                .neighbors(i)
                .iter()
                .map(|&j| grid.pair_weight(i, j) * (vapor[j] - vapor[i]))
                .sum();
            vapor[i] + mixing * delta
        });
    }
}
