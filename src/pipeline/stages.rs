//! Concrete stages of the standard pipeline.

use tracing::debug;

use super::stage::{GenerationStage, StageError, StageId, ValidationError};
use crate::climate::simulate_climate;
use crate::erosion::erode;
use crate::geometry::{build_topology, required_degree, CellFrames};
use crate::rivers::build_river_network;
use crate::tectonics::{apply_uplift, apply_volcanism, assign_plates, compute_stress, place_mountains};
use crate::terrain::{
    classify_base_surface, classify_relief, sea_level_for_fraction, SurfaceType, WorldContext,
};

/// Builds the exact-degree neighbor graph.
pub struct TopologyStage;

impl GenerationStage for TopologyStage {
    fn id(&self) -> StageId {
        StageId::Topology
    }

    fn name(&self) -> &str {
        "topology"
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let parallel = ctx.parallel();
        build_topology(&mut ctx.cells, parallel)?;
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        for cell in &ctx.cells {
            if cell.degree() != required_degree(cell.id) {
                return Err(ValidationError::cell(cell.id, format!("degree {}", cell.degree())));
            }
            if let Some(&j) = cell.neighbors.iter().find(|&&j| !ctx.cells[j].neighbors.contains(&cell.id)) {
                return Err(ValidationError::cell(cell.id, format!("link to {} is one-way", j)));
            }
        }
        Ok(())
    }
}

/// Flood-fills plates from seeded cells.
pub struct PlateStage;

impl GenerationStage for PlateStage {
    fn id(&self) -> StageId {
        StageId::Plates
    }

    fn name(&self) -> &str {
        "plates"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Topology]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        if ctx.plate_count == 0 {
            return Err(StageError::Failed("plate count must be at least 1".into()));
        }
        let seed = ctx.seed();
        ctx.plates = assign_plates(&mut ctx.cells, ctx.plate_count, seed, &ctx.settings.tectonics);
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        match ctx.cells.iter().find(|c| c.plate_id.map_or(true, |p| p >= ctx.plates.len())) {
            Some(cell) => Err(ValidationError::cell(cell.id, "no valid plate")),
            None => Ok(()),
        }
    }
}

/// Stress and boundary types from relative plate drift.
pub struct StressStage;

impl GenerationStage for StressStage {
    fn id(&self) -> StageId {
        StageId::Stress
    }

    fn name(&self) -> &str {
        "stress"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Plates]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let parallel = ctx.parallel();
        let frames = CellFrames::new(&ctx.cells, ctx.planet.radius_km, parallel);
        let boundary = compute_stress(&mut ctx.cells, &ctx.plates, &frames, &ctx.settings.tectonics, parallel);
        debug!(boundary, "boundary cells");
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        match ctx.cells.iter().find(|c| !(c.stress.is_finite() && c.stress >= 0.0)) {
            Some(cell) => Err(ValidationError::cell(cell.id, format!("stress {}", cell.stress))),
            None => Ok(()),
        }
    }
}

/// Base crust elevation plus stress uplift.
pub struct UpliftStage;

impl GenerationStage for UpliftStage {
    fn id(&self) -> StageId {
        StageId::Uplift
    }

    fn name(&self) -> &str {
        "uplift"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Stress]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let (gravity, seed, parallel) = (ctx.planet.gravity, ctx.seed(), ctx.parallel());
        apply_uplift(&mut ctx.cells, &ctx.settings.tectonics, gravity, seed, parallel);
        Ok(())
    }
}

pub struct MountainStage;

impl GenerationStage for MountainStage {
    fn id(&self) -> StageId {
        StageId::Mountains
    }

    fn name(&self) -> &str {
        "mountains"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Uplift]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let gravity = ctx.planet.gravity;
        let raised = place_mountains(&mut ctx.cells, &ctx.settings.tectonics, gravity);
        debug!(raised, "mountain and hill cells");
        Ok(())
    }
}

pub struct VolcanismStage;

impl GenerationStage for VolcanismStage {
    fn id(&self) -> StageId {
        StageId::Volcanism
    }

    fn name(&self) -> &str {
        "volcanism"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Uplift]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let (gravity, seed) = (ctx.planet.gravity, ctx.seed());
        let volcanic = apply_volcanism(&mut ctx.cells, &ctx.settings.tectonics, gravity, seed);
        debug!(volcanic, "volcanic cells");
        Ok(())
    }
}

/// Sea level from the target ocean fraction, then base surface types.
pub struct SurfaceStage;

impl GenerationStage for SurfaceStage {
    fn id(&self) -> StageId {
        StageId::Surface
    }

    fn name(&self) -> &str {
        "surface"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Uplift]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let fraction = ctx
            .settings
            .ocean_coverage
            .unwrap_or_else(|| ctx.planet.water_coverage.ocean_fraction());
        let sea_level = sea_level_for_fraction(&ctx.cells, fraction);
        ctx.set_sea_level(sea_level);
        let base = ctx.relief_base;
        let summary = classify_base_surface(
            &mut ctx.cells,
            &ctx.planet,
            ctx.sea_level,
            base,
            &ctx.settings.relief,
        );
        debug!(
            sea_level = ?ctx.sea_level,
            relief_base = base,
            ocean = summary.ocean,
            ice = summary.ice,
            lava = summary.lava,
            land = summary.land,
            "base surface"
        );
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        match ctx.cells.iter().find(|c| c.surface == SurfaceType::Unclassified) {
            Some(cell) => Err(ValidationError::cell(cell.id, "surface left unclassified")),
            None => Ok(()),
        }
    }
}

/// Wind, temperature, pressure and moisture.
pub struct ClimateStage;

impl GenerationStage for ClimateStage {
    fn id(&self) -> StageId {
        StageId::Climate
    }

    fn name(&self) -> &str {
        "climate"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Surface]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let summary = simulate_climate(&mut ctx.cells, &ctx.planet, &ctx.settings, ctx.relief_base);
        debug!(
            seasons = summary.seasons,
            airless = summary.airless,
            mean_temperature_c = summary.mean_temperature_c,
            mean_precipitation_mm_day = summary.mean_precipitation_mm_day,
            max_wind_m_s = summary.max_wind_m_s,
            "climate"
        );
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        let airless = ctx.planet.is_airless();
        for c in &ctx.cells {
            let finite = [c.temperature, c.temperature_min, c.temperature_max, c.pressure, c.precipitation]
                .iter()
                .all(|v| v.is_finite())
                && c.wind.is_finite();
            if !finite {
                return Err(ValidationError::cell(c.id, "non-finite climate field"));
            }
            if !(0.0..=100.0).contains(&c.soil_moisture) {
                return Err(ValidationError::cell(c.id, format!("soil moisture {}", c.soil_moisture)));
            }
            if c.precipitation < 0.0 || c.evaporation < 0.0 {
                return Err(ValidationError::cell(c.id, "negative water flux"));
            }
            if airless && (c.wind != glam::Vec2::ZERO || c.precipitation != 0.0) {
                return Err(ValidationError::cell(c.id, "weather on an airless planet"));
            }
        }
        Ok(())
    }
}

pub struct ErosionStage;

impl GenerationStage for ErosionStage {
    fn id(&self) -> StageId {
        StageId::Erosion
    }

    fn name(&self) -> &str {
        "erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Climate]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let (base, gravity, parallel) = (ctx.relief_base, ctx.planet.gravity, ctx.parallel());
        erode(&mut ctx.cells, &ctx.settings.erosion, gravity, base, &ctx.settings.relief, parallel);
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        let base = ctx.relief_base;
        let stale = ctx
            .cells
            .iter()
            .filter(|c| c.surface.is_relief())
            .find(|c| classify_relief(c.elevation, base, &ctx.settings.relief) != c.surface);
        match stale {
            Some(cell) => Err(ValidationError::cell(cell.id, "relief class does not match elevation")),
            None => Ok(()),
        }
    }
}

pub struct RiverStage;

impl GenerationStage for RiverStage {
    fn id(&self) -> StageId {
        StageId::Rivers
    }

    fn name(&self) -> &str {
        "rivers"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Surface, StageId::Climate]
    }

    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
        let (base, area, seed) = (ctx.relief_base, ctx.cell_area_km2(), ctx.seed());
        let report = build_river_network(&mut ctx.cells, base, area, seed, &ctx.settings.rivers);
        ctx.river_report = Some(report);
        Ok(())
    }

    fn validate(&self, ctx: &WorldContext) -> Result<(), ValidationError> {
        let n = ctx.cells.len();
        for start in ctx.cells.iter().filter(|c| c.river.is_river) {
            if !(start.river.discharge.is_finite() && start.river.discharge >= 0.0) {
                return Err(ValidationError::cell(start.id, "invalid discharge"));
            }
            let mut current = start.id;
            let mut steps = 0;
            while ctx.cells[current].river.is_river {
                let Some(next) = ctx.cells[current].river.downstream else {
                    return Err(ValidationError::cell(current, "river cell without outlet"));
                };
                current = next;
                steps += 1;
                if steps > n {
                    return Err(ValidationError::cell(start.id, "river channel forms a cycle"));
                }
            }
        }
        Ok(())
    }
}
