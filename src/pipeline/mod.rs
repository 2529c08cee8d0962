//! Pipeline module for orchestrating planet generation stages.
//!
//! Stages run strictly in order against one [`WorldContext`]. The planet's
//! [`StageProfile`] decides which of them are enabled; every enabled stage is
//! applied, validated and timed, and the first failure aborts the run.

mod stage;
mod stages;

pub use stage::{
    GenerationStage, Pipeline, PipelineError, RunReport, StageError, StageId, StageProfile,
    StageRecord, StageState, ValidationError,
};
pub use stages::{
    ClimateStage, ErosionStage, MountainStage, PlateStage, RiverStage, StressStage, SurfaceStage,
    TopologyStage, UpliftStage, VolcanismStage,
};

use crate::terrain::{Cell, GenerationSettings, PlanetConfiguration, WorldContext};

/// Runs the standard pipeline over `cells`, writing every derived field in
/// place.
///
/// The cells are handed back even when a stage fails; they then hold whatever
/// the stages before the failure produced.
pub fn run(
    cells: &mut Vec<Cell>,
    planet: &PlanetConfiguration,
    settings: &GenerationSettings,
    plate_count: usize,
) -> Result<RunReport, PipelineError> {
    let mut ctx = WorldContext::new(std::mem::take(cells), planet.clone(), settings.clone(), plate_count);
    let result = Pipeline::standard().run(&mut ctx);
    *cells = ctx.into_cells();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::icosphere;
    use crate::terrain::SurfaceType;

    fn generate(level: u32, planet: &PlanetConfiguration, settings: &GenerationSettings) -> (Vec<Cell>, RunReport) {
        let mut cells = icosphere(level);
        let report = run(&mut cells, planet, settings, 8).unwrap();
        (cells, report)
    }

    #[test]
    fn test_earth_like_run_completes_every_stage() {
        let (cells, report) = generate(3, &PlanetConfiguration::earth_like(), &GenerationSettings::fast(9));
        assert_eq!(report.profile, StageProfile::Terrestrial);
        assert!(report.stages.iter().all(|r| r.state == StageState::Done));
        assert!(report.sea_level.is_some());
        assert!(report.rivers.is_some());
        assert!(cells.iter().all(|c| c.surface != SurfaceType::Unclassified));
        assert!(cells.iter().any(|c| c.is_water()));
        assert!(cells.iter().any(|c| c.is_land()));
    }

    #[test]
    fn test_parallel_and_sequential_runs_match() {
        let planet = PlanetConfiguration::earth_like();
        let parallel = GenerationSettings { parallel: true, ..GenerationSettings::fast(21) };
        let sequential = GenerationSettings { parallel: false, ..GenerationSettings::fast(21) };
        let (a, ra) = generate(2, &planet, &parallel);
        let (b, rb) = generate(2, &planet, &sequential);
        assert_eq!(a, b);
        assert_eq!(ra.rivers, rb.rivers);
    }

    #[test]
    fn test_same_seed_same_world() {
        let planet = PlanetConfiguration::mars_like();
        let (a, _) = generate(2, &planet, &GenerationSettings::fast(5));
        let (b, _) = generate(2, &planet, &GenerationSettings::fast(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_airless_world_is_dry_and_still() {
        let (cells, report) = generate(2, &PlanetConfiguration::moon_like(), &GenerationSettings::fast(3));
        assert_eq!(report.profile, StageProfile::Airless);
        assert_eq!(report.state(StageId::Erosion), Some(StageState::Skipped));
        assert_eq!(report.state(StageId::Rivers), Some(StageState::Skipped));
        assert_eq!(report.sea_level, None);
        assert!(report.rivers.is_none());
        for c in &cells {
            assert_eq!(c.wind, glam::Vec2::ZERO);
            assert_eq!(c.precipitation, 0.0);
            assert!(!c.river.is_river);
            assert!(!c.is_water());
        }
    }

    #[test]
    fn test_flat_dry_world_has_no_rivers() {
        let planet = PlanetConfiguration {
            water_coverage: crate::terrain::WaterCoverage::None,
            ..PlanetConfiguration::earth_like()
        };
        let (cells, report) = generate(2, &planet, &GenerationSettings::fast(4));
        assert_eq!(report.sea_level, None);
        let rivers = report.rivers.unwrap();
        assert_eq!(rivers.sources, 0);
        assert!(cells.iter().all(|c| !c.river.is_river));
    }

    #[test]
    fn test_dry_world_with_atmosphere_completes_every_stage() {
        let planet = PlanetConfiguration::mars_like();
        for seed in 1..=4 {
            let (cells, report) = generate(3, &planet, &GenerationSettings::fast(seed));
            assert_eq!(report.profile, StageProfile::Terrestrial);
            assert!(
                report.stages.iter().all(|r| r.state == StageState::Done),
                "seed {}: {:?}",
                seed,
                report.stages
            );
            assert_eq!(report.sea_level, None);
            for c in cells.iter().filter(|c| c.surface.is_relief()) {
                assert_eq!(
                    c.surface,
                    crate::terrain::classify_relief(c.elevation, report.relief_base, &GenerationSettings::fast(seed).relief)
                );
            }
        }
    }

    #[test]
    fn test_failure_names_the_stage_and_returns_cells() {
        let mut cells = icosphere(1);
        cells.truncate(5);
        let err = run(&mut cells, &PlanetConfiguration::earth_like(), &GenerationSettings::fast(1), 4).unwrap_err();
        assert_eq!(err.stage(), StageId::Topology);
        assert!(matches!(err, PipelineError::StageFailed { source: StageError::Topology(_), .. }));
        assert_eq!(cells.len(), 5);
    }

    #[test]
    fn test_zero_plates_is_rejected() {
        let mut cells = icosphere(1);
        let err = run(&mut cells, &PlanetConfiguration::earth_like(), &GenerationSettings::fast(1), 0).unwrap_err();
        assert_eq!(err.stage(), StageId::Plates);
    }
}
