//! Generation stage trait and pipeline orchestration.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::stages::{
    ClimateStage, ErosionStage, MountainStage, PlateStage, RiverStage, StressStage, SurfaceStage,
    TopologyStage, UpliftStage, VolcanismStage,
};
use crate::geometry::TopologyError;
use crate::rivers::RiverReport;
use crate::terrain::{PlanetConfiguration, WorldContext};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    /// Neighbor graph construction.
    Topology,
    /// Plate flood fill.
    Plates,
    /// Boundary stress from relative plate drift.
    Stress,
    /// Base elevation plus stress uplift.
    Uplift,
    /// Mountain and hill building at boundaries.
    Mountains,
    Volcanism,
    /// Sea level and base surface types.
    Surface,
    /// Wind, temperature and moisture.
    Climate,
    Erosion,
    Rivers,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Topology => "topology",
            StageId::Plates => "plates",
            StageId::Stress => "stress",
            StageId::Uplift => "uplift",
            StageId::Mountains => "mountains",
            StageId::Volcanism => "volcanism",
            StageId::Surface => "surface",
            StageId::Climate => "climate",
            StageId::Erosion => "erosion",
            StageId::Rivers => "rivers",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Planet class that decides which stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageProfile {
    /// Everything.
    Terrestrial,
    /// No erosion and no rivers.
    Airless,
    /// No rivers.
    Lava,
    /// No rivers.
    IceVolatile,
}

impl StageProfile {
    /// Picks the profile matching the planet's atmosphere and temperatures.
    pub fn for_planet(planet: &PlanetConfiguration) -> Self {
        if planet.is_airless() {
            StageProfile::Airless
        } else if planet.is_molten() {
            StageProfile::Lava
        } else if planet.is_frozen() {
            StageProfile::IceVolatile
        } else {
            StageProfile::Terrestrial
        }
    }

    /// Returns true if the stage runs under this profile.
    pub fn enables(&self, stage: StageId) -> bool {
        match self {
            StageProfile::Terrestrial => true,
            StageProfile::Airless => !matches!(stage, StageId::Erosion | StageId::Rivers),
            StageProfile::Lava | StageProfile::IceVolatile => stage != StageId::Rivers,
        }
    }
}

/// Lifecycle of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageState {
    Pending,
    Running,
    /// Applied and passed its post-stage checks.
    Validated,
    Done,
    /// Disabled by the profile; never touched the context.
    Skipped,
    Failed,
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: StageId,
    pub name: String,
    pub state: StageState,
    pub elapsed_ms: f64,
}

/// What a finished run reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub profile: StageProfile,
    pub stages: Vec<StageRecord>,
    pub sea_level: Option<u8>,
    pub relief_base: u8,
    pub rivers: Option<RiverReport>,
}

impl RunReport {
    /// State of the given stage, if the pipeline contains it.
    pub fn state(&self, id: StageId) -> Option<StageState> {
        self.stages.iter().find(|r| r.id == id).map(|r| r.state)
    }

    pub fn total_ms(&self) -> f64 {
        self.stages.iter().map(|r| r.elapsed_ms).sum()
    }
}

/// A post-stage invariant that does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("cell {cell}: {message}")]
    Cell { cell: usize, message: String },
    #[error("{0}")]
    World(String),
}

impl ValidationError {
    pub fn cell(cell: usize, message: impl Into<String>) -> Self {
        ValidationError::Cell { cell, message: message.into() }
    }
}

/// Failure raised inside a stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Failed(String),
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: StageId,
        #[source]
        source: StageError,
    },
    #[error("stage '{stage}' requires '{dependency}', which has not completed")]
    MissingDependency { stage: StageId, dependency: StageId },
}

impl PipelineError {
    /// Stage the error is attributed to.
    pub fn stage(&self) -> StageId {
        match self {
            PipelineError::StageFailed { stage, .. } | PipelineError::MissingDependency { stage, .. } => *stage,
        }
    }
}

/// Trait for implementing generation stages.
///
/// Each stage transforms the world context in some way, building upon
/// previous stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must have completed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage, modifying the context in place.
    fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError>;

    /// Post-stage invariant check. The default accepts everything.
    fn validate(&self, _ctx: &WorldContext) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Orchestrates generation stages into a strictly sequential run.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    profile: Option<StageProfile>,
}

impl Pipeline {
    /// Creates an empty pipeline. Without an explicit profile the planet
    /// decides which stages run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stage in dependency order.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline
            .add_stage(TopologyStage)
            .add_stage(PlateStage)
            .add_stage(StressStage)
            .add_stage(UpliftStage)
            .add_stage(MountainStage)
            .add_stage(VolcanismStage)
            .add_stage(SurfaceStage)
            .add_stage(ClimateStage)
            .add_stage(ErosionStage)
            .add_stage(RiverStage);
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Forces a profile instead of deriving it from the planet.
    pub fn with_profile(mut self, profile: StageProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all enabled stages in order.
    pub fn run(&self, ctx: &mut WorldContext) -> Result<RunReport, PipelineError> {
        self.run_with_callbacks(ctx, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all enabled stages, calling `on_stage_start(name, index,
    /// total)` before and `on_stage_complete(name, index, elapsed_ms)` after
    /// each one. Skipped stages trigger neither.
    pub fn run_with_callbacks<F1, F2>(
        &self,
        ctx: &mut WorldContext,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<RunReport, PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, f64),
    {
        let profile = self.profile.unwrap_or_else(|| StageProfile::for_planet(&ctx.planet));
        let total = self.stages.len();
        let mut records: Vec<StageRecord> = self
            .stages
            .iter()
            .map(|s| StageRecord {
                id: s.id(),
                name: s.name().to_string(),
                state: StageState::Pending,
                elapsed_ms: 0.0,
            })
            .collect();
        let mut completed: Vec<StageId> = Vec::new();

        info!(profile = ?profile, stages = total, cells = ctx.len(), "pipeline started");

        for (i, stage) in self.stages.iter().enumerate() {
            let id = stage.id();
            if !profile.enables(id) {
                records[i].state = StageState::Skipped;
                info!(stage = stage.name(), "stage skipped by profile");
                continue;
            }

            if let Some(&dependency) = stage.dependencies().iter().find(|d| !completed.contains(d)) {
                records[i].state = StageState::Failed;
                return Err(PipelineError::MissingDependency { stage: id, dependency });
            }

            on_stage_start(stage.name(), i, total);
            info!(stage = stage.name(), "stage started");
            records[i].state = StageState::Running;
            let start = Instant::now();

            let outcome = stage
                .apply(ctx)
                .and_then(|()| stage.validate(ctx).map_err(StageError::from));
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            records[i].elapsed_ms = elapsed_ms;

            if let Err(source) = outcome {
                records[i].state = StageState::Failed;
                warn!(stage = stage.name(), elapsed_ms, error = %source, "stage failed");
                return Err(PipelineError::StageFailed { stage: id, source });
            }
            records[i].state = StageState::Validated;

            completed.push(id);
            records[i].state = StageState::Done;
            info!(stage = stage.name(), elapsed_ms, "stage finished");
            on_stage_complete(stage.name(), i, elapsed_ms);
        }

        let report = RunReport {
            profile,
            stages: records,
            sea_level: ctx.sea_level,
            relief_base: ctx.relief_base,
            rivers: ctx.river_report.clone(),
        };
        info!(total_ms = report.total_ms(), "pipeline finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::icosphere;
    use crate::terrain::{Cell, GenerationSettings};

    struct Marker {
        id: StageId,
        deps: Vec<StageId>,
        fail_validation: bool,
    }

    impl GenerationStage for Marker {
        fn id(&self) -> StageId {
            self.id
        }

        fn name(&self) -> &str {
            self.id.name()
        }

        fn dependencies(&self) -> &[StageId] {
            &self.deps
        }

        fn apply(&self, ctx: &mut WorldContext) -> Result<(), StageError> {
            for c in &mut ctx.cells {
                c.stress += 1.0;
            }
            Ok(())
        }

        fn validate(&self, _ctx: &WorldContext) -> Result<(), ValidationError> {
            if self.fail_validation {
                Err(ValidationError::cell(3, "bad"))
            } else {
                Ok(())
            }
        }
    }

    fn marker(id: StageId, deps: &[StageId]) -> Marker {
        Marker { id, deps: deps.to_vec(), fail_validation: false }
    }

    fn context(planet: PlanetConfiguration) -> WorldContext {
        let cells: Vec<Cell> = icosphere(1);
        WorldContext::new(cells, planet, GenerationSettings::fast(1), 4)
    }

    #[test]
    fn test_profiles_follow_planet_class() {
        assert_eq!(StageProfile::for_planet(&PlanetConfiguration::earth_like()), StageProfile::Terrestrial);
        assert_eq!(StageProfile::for_planet(&PlanetConfiguration::moon_like()), StageProfile::Airless);
        assert_eq!(StageProfile::for_planet(&PlanetConfiguration::lava_world()), StageProfile::Lava);
        assert_eq!(StageProfile::for_planet(&PlanetConfiguration::ice_world()), StageProfile::IceVolatile);
        assert!(!StageProfile::Airless.enables(StageId::Erosion));
        assert!(StageProfile::Lava.enables(StageId::Erosion));
        assert!(!StageProfile::IceVolatile.enables(StageId::Rivers));
    }

    #[test]
    fn test_stages_run_in_order_and_report() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(marker(StageId::Topology, &[])).add_stage(marker(StageId::Plates, &[StageId::Topology]));
        let mut ctx = context(PlanetConfiguration::earth_like());

        let mut started = Vec::new();
        let mut finished = 0;
        let report = pipeline
            .run_with_callbacks(&mut ctx, |name, _, _| started.push(name.to_string()), |_, _, _| finished += 1)
            .unwrap();

        assert_eq!(started, vec!["topology", "plates"]);
        assert_eq!(finished, 2);
        assert_eq!(report.state(StageId::Plates), Some(StageState::Done));
        assert!(ctx.cells.iter().all(|c| c.stress == 2.0));
    }

    #[test]
    fn test_disabled_stage_has_no_side_effects() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(marker(StageId::Erosion, &[]));
        let pipeline = pipeline.with_profile(StageProfile::Airless);
        let mut ctx = context(PlanetConfiguration::earth_like());
        let before = ctx.cells.clone();

        let report = pipeline.run(&mut ctx).unwrap();
        assert_eq!(report.state(StageId::Erosion), Some(StageState::Skipped));
        assert_eq!(ctx.cells, before);
    }

    #[test]
    fn test_missing_dependency_aborts() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(marker(StageId::Rivers, &[StageId::Climate]));
        let mut ctx = context(PlanetConfiguration::earth_like());

        match pipeline.run(&mut ctx) {
            Err(PipelineError::MissingDependency { stage, dependency }) => {
                assert_eq!(stage, StageId::Rivers);
                assert_eq!(dependency, StageId::Climate);
            }
            other => panic!("expected missing dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_failure_is_wrapped_with_stage_id() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(marker(StageId::Topology, &[]))
            .add_stage(Marker { id: StageId::Plates, deps: vec![], fail_validation: true })
            .add_stage(marker(StageId::Stress, &[]));
        let mut ctx = context(PlanetConfiguration::earth_like());

        let err = pipeline.run(&mut ctx).unwrap_err();
        assert_eq!(err.stage(), StageId::Plates);
        assert!(matches!(
            err,
            PipelineError::StageFailed { source: StageError::Validation(ValidationError::Cell { cell: 3, .. }), .. }
        ));
        assert!(err.to_string().contains("plates"));
        // The third stage never ran.
        assert!(ctx.cells.iter().all(|c| c.stress == 2.0));
    }
}
