//! Procedural planet surface simulation.
//!
//! Derives relief, tectonics, atmospheric circulation, hydrology, erosion and
//! a river network for a planet from a compact physical description and a
//! fixed grid of cells. The whole run goes through [`pipeline::run`].

pub mod climate;
pub mod erosion;
pub mod exec;
pub mod geometry;
pub mod noise;
pub mod pipeline;
pub mod rivers;
pub mod tectonics;
pub mod terrain;

pub use climate::{ClimateConfig, ClimateSummary};
pub use erosion::{ErosionConfig, ErosionSummary};
pub use geometry::{build_topology, icosphere, TopologyError};
pub use pipeline::{run, GenerationStage, Pipeline, PipelineError, RunReport, StageId, StageProfile};
pub use rivers::{RiverConfig, RiverReport};
pub use tectonics::{Plate, TectonicConfig};
pub use terrain::{Cell, GenerationSettings, PlanetConfiguration, SurfaceType, WorldContext};
