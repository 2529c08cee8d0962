//! Per-location cell record.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tectonics::BoundaryType;

/// Categorical surface type.
///
/// The solvers read it only for boundary conditions (drag, hardness, moisture
/// sources and sinks); it is owned by the surface and erosion stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Not yet assigned by the base-surface stage.
    #[default]
    Unclassified,
    /// Open liquid water.
    Ocean,
    /// Frozen sea surface.
    Ice,
    /// Molten rock surface (lava worlds).
    Lava,
    Plains,
    Hills,
    Mountains,
    Volcano,
    /// Waterlogged lowland, assigned by the river stage.
    Swamp,
}

impl SurfaceType {
    /// Returns true for open water (river mouths, moisture source).
    pub fn is_water(self) -> bool {
        matches!(self, SurfaceType::Ocean)
    }

    /// Returns true for solid, exposed ground.
    pub fn is_land(self) -> bool {
        matches!(
            self,
            SurfaceType::Plains
                | SurfaceType::Hills
                | SurfaceType::Mountains
                | SurfaceType::Volcano
                | SurfaceType::Swamp
        )
    }

    /// Returns true for the relief classes the erosion stage may rewrite.
    pub fn is_relief(self) -> bool {
        matches!(self, SurfaceType::Plains | SurfaceType::Hills | SurfaceType::Mountains)
    }

    /// Aerodynamic roughness used by wind drag and damping, roughly in [0, 1].
    pub fn roughness(self) -> f32 {
        match self {
            SurfaceType::Ocean => 0.05,
            SurfaceType::Ice | SurfaceType::Lava => 0.1,
            SurfaceType::Plains | SurfaceType::Unclassified => 0.3,
            SurfaceType::Swamp => 0.35,
            SurfaceType::Hills => 0.6,
            SurfaceType::Volcano => 0.8,
            SurfaceType::Mountains => 1.0,
        }
    }

    /// Relative resistance to erosion (1.0 = plains bedrock).
    pub fn hardness(self) -> f32 {
        match self {
            SurfaceType::Swamp => 0.8,
            SurfaceType::Plains | SurfaceType::Ocean | SurfaceType::Lava | SurfaceType::Unclassified => 1.0,
            SurfaceType::Hills => 1.3,
            SurfaceType::Volcano => 1.5,
            SurfaceType::Mountains => 1.8,
            SurfaceType::Ice => 2.0,
        }
    }
}

/// Base-type tag of a river segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiverKind {
    #[default]
    None,
    Source,
    Small,
    Medium,
    Large,
    VeryLarge,
    Valley,
    Canyon,
    Waterfall,
    Delta,
}

/// River state of a single cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverState {
    pub is_river: bool,
    /// Next cell along the channel, if any.
    pub downstream: Option<usize>,
    /// Channel cells that drain directly into this one.
    pub upstream: Vec<usize>,
    /// Discharge in m³/s.
    pub discharge: f32,
    /// Strahler order (1 for headwaters).
    pub order: u32,
    pub kind: RiverKind,
}

/// One node of the planet grid.
///
/// `id` equals the cell's index in the backing array and is never reassigned.
/// Neighbors are stored as ids; the list is written once by the topology
/// builder and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: usize,
    /// Latitude in degrees, north positive.
    pub latitude: f32,
    /// Longitude in degrees, east positive.
    pub longitude: f32,
    pub neighbors: Vec<usize>,

    /// Elevation in grid units, 0..=255.
    pub elevation: u8,
    pub plate_id: Option<usize>,
    pub continental: bool,
    /// Dominant boundary interaction if the cell touches another plate.
    pub boundary: Option<BoundaryType>,
    pub stress: f32,
    pub volcanic: bool,

    /// Wind (east, north) in m/s.
    pub wind: Vec2,
    /// Mean temperature (°C) over the sampled day.
    pub temperature: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    /// Surface pressure in hPa.
    pub pressure: f32,

    /// Soil moisture, 0..=100 (% of field capacity).
    pub soil_moisture: f32,
    /// Integrated water vapor column (kg/m², equivalently mm).
    pub atmospheric_moisture: f32,
    /// mm/day over the sampled day.
    pub precipitation: f32,
    pub evaporation: f32,
    pub runoff: f32,
    /// mm/day averaged over the seasonal samples.
    pub seasonal_precipitation: f32,
    pub seasonal_evaporation: f32,
    pub seasonal_runoff: f32,

    pub river: RiverState,
    pub surface: SurfaceType,
}

impl Cell {
    /// Creates a blank cell at the given coordinates (degrees).
    pub fn new(id: usize, latitude: f32, longitude: f32) -> Self {
        Self {
            id,
            latitude,
            longitude,
            neighbors: Vec::new(),
            elevation: 0,
            plate_id: None,
            continental: false,
            boundary: None,
            stress: 0.0,
            volcanic: false,
            wind: Vec2::ZERO,
            temperature: 0.0,
            temperature_min: 0.0,
            temperature_max: 0.0,
            pressure: 0.0,
            soil_moisture: 0.0,
            atmospheric_moisture: 0.0,
            precipitation: 0.0,
            evaporation: 0.0,
            runoff: 0.0,
            seasonal_precipitation: 0.0,
            seasonal_evaporation: 0.0,
            seasonal_runoff: 0.0,
            river: RiverState::default(),
            surface: SurfaceType::Unclassified,
        }
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_water(&self) -> bool {
        self.surface.is_water()
    }

    pub fn is_land(&self) -> bool {
        self.surface.is_land()
    }

    /// Latitude in radians.
    pub fn latitude_rad(&self) -> f32 {
        self.latitude.to_radians()
    }
}
