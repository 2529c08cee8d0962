//! Per-run world state.

use crate::rivers::RiverReport;
use crate::tectonics::Plate;

use super::{Cell, GenerationSettings, PlanetConfiguration};

/// Mutable bundle owned by exactly one pipeline execution.
///
/// Holds the cell arena, the planet and settings it was started with, and the
/// state derived by earlier stages (plates, sea level, river summary).
#[derive(Debug, Clone)]
pub struct WorldContext {
    pub cells: Vec<Cell>,
    pub planet: PlanetConfiguration,
    pub settings: GenerationSettings,
    pub plate_count: usize,
    /// Populated by the plate stage; immutable afterwards.
    pub plates: Vec<Plate>,
    /// Elevation at or below which cells are submerged; set by the base-surface
    /// stage. `None` on planets without a sea.
    pub sea_level: Option<u8>,
    /// Elevation that relief classes are measured from: sea level, or the
    /// lowest cell on a dry planet. Fixed by the base-surface stage so later
    /// reshaping of the terrain does not move it.
    pub relief_base: u8,
    pub river_report: Option<RiverReport>,
}

impl WorldContext {
    pub fn new(
        cells: Vec<Cell>,
        planet: PlanetConfiguration,
        settings: GenerationSettings,
        plate_count: usize,
    ) -> Self {
        Self {
            cells,
            planet,
            settings,
            plate_count,
            plates: Vec::new(),
            sea_level: None,
            relief_base: 0,
            river_report: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.settings.seed
    }

    pub fn parallel(&self) -> bool {
        self.settings.parallel
    }

    /// Surface area of one cell in km², assuming equal-area cells.
    pub fn cell_area_km2(&self) -> f32 {
        self.planet.surface_area_km2() / self.cells.len().max(1) as f32
    }

    /// Returns the cell arena, consuming the context.
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// Fixes the sea level and the relief base derived from it.
    pub fn set_sea_level(&mut self, sea_level: Option<u8>) {
        self.sea_level = sea_level;
        self.relief_base = sea_level.unwrap_or_else(|| self.elevation_range().0);
    }

    /// Global (min, max) elevation.
    pub fn elevation_range(&self) -> (u8, u8) {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for c in &self.cells {
            min = min.min(c.elevation);
            max = max.max(c.elevation);
        }
        (min, max)
    }
}
