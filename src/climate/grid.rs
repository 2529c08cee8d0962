//! Immutable per-run view of the grid used by every climate phase.

use glam::Vec2;

use crate::exec::map_cells;
use crate::geometry::CellFrames;
use crate::terrain::{Cell, SurfaceType};

/// Cells plus the geometry derived from them.
///
/// Built once per climate run; every phase reads it and writes fresh buffers.
pub struct ClimateGrid<'a> {
    pub cells: &'a [Cell],
    pub frames: CellFrames,
    /// Height above sea level (km); 0 for water and sub-sea land.
    pub height_km: Vec<f32>,
    /// Latitude / longitude in radians.
    pub latitude: Vec<f32>,
    pub longitude: Vec<f32>,
    /// Steepest neighbor slope (km per km).
    pub slope: Vec<f32>,
    pub height_gradient: Vec<Vec2>,
    pub seed: u64,
    pub parallel: bool,
}

impl<'a> ClimateGrid<'a> {
    pub fn new(
        cells: &'a [Cell],
        radius_km: f32,
        sea_level: u8,
        elevation_step_m: f32,
        seed: u64,
        parallel: bool,
    ) -> Self {
        let frames = CellFrames::new(cells, radius_km, parallel);
        let height_km: Vec<f32> = cells
            .iter()
            .map(|c| {
                if c.is_water() {
                    0.0
                } else {
                    c.elevation.saturating_sub(sea_level) as f32 * elevation_step_m / 1000.0
                }
            })
            .collect();
        let slope = map_cells(parallel, cells.len(), |i| {
            cells[i]
                .neighbors
                .iter()
                .zip(&frames.distances_km[i])
                .map(|(&j, &d)| (height_km[j] - height_km[i]).abs() / d)
                .fold(0.0f32, f32::max)
        });

        let mut grid = Self {
            cells,
            frames,
            height_km,
            latitude: cells.iter().map(|c| c.latitude.to_radians()).collect(),
            longitude: cells.iter().map(|c| c.longitude.to_radians()).collect(),
            slope,
            height_gradient: Vec::new(),
            seed,
            parallel,
        };
        grid.height_gradient = grid.gradient(&grid.height_km);
        grid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn surface(&self, i: usize) -> SurfaceType {
        self.cells[i].surface
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.cells[i].neighbors
    }

    /// Local gradient of `field` per km, in (east, north) components.
    ///
    /// Least-squares estimate over the neighbor ring: `2/deg * Σ Δf/d * dir`.
    pub fn gradient(&self, field: &[f32]) -> Vec<Vec2> {
        map_cells(self.parallel, self.len(), |i| self.gradient_at(field, i))
    }

    pub fn gradient_at(&self, field: &[f32], i: usize) -> Vec2 {
        let neighbors = self.neighbors(i);
        if neighbors.is_empty() {
            return Vec2::ZERO;
        }
        let sum: Vec2 = neighbors
            .iter()
            .enumerate()
            .map(|(k, &j)| {
                self.frames.directions[i][k] * ((field[j] - field[i]) / self.frames.distances_km[i][k])
            })
            .sum();
        sum * (2.0 / neighbors.len() as f32)
    }

    /// Plain mean of `field` over the neighbors of `i` (or `field[i]` if isolated).
    pub fn neighbor_mean(&self, field: &[f32], i: usize) -> f32 {
        let neighbors = self.neighbors(i);
        if neighbors.is_empty() {
            return field[i];
        }
        neighbors.iter().map(|&j| field[j]).sum::<f32>() / neighbors.len() as f32
    }

    /// Symmetric exchange weight between `i` and its neighbor `j`.
    pub fn pair_weight(&self, i: usize, j: usize) -> f32 {
        1.0 / self.neighbors(i).len().max(self.neighbors(j).len()).max(1) as f32
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::{build_topology, icosphere};

    /// Level-2 icosphere with land everywhere at the given elevation.
    pub(crate) fn land_grid(level: u32, elevation: u8) -> Vec<Cell> {
        let mut cells = icosphere(level);
        build_topology(&mut cells, false).unwrap();
        for c in &mut cells {
            c.elevation = elevation;
            c.surface = SurfaceType::Plains;
        }
        cells
    }

    #[test]
    fn flat_grid_has_zero_slope() {
        let cells = land_grid(2, 100);
        let grid = ClimateGrid::new(&cells, 6371.0, 50, 50.0, 1, false);
        assert!(grid.slope.iter().all(|&s| s == 0.0));
        assert!(grid.height_km.iter().all(|&h| (h - 2.5).abs() < 1e-6));
        assert!(grid.height_gradient.iter().all(|g| g.length() < 1e-6));
    }

    #[test]
    fn gradient_points_uphill() {
        let mut cells = land_grid(3, 100);
        // Elevation rises to the east across the equator.
        for c in &mut cells {
            c.elevation = (100.0 + c.longitude / 2.0) as u8;
        }
        let grid = ClimateGrid::new(&cells, 6371.0, 0, 50.0, 1, false);
        let field: Vec<f32> = cells.iter().map(|c| c.longitude).collect();
        let i = cells
            .iter()
            .filter(|c| c.latitude.abs() < 10.0 && c.longitude.abs() < 60.0)
            .map(|c| c.id)
            .next()
            .unwrap();
        assert!(grid.gradient_at(&field, i).x > 0.0);
    }
}
