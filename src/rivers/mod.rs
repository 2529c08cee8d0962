//! River network builder.
//!
//! Pass 1 scores every land cell by discharge potential and measures its
//! distance to open water. Pass 2 traces channels from the best sources, then
//! discharge is accumulated in topological order and every river cell is
//! tagged with a segment kind. Wet lowland left without a river becomes swamp.

mod classify;
mod config;
mod discharge;
mod network;
mod potential;
mod trace;

pub use classify::{classify_segments, mark_swamps};
pub use config::RiverConfig;
pub use discharge::{accumulate_discharge, link_upstream};
pub use network::{build_river_network, RiverReport};
pub use potential::{
    discharge_potential, distance_to_water, passable_mask, select_sources, wetness_index,
    MM_DAY_KM2_TO_M3_S,
};
pub use trace::{trace_path, PathEnd, RoutingFailure, Terrain, TracedPath};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::geometry::{build_topology, icosphere};
    use crate::terrain::{Cell, SurfaceType};

    fn temperate(cell: &mut Cell) {
        cell.temperature = 15.0;
        cell.temperature_min = 8.0;
        cell.temperature_max = 22.0;
        cell.pressure = 1013.0;
        cell.soil_moisture = 60.0;
        cell.seasonal_precipitation = 3.0;
        cell.seasonal_runoff = 1.0;
    }

    /// Equatorial chain: cell 0 is ocean, cell `i` is plains at elevation `10 i`.
    pub fn strip(count: usize) -> Vec<Cell> {
        (0..count)
            .map(|i| {
                let mut c = Cell::new(i, 0.0, i as f32);
                temperate(&mut c);
                if i > 0 {
                    c.neighbors.push(i - 1);
                }
                if i + 1 < count {
                    c.neighbors.push(i + 1);
                }
                c.elevation = (i * 10).min(255) as u8;
                c.surface = if i == 0 { SurfaceType::Ocean } else { SurfaceType::Plains };
                c
            })
            .collect()
    }

    /// Icosphere with a flat plateau at elevation 100 and a one-cell ocean at id 0.
    pub fn plateau(level: u32) -> Vec<Cell> {
        let mut cells = icosphere(level);
        build_topology(&mut cells, false).unwrap();
        for c in &mut cells {
            temperate(c);
            c.elevation = 100;
            c.surface = SurfaceType::Plains;
        }
        cells[0].elevation = 0;
        cells[0].surface = SurfaceType::Ocean;
        cells
    }
}
