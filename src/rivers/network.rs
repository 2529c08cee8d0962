//! River network builder: ties the passes together.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classify::{classify_segments, mark_swamps};
use super::discharge::{accumulate_discharge, link_upstream};
use super::potential::{
    discharge_potential, distance_to_water, passable_mask, select_sources, MM_DAY_KM2_TO_M3_S,
};
use super::trace::{trace_path, RoutingFailure, Terrain, TracedPath};
use super::RiverConfig;
use crate::terrain::{Cell, RiverState};

/// Summary of one river network build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverReport {
    /// Sources that started their own channel.
    pub sources: usize,
    /// Selected sources that an earlier channel had already claimed.
    pub merged: usize,
    /// Sources given up after exhausting their retries.
    pub abandoned: usize,
    pub river_cells: usize,
    pub swamps: usize,
    /// Cells flushed outside the topological order.
    pub flushed: usize,
    /// m³/s.
    pub max_discharge: f32,
}

fn trace_with_retries(
    terrain: Terrain<'_>,
    claimed: &[bool],
    source: usize,
    seed: u64,
    config: &RiverConfig,
) -> Result<TracedPath, RoutingFailure> {
    let mut attempt = 0;
    loop {
        match trace_path(terrain, claimed, source, seed, attempt, config) {
            Ok(path) => return Ok(path),
            Err(RoutingFailure::Impassable(cell)) => return Err(RoutingFailure::Impassable(cell)),
            Err(failure) if attempt >= config.retries => return Err(failure),
            Err(_) => attempt += 1,
        }
    }
}

/// Builds the river network over finished climate and relief fields.
///
/// Clears any previous river state, selects sources by discharge potential,
/// traces them in order (highest first), accumulates discharge, classifies
/// segments and marks swamps. Abandoned sources are logged and counted, never
/// returned as errors.
pub fn build_river_network(
    cells: &mut [Cell],
    relief_base: u8,
    cell_area_km2: f32,
    seed: u64,
    config: &RiverConfig,
) -> RiverReport {
    for cell in cells.iter_mut() {
        cell.river = RiverState::default();
    }

    let n = cells.len();
    let passable = passable_mask(cells);
    let distance = distance_to_water(cells, &passable);
    let potential = discharge_potential(cells, cell_area_km2);
    let sources = select_sources(cells, &potential, &distance, &passable, relief_base, config);

    let mut report = RiverReport::default();
    let mut claimed = vec![false; n];
    let mut downstream: Vec<Option<usize>> = vec![None; n];
    let mut source_flow = vec![0.0f32; n];

    {
        let terrain = Terrain { cells: &*cells, distance: &distance, passable: &passable };
        for &source in &sources {
            if claimed[source] {
                report.merged += 1;
                continue;
            }
            match trace_with_retries(terrain, &claimed, source, seed, config) {
                Ok(path) => {
                    for pair in path.cells.windows(2) {
                        downstream[pair[0]] = Some(pair[1]);
                    }
                    if let Some(&last) = path.cells.last() {
                        downstream[last] = Some(path.end.cell());
                    }
                    for &c in &path.cells {
                        claimed[c] = true;
                    }
                    source_flow[source] = potential[source] * MM_DAY_KM2_TO_M3_S;
                    report.sources += 1;
                }
                Err(failure) => {
                    report.abandoned += 1;
                    debug!(source, %failure, "river source abandoned");
                }
            }
        }
    }

    if report.abandoned > 0 && report.sources == 0 {
        warn!(abandoned = report.abandoned, "every river source was abandoned");
    }

    for (i, cell) in cells.iter_mut().enumerate() {
        cell.river.is_river = claimed[i];
        cell.river.downstream = downstream[i];
    }
    link_upstream(cells);
    report.flushed = accumulate_discharge(cells, &source_flow, cell_area_km2, config);

    let mean_source = if report.sources > 0 {
        source_flow.iter().sum::<f32>() / report.sources as f32
    } else {
        0.0
    };
    classify_segments(cells, mean_source, config);
    report.swamps = mark_swamps(cells, &passable, relief_base, config);

    report.river_cells = claimed.iter().filter(|&&c| c).count();
    report.max_discharge = cells.iter().map(|c| c.river.discharge).fold(0.0, f32::max);

    debug!(
        sources = report.sources,
        merged = report.merged,
        abandoned = report.abandoned,
        river_cells = report.river_cells,
        swamps = report.swamps,
        max_discharge = report.max_discharge,
        "river network built"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{plateau, strip};
    use super::*;
    use crate::terrain::{RiverKind, SurfaceType};

    #[test]
    fn test_strip_has_single_source_to_ocean() {
        let mut cells = strip(20);
        let config = RiverConfig { source_fraction: 1.0, ..Default::default() };
        let report = build_river_network(&mut cells, 0, 500.0, 3, &config);

        assert_eq!(report.sources, 1);
        assert_eq!(report.abandoned, 0);
        assert_eq!(report.river_cells, 19);
        assert_eq!(cells[19].river.kind, RiverKind::Source);
        assert_eq!(cells[1].river.downstream, Some(0));
        assert!(!cells[0].river.is_river);
        for i in 1..19 {
            assert_eq!(cells[i + 1].river.downstream, Some(i));
            assert!(cells[i].river.discharge >= cells[i + 1].river.discharge);
        }
    }

    #[test]
    fn test_channels_are_acyclic_and_reach_water() {
        let mut cells = plateau(3);
        for c in cells.iter_mut().skip(1) {
            c.elevation = 60 + (c.latitude.abs() as u8);
        }
        build_river_network(&mut cells, 0, 1000.0, 11, &RiverConfig::default());
        let n = cells.len();
        for start in (0..n).filter(|&i| cells[i].river.is_river) {
            let mut current = start;
            let mut steps = 0;
            while cells[current].river.is_river {
                current = cells[current].river.downstream.unwrap();
                steps += 1;
                assert!(steps <= n, "cycle through cell {}", start);
            }
            assert_eq!(cells[current].surface, SurfaceType::Ocean);
        }
    }

    #[test]
    fn test_discharge_covers_own_contribution() {
        let mut cells = strip(20);
        let config = RiverConfig { source_fraction: 1.0, ..Default::default() };
        build_river_network(&mut cells, 0, 500.0, 3, &config);
        let potential = discharge_potential(&cells, 500.0);
        assert!(cells[19].river.discharge >= potential[19] * MM_DAY_KM2_TO_M3_S);
    }

    #[test]
    fn test_same_seed_same_network() {
        let mut a = plateau(3);
        let mut b = a.clone();
        let ra = build_river_network(&mut a, 0, 1000.0, 5, &RiverConfig::default());
        let rb = build_river_network(&mut b, 0, 1000.0, 5, &RiverConfig::default());
        assert_eq!(ra, rb);
        assert_eq!(a, b);
    }

    #[test]
    fn test_frozen_world_has_no_rivers() {
        let mut cells = strip(10);
        for c in &mut cells {
            c.temperature = -40.0;
            c.temperature_max = -20.0;
        }
        let report = build_river_network(&mut cells, 0, 500.0, 1, &RiverConfig::default());
        assert_eq!(report.sources, 0);
        assert!(cells.iter().all(|c| !c.river.is_river));
    }
}
