//! Pass 1: discharge potential, distance to water and source selection.

use std::collections::VecDeque;

use super::RiverConfig;
use crate::climate::supports_liquid_water;
use crate::terrain::Cell;

/// 1 mm/day over 1 km² expressed in m³/s.
pub const MM_DAY_KM2_TO_M3_S: f32 = 1000.0 / 86_400.0;

/// Land cells where liquid water can exist. Everything else is impassable.
pub fn passable_mask(cells: &[Cell]) -> Vec<bool> {
    cells
        .iter()
        .map(|c| c.is_land() && supports_liquid_water(c.temperature_max, c.temperature, c.pressure))
        .collect()
}

/// Share of the vapor column counted as locally available water per day.
const VAPOR_DAILY_FRACTION: f32 = 0.05;
/// Elevation drop that halves the wetness index.
const SLOPE_HALVING_DROP: f32 = 40.0;

/// Topographic wetness proxy in mm/day for cell `i`.
///
/// Seasonal precipitation scaled by soil saturation, plus a share of the
/// vapor column overhead, divided by a penalty that grows with the steepest
/// drop to a neighbor.
pub fn wetness_index(cells: &[Cell], i: usize) -> f32 {
    let cell = &cells[i];
    let soil = (cell.soil_moisture / 100.0).clamp(0.0, 1.0);
    let water = soil * cell.seasonal_precipitation.max(0.0)
        + VAPOR_DAILY_FRACTION * cell.atmospheric_moisture.max(0.0);
    let drop = cell
        .neighbors
        .iter()
        .map(|&j| cell.elevation.saturating_sub(cells[j].elevation))
        .max()
        .unwrap_or(0);
    water / (1.0 + f32::from(drop) / SLOPE_HALVING_DROP)
}

fn lowest_lower_neighbor(cells: &[Cell], i: usize) -> Option<usize> {
    let h = cells[i].elevation;
    cells[i]
        .neighbors
        .iter()
        .copied()
        .filter(|&j| cells[j].elevation < h)
        .min_by_key(|&j| (cells[j].elevation, j))
}

/// Discharge potential per cell in mm/day·km².
///
/// `wetness_index × cell area` plus seasonal runoff routed down the steepest
/// strictly-lower neighbor. Non-land cells have zero potential.
pub fn discharge_potential(cells: &[Cell], cell_area_km2: f32) -> Vec<f32> {
    let n = cells.len();
    let mut routed: Vec<f32> = cells
        .iter()
        .map(|c| if c.is_land() { c.seasonal_runoff.max(0.0) * cell_area_km2 } else { 0.0 })
        .collect();

    // Receivers are strictly lower, so a descending sweep visits donors first.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| cells[b].elevation.cmp(&cells[a].elevation).then(a.cmp(&b)));
    for &i in &order {
        if !cells[i].is_land() {
            continue;
        }
        if let Some(low) = lowest_lower_neighbor(cells, i) {
            routed[low] += routed[i];
        }
    }

    cells
        .iter()
        .zip(routed)
        .map(|(c, r)| if c.is_land() { wetness_index(cells, c.id) * cell_area_km2 + r } else { 0.0 })
        .collect()
}

/// Breadth-first step count from every cell to the nearest open water.
///
/// Water cells are 0. The search only crosses passable cells, so land that
/// is cut off from the sea by frozen or dry ground stays `None`.
pub fn distance_to_water(cells: &[Cell], passable: &[bool]) -> Vec<Option<u32>> {
    let mut distance = vec![None; cells.len()];
    let mut queue = VecDeque::new();
    for cell in cells.iter().filter(|c| c.is_water()) {
        distance[cell.id] = Some(0);
        queue.push_back(cell.id);
    }
    while let Some(i) = queue.pop_front() {
        let next = distance[i].map_or(0, |d| d + 1);
        for &j in &cells[i].neighbors {
            if distance[j].is_none() && passable[j] {
                distance[j] = Some(next);
                queue.push_back(j);
            }
        }
    }
    distance
}

/// Picks river sources and returns them in tracing order.
///
/// Candidates are passable land connected to water, at least
/// `min_source_height` above `relief_base`, with positive potential. The top
/// `source_fraction` of them by potential are kept and then ordered from the
/// highest elevation down, ties by potential and then id.
pub fn select_sources(
    cells: &[Cell],
    potential: &[f32],
    distance: &[Option<u32>],
    passable: &[bool],
    relief_base: u8,
    config: &RiverConfig,
) -> Vec<usize> {
    let floor = relief_base.saturating_add(config.min_source_height);
    let mut candidates: Vec<usize> = cells
        .iter()
        .filter(|c| {
            passable[c.id]
                && distance[c.id].is_some_and(|d| d > 0)
                && c.elevation >= floor
                && potential[c.id] > 0.0
        })
        .map(|c| c.id)
        .collect();

    candidates.sort_by(|&a, &b| potential[b].total_cmp(&potential[a]).then(a.cmp(&b)));
    let keep = (config.source_fraction.clamp(0.0, 1.0) * candidates.len() as f32).ceil() as usize;
    candidates.truncate(keep);

    candidates.sort_by(|&a, &b| {
        cells[b]
            .elevation
            .cmp(&cells[a].elevation)
            .then(potential[b].total_cmp(&potential[a]))
            .then(a.cmp(&b))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::super::test_support::strip;
    use super::*;

    #[test]
    fn test_distance_counts_steps_from_the_sea() {
        let cells = strip(6);
        let passable = passable_mask(&cells);
        let d = distance_to_water(&cells, &passable);
        assert_eq!(d, vec![Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_frozen_cells_block_the_search() {
        let mut cells = strip(6);
        cells[3].temperature_max = -10.0;
        cells[3].temperature = -20.0;
        let passable = passable_mask(&cells);
        assert!(!passable[3]);
        let d = distance_to_water(&cells, &passable);
        assert_eq!(d[2], Some(2));
        assert_eq!(d[3], None);
        assert_eq!(d[4], None);
    }

    #[test]
    fn test_wetness_rises_with_vapor_and_falls_with_slope() {
        let mut cells = strip(5);
        let base = wetness_index(&cells, 2);
        assert!(base > 0.0);

        cells[2].atmospheric_moisture = 60.0;
        let humid = wetness_index(&cells, 2);
        assert!(humid > base, "humid {} vs dry {}", humid, base);

        cells[2].atmospheric_moisture = 0.0;
        cells[2].elevation = 200;
        let steep = wetness_index(&cells, 2);
        assert!(steep < base, "steep {} vs gentle {}", steep, base);
    }

    #[test]
    fn test_runoff_accumulates_downhill() {
        let cells = strip(8);
        let p = discharge_potential(&cells, 100.0);
        assert_eq!(p[0], 0.0);
        for i in 1..7 {
            assert!(p[i] > p[i + 1], "potential should grow toward the sea at {}", i);
        }
    }

    #[test]
    fn test_sources_are_high_and_ordered() {
        let cells = strip(20);
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let potential = discharge_potential(&cells, 100.0);
        let config = RiverConfig { source_fraction: 0.5, ..Default::default() };
        let sources = select_sources(&cells, &potential, &distance, &passable, 0, &config);
        assert!(!sources.is_empty());
        for w in sources.windows(2) {
            assert!(cells[w[0]].elevation >= cells[w[1]].elevation);
        }
        assert!(sources.iter().all(|&s| cells[s].elevation >= config.min_source_height));
    }

    #[test]
    fn test_cells_without_liquid_water_are_never_sources() {
        let mut cells = strip(10);
        for c in cells.iter_mut().skip(5) {
            c.pressure = 3.0;
        }
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let potential = discharge_potential(&cells, 100.0);
        let config = RiverConfig { source_fraction: 1.0, ..Default::default() };
        let sources = select_sources(&cells, &potential, &distance, &passable, 0, &config);
        assert!(sources.iter().all(|&s| s < 5));
    }
}
