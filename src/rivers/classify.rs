//! Segment classification and swamp marking.

use std::collections::VecDeque;

use super::RiverConfig;
use crate::terrain::{Cell, RiverKind, SurfaceType};

fn size_tier(discharge: f32, mean_source: f32) -> RiverKind {
    let ratio = discharge / mean_source.max(1e-6);
    let [medium, large, very_large] = RiverConfig::TIERS;
    if ratio < medium {
        RiverKind::Small
    } else if ratio < large {
        RiverKind::Medium
    } else if ratio < very_large {
        RiverKind::Large
    } else {
        RiverKind::VeryLarge
    }
}

/// How far a cell sits below the mean of its neighbors.
fn incision(cells: &[Cell], i: usize) -> f32 {
    let cell = &cells[i];
    if cell.neighbors.is_empty() {
        return 0.0;
    }
    let mean = cell.neighbors.iter().map(|&j| cells[j].elevation as f32).sum::<f32>()
        / cell.neighbors.len() as f32;
    mean - cell.elevation as f32
}

fn segment_kind(cells: &[Cell], i: usize, mean_source: f32, config: &RiverConfig) -> RiverKind {
    let river = &cells[i].river;
    if river.upstream.is_empty() {
        return RiverKind::Source;
    }
    let elevation = cells[i].elevation;
    let downstream = river.downstream.map(|d| &cells[d]);
    let mouth = downstream.is_some_and(|d| d.is_water());
    let drop = downstream.map_or(0, |d| elevation.saturating_sub(d.elevation));
    let cut = incision(cells, i);

    if mouth && river.discharge >= config.delta_ratio * mean_source {
        RiverKind::Delta
    } else if drop >= config.waterfall_drop {
        RiverKind::Waterfall
    } else if cut >= config.canyon_depth {
        RiverKind::Canyon
    } else if cut >= config.valley_depth {
        RiverKind::Valley
    } else {
        size_tier(river.discharge, mean_source)
    }
}

/// Tags every river cell with its segment kind.
///
/// Headwaters are `Source`. Downstream of that, landform wins over size: a
/// high-discharge mouth is a `Delta`, a large drop a `Waterfall`, a deep cut
/// a `Canyon` or `Valley`. Remaining cells are sized by discharge relative to
/// `mean_source` (m³/s). Non-river cells get `RiverKind::None`.
pub fn classify_segments(cells: &mut [Cell], mean_source: f32, config: &RiverConfig) {
    let kinds: Vec<RiverKind> = (0..cells.len())
        .map(|i| {
            if cells[i].river.is_river {
                segment_kind(cells, i, mean_source, config)
            } else {
                RiverKind::None
            }
        })
        .collect();
    for (cell, kind) in cells.iter_mut().zip(kinds) {
        cell.river.kind = kind;
    }
}

/// Steps from every cell to the nearest river cell, searched no further than
/// `radius`.
fn near_river(cells: &[Cell], radius: u32) -> Vec<bool> {
    let mut depth: Vec<Option<u32>> = vec![None; cells.len()];
    let mut queue = VecDeque::new();
    for cell in cells.iter().filter(|c| c.river.is_river) {
        depth[cell.id] = Some(0);
        queue.push_back(cell.id);
    }
    while let Some(i) = queue.pop_front() {
        let d = depth[i].unwrap_or(0);
        if d >= radius {
            continue;
        }
        for &j in &cells[i].neighbors {
            if depth[j].is_none() {
                depth[j] = Some(d + 1);
                queue.push_back(j);
            }
        }
    }
    depth.into_iter().map(|d| d.is_some()).collect()
}

/// Turns wet, low-lying plains away from any river into `Swamp`.
///
/// Candidates must be passable (liquid water possible), no more than
/// `swamp_max_height` above `relief_base`, hold at least `swamp_min_soil`
/// percent soil moisture, and lie farther than `swamp_river_distance` steps
/// from every river cell. Returns the number of new swamp cells.
pub fn mark_swamps(cells: &mut [Cell], passable: &[bool], relief_base: u8, config: &RiverConfig) -> usize {
    let near = near_river(cells, config.swamp_river_distance);
    let ceiling = relief_base.saturating_add(config.swamp_max_height);
    let mut marked = 0;
    for cell in cells.iter_mut() {
        let wet_lowland = cell.surface == SurfaceType::Plains
            && passable[cell.id]
            && !near[cell.id]
            && cell.elevation <= ceiling
            && cell.soil_moisture >= config.swamp_min_soil;
        if wet_lowland {
            cell.surface = SurfaceType::Swamp;
            marked += 1;
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::super::test_support::strip;
    use super::*;

    #[test]
    fn test_headwater_is_source_and_mouth_is_delta() {
        let mut cells = strip(5);
        for i in 1..5 {
            cells[i].river.is_river = true;
            cells[i].river.downstream = Some(i - 1);
            cells[i].river.discharge = (5 - i) as f32 * 20.0;
        }
        for i in 1..4 {
            cells[i].river.upstream = vec![i + 1];
        }
        classify_segments(&mut cells, 1.0, &RiverConfig::default());
        assert_eq!(cells[0].river.kind, RiverKind::None);
        assert_eq!(cells[4].river.kind, RiverKind::Source);
        assert_eq!(cells[1].river.kind, RiverKind::Delta);
        assert_eq!(cells[3].river.kind, RiverKind::Large);
    }

    #[test]
    fn test_steep_drop_is_waterfall_and_deep_cut_is_canyon() {
        let mut cells = strip(5);
        // 4 -> 3 -> 2 -> 1, with a cliff between 3 and 2 and a gorge at 2.
        cells[1].elevation = 150;
        cells[2].elevation = 100;
        cells[3].elevation = 200;
        cells[4].elevation = 210;
        for i in 2..5 {
            cells[i].river.is_river = true;
            cells[i].river.downstream = Some(i - 1);
            cells[i].river.discharge = 1.0;
        }
        cells[2].river.upstream = vec![3];
        cells[3].river.upstream = vec![4];
        classify_segments(&mut cells, 1.0, &RiverConfig::default());
        assert_eq!(cells[3].river.kind, RiverKind::Waterfall);
        assert_eq!(cells[2].river.kind, RiverKind::Canyon);
    }

    #[test]
    fn test_size_tiers() {
        assert_eq!(size_tier(1.0, 1.0), RiverKind::Small);
        assert_eq!(size_tier(5.0, 1.0), RiverKind::Medium);
        assert_eq!(size_tier(20.0, 1.0), RiverKind::Large);
        assert_eq!(size_tier(100.0, 1.0), RiverKind::VeryLarge);
    }

    #[test]
    fn test_swamps_form_away_from_rivers() {
        let mut cells = strip(12);
        for c in cells.iter_mut().skip(1) {
            c.elevation = 3;
            c.soil_moisture = 90.0;
            c.surface = SurfaceType::Plains;
        }
        cells[2].river.is_river = true;
        let passable = vec![true; cells.len()];
        let marked = mark_swamps(&mut cells, &passable, 0, &RiverConfig::default());
        assert_eq!(cells[0].surface, SurfaceType::Ocean);
        assert_eq!(cells[4].surface, SurfaceType::Plains);
        assert_eq!(cells[5].surface, SurfaceType::Swamp);
        assert_eq!(marked, 7);
    }
}
