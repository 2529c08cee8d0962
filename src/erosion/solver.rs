//! Iterative thermal / hydraulic / aeolian erosion over the cell graph.

use tracing::debug;

use super::ErosionConfig;
use crate::exec::{fill_cells, map_cells};
use crate::terrain::{classify_relief, Cell, ReliefThresholds, SurfaceType};

/// Aggregates of an erosion run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ErosionSummary {
    pub iterations: u32,
    /// Total elevation removed (units, before deposition).
    pub removed: f32,
    /// Total elevation deposited downhill.
    pub deposited: f32,
    /// Cells whose relief class changed.
    pub reclassified: usize,
}

/// Material leaving one cell in one iteration.
#[derive(Debug, Clone, Copy, Default)]
struct Transfer {
    removed: f32,
    deposit: f32,
    target: Option<usize>,
}

/// Reassigns plains/hills/mountains from elevation thresholds alone.
///
/// Only relief cells are touched; water, ice, lava, volcanoes and swamps keep
/// their type. Returns the number of cells that changed class.
pub fn reclassify_relief(cells: &mut [Cell], base: u8, thresholds: &ReliefThresholds) -> usize {
    let mut changed = 0;
    for cell in cells.iter_mut().filter(|c| c.surface.is_relief()) {
        let relief = classify_relief(cell.elevation, base, thresholds);
        if relief != cell.surface {
            cell.surface = relief;
            changed += 1;
        }
    }
    changed
}

fn relief_for(surface: SurfaceType, elevation: f32, base: u8, thresholds: &ReliefThresholds) -> SurfaceType {
    if surface.is_relief() {
        classify_relief(to_elevation(elevation), base, thresholds)
    } else {
        surface
    }
}

fn to_elevation(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Runs `config.iterations` erosion iterations and writes back elevation and
/// relief classes.
///
/// Per iteration each cell finds its lowest neighbor; if that neighbor is
/// downhill the cell loses thermal (talus excess / hardness / √gravity),
/// hydraulic (precipitation × slope) and, on land, aeolian (wind × dryness)
/// material. Total removal is capped at `max_removal_fraction` of the cell's
/// elevation; `deposition_fraction` of the thermal and hydraulic part lands on
/// the downhill neighbor. Elevations are clamped to 0..=255 after every
/// iteration.
pub fn erode(
    cells: &mut [Cell],
    config: &ErosionConfig,
    gravity: f32,
    relief_base: u8,
    thresholds: &ReliefThresholds,
    parallel: bool,
) -> ErosionSummary {
    let n = cells.len();
    let mut summary = ErosionSummary { iterations: config.iterations, ..Default::default() };
    if n == 0 || config.iterations == 0 {
        return summary;
    }

    let gravity_factor = 1.0 / gravity.max(0.05).sqrt();
    let talus = config.talus.max(0.0);
    let mut height: Vec<f32> = cells.iter().map(|c| c.elevation as f32).collect();
    let mut next = vec![0.0f32; n];
    let mut surface: Vec<SurfaceType> = cells.iter().map(|c| c.surface).collect();
    let original: Vec<SurfaceType> = surface.clone();

    for iteration in 1..=config.iterations {
        let transfers: Vec<Transfer> = map_cells(parallel, n, |i| {
            let cell = &cells[i];
            let h = height[i];
            let Some(low) = cell
                .neighbors
                .iter()
                .copied()
                .min_by(|&a, &b| height[a].total_cmp(&height[b]).then(a.cmp(&b)))
            else {
                return Transfer::default();
            };
            let drop = h - height[low];
            if drop <= 0.0 {
                return Transfer::default();
            }

            let hardness = surface[i].hardness().max(0.1);
            let thermal = if drop > talus {
                (drop - talus) * config.thermal_strength * gravity_factor / hardness
            } else {
                0.0
            };
            let slope = (drop / talus.max(1.0)).min(4.0);
            let hydraulic = config.hydraulic_rate * cell.precipitation.max(0.0) * slope / hardness;
            let aeolian = if surface[i].is_land() {
                let dryness = (1.0 - cell.soil_moisture / 100.0).clamp(0.0, 1.0);
                config.aeolian_rate * cell.wind.length() / 10.0 * dryness / hardness
            } else {
                0.0
            };

            let total = thermal + hydraulic + aeolian;
            if total <= 0.0 {
                return Transfer::default();
            }
            let cap = (config.max_removal_fraction * h).max(0.0);
            let scale = if total > cap { cap / total } else { 1.0 };
            Transfer {
                removed: total * scale,
                deposit: (thermal + hydraulic) * scale * config.deposition_fraction.clamp(0.0, 1.0),
                target: Some(low),
            }
        });

        fill_cells(parallel, &mut next, |i| {
            let gained: f32 = cells[i]
                .neighbors
                .iter()
                .filter(|&&j| transfers[j].target == Some(i))
                .map(|&j| transfers[j].deposit)
                .sum();
            (height[i] - transfers[i].removed + gained).clamp(0.0, 255.0)
        });
        std::mem::swap(&mut height, &mut next);

        for t in &transfers {
            summary.removed += t.removed;
            summary.deposited += t.deposit;
        }

        let periodic = config.reclassify_every > 0 && iteration % config.reclassify_every == 0;
        if periodic || iteration == config.iterations {
            for i in 0..n {
                surface[i] = relief_for(surface[i], height[i], relief_base, thresholds);
            }
        }
    }

    for (i, cell) in cells.iter_mut().enumerate() {
        cell.elevation = to_elevation(height[i]);
        cell.surface = surface[i];
        if surface[i] != original[i] {
            summary.reclassified += 1;
        }
    }

    debug!(
        iterations = summary.iterations,
        removed = summary.removed,
        deposited = summary.deposited,
        reclassified = summary.reclassified,
        "erosion finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build_topology, icosphere};
    use crate::noise::hash;
    use glam::Vec2;

    fn rugged(level: u32) -> Vec<Cell> {
        let mut cells = icosphere(level);
        build_topology(&mut cells, false).unwrap();
        for c in &mut cells {
            c.elevation = (hash(4, c.id as u64, 0) * 255.0) as u8;
            c.surface = classify_relief(c.elevation, 40, &ReliefThresholds::default());
            c.precipitation = 8.0;
            c.wind = Vec2::new(12.0, 0.0);
            c.soil_moisture = 20.0;
        }
        cells
    }

    #[test]
    fn test_elevation_stays_in_range() {
        let mut cells = rugged(3);
        let config = ErosionConfig { max_removal_fraction: 1.0, thermal_strength: 2.0, ..Default::default() };
        erode(&mut cells, &config, 0.2, 40, &ReliefThresholds::default(), true);
        // u8 storage guarantees the range; relief must match the final elevation.
        for c in &cells {
            assert_eq!(c.surface, classify_relief(c.elevation, 40, &ReliefThresholds::default()));
        }
    }

    #[test]
    fn test_erosion_smooths_relief() {
        let mut cells = rugged(3);
        let spread = |cells: &[Cell]| -> f32 {
            cells
                .iter()
                .map(|c| {
                    c.neighbors
                        .iter()
                        .map(|&j| (c.elevation as f32 - cells[j].elevation as f32).abs())
                        .sum::<f32>()
                })
                .sum()
        };
        let before = spread(&cells);
        let summary = erode(&mut cells, &ErosionConfig::default(), 1.0, 40, &ReliefThresholds::default(), false);
        assert!(summary.removed > 0.0);
        assert!(summary.deposited <= summary.removed);
        assert!(spread(&cells) < before);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut a = rugged(3);
        let mut b = a.clone();
        let config = ErosionConfig::fast();
        erode(&mut a, &config, 1.0, 40, &ReliefThresholds::default(), true);
        erode(&mut b, &config, 1.0, 40, &ReliefThresholds::default(), false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_flat_world_is_unchanged() {
        let mut cells = rugged(2);
        for c in &mut cells {
            c.elevation = 90;
        }
        let before = cells.clone();
        let summary = erode(&mut cells, &ErosionConfig::default(), 1.0, 40, &ReliefThresholds::default(), false);
        assert_eq!(summary.removed, 0.0);
        assert!(cells.iter().zip(&before).all(|(a, b)| a.elevation == b.elevation));
    }

    #[test]
    fn test_low_gravity_erodes_more() {
        let config = ErosionConfig { iterations: 1, hydraulic_rate: 0.0, aeolian_rate: 0.0, ..Default::default() };
        let mut light = rugged(3);
        let mut heavy = light.clone();
        let a = erode(&mut light, &config, 0.3, 40, &ReliefThresholds::default(), false);
        let b = erode(&mut heavy, &config, 3.0, 40, &ReliefThresholds::default(), false);
        assert!(a.removed > b.removed);
    }

    #[test]
    fn test_reclassify_relief_skips_fixed_types() {
        let mut cells = rugged(1);
        cells[0].surface = SurfaceType::Ocean;
        cells[1].surface = SurfaceType::Volcano;
        cells[2].surface = SurfaceType::Plains;
        cells[2].elevation = 250;
        let changed = reclassify_relief(&mut cells, 40, &ReliefThresholds::default());
        assert!(changed >= 1);
        assert_eq!(cells[0].surface, SurfaceType::Ocean);
        assert_eq!(cells[1].surface, SurfaceType::Volcano);
        assert_eq!(cells[2].surface, SurfaceType::Mountains);
    }
}
