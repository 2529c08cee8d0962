//! Elevation from plates: uplift, boundary relief and volcanism.
//!
//! All heights are divided by surface gravity: weaker gravity supports taller
//! relief. Results are clamped to the 0..=255 elevation range and to the
//! gravity-scaled cap.

use tracing::debug;

use super::{BoundaryType, TectonicConfig};
use crate::exec::map_cells;
use crate::noise::{hash, hash_signed, salt};
use crate::terrain::Cell;

fn to_elevation(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Sets elevation from crust type plus stress uplift.
///
/// `base + jitter + uplift_scale * stress / gravity`, where base depends on
/// whether the cell's plate is continental.
pub fn apply_uplift(cells: &mut [Cell], config: &TectonicConfig, gravity: f32, seed: u64, parallel: bool) {
    let g = gravity.max(0.1);
    let elevations = map_cells(parallel, cells.len(), |i| {
        let cell = &cells[i];
        let base = if cell.continental { config.continental_base } else { config.oceanic_base };
        let jitter = hash_signed(seed, i as u64, salt::ELEVATION_JITTER) * config.elevation_jitter;
        to_elevation(base + jitter + config.uplift_scale * cell.stress / g)
    });
    for (cell, e) in cells.iter_mut().zip(elevations) {
        cell.elevation = e;
    }
}

/// Raises mountains and hills along plate boundaries. Returns the number of
/// cells that received mountain relief.
pub fn place_mountains(cells: &mut [Cell], config: &TectonicConfig, gravity: f32) -> usize {
    let g = gravity.max(0.1);
    let cap = config.cap_for_gravity(gravity);
    let mut mountains = 0;

    for cell in cells.iter_mut() {
        let Some(kind) = cell.boundary else { continue };
        let height = match kind {
            BoundaryType::Convergent if cell.stress >= config.mountain_stress => {
                mountains += 1;
                config.mountain_height
            }
            BoundaryType::Convergent if cell.stress >= config.hill_stress => config.hill_height,
            BoundaryType::Divergent | BoundaryType::Transform if cell.stress >= config.hill_stress => {
                config.hill_height * 0.5
            }
            _ => continue,
        };
        let current = cell.elevation as f32;
        let raised = (current + height / g).min(cap).max(current);
        cell.elevation = to_elevation(raised);
    }

    debug!(mountains, "boundary relief placed");
    mountains
}

/// Marks volcanic cells and builds their cones. Returns the number of
/// volcanic cells.
///
/// Boundary cells erupt with probability `volcanism * stress`, weighted by
/// boundary type; any cell may host a hotspot at `hotspot_rate * volcanism`.
pub fn apply_volcanism(cells: &mut [Cell], config: &TectonicConfig, gravity: f32, seed: u64) -> usize {
    let g = gravity.max(0.1);
    let cap = config.cap_for_gravity(gravity);
    let intensity = config.volcanism.clamp(0.0, 1.0);
    let hotspot = config.hotspot_rate * intensity;
    let mut volcanic = 0;

    for cell in cells.iter_mut() {
        let affinity = match cell.boundary {
            Some(BoundaryType::Convergent) => 1.0,
            Some(BoundaryType::Divergent) => 0.6,
            Some(BoundaryType::Transform) => 0.1,
            None => 0.0,
        };
        let chance = affinity * intensity * cell.stress.min(1.0);
        let id = cell.id as u64;
        if hash(seed, id, salt::VOLCANISM) < chance || hash(seed, id, salt::HOTSPOT) < hotspot {
            cell.volcanic = true;
            let current = cell.elevation as f32;
            cell.elevation = to_elevation((current + config.volcano_height / g).min(cap).max(current));
            volcanic += 1;
        }
    }

    debug!(volcanic, "volcanism applied");
    volcanic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(stress: f32, boundary: Option<BoundaryType>) -> Vec<Cell> {
        (0..200)
            .map(|i| {
                let mut c = Cell::new(i, 0.0, i as f32);
                c.stress = stress;
                c.boundary = boundary;
                c.continental = i % 2 == 0;
                c
            })
            .collect()
    }

    #[test]
    fn test_uplift_scales_inversely_with_gravity() {
        let config = TectonicConfig { elevation_jitter: 0.0, ..Default::default() };
        let mut light = cells(1.0, None);
        let mut heavy = light.clone();
        apply_uplift(&mut light, &config, 0.5, 1, false);
        apply_uplift(&mut heavy, &config, 2.0, 1, false);
        assert!(light[0].elevation > heavy[0].elevation);
        // continental base exceeds oceanic base
        assert!(heavy[0].elevation > heavy[1].elevation);
    }

    #[test]
    fn test_uplift_parallel_matches_sequential() {
        let config = TectonicConfig::default();
        let mut a = cells(0.7, None);
        let mut b = a.clone();
        apply_uplift(&mut a, &config, 1.0, 9, true);
        apply_uplift(&mut b, &config, 1.0, 9, false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mountains_respect_gravity_cap() {
        let config = TectonicConfig::default();
        let mut cells = cells(1.0, Some(BoundaryType::Convergent));
        for c in &mut cells {
            c.elevation = 200;
        }
        let raised = place_mountains(&mut cells, &config, 1.5);
        assert_eq!(raised, cells.len());
        let cap = config.cap_for_gravity(1.5);
        assert!(cells.iter().all(|c| c.elevation as f32 <= cap.max(200.0)));
    }

    #[test]
    fn test_mountains_only_at_boundaries() {
        let config = TectonicConfig::default();
        let mut cells = cells(1.0, None);
        let before: Vec<u8> = cells.iter().map(|c| c.elevation).collect();
        assert_eq!(place_mountains(&mut cells, &config, 1.0), 0);
        let after: Vec<u8> = cells.iter().map(|c| c.elevation).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_volcanism_follows_intensity() {
        let quiet = TectonicConfig { volcanism: 0.0, ..Default::default() };
        let mut a = cells(1.0, Some(BoundaryType::Convergent));
        assert_eq!(apply_volcanism(&mut a, &quiet, 1.0, 3), 0);
        assert!(a.iter().all(|c| !c.volcanic));

        let loud = TectonicConfig { volcanism: 1.0, ..Default::default() };
        let mut b = cells(1.0, Some(BoundaryType::Convergent));
        let n = apply_volcanism(&mut b, &loud, 1.0, 3);
        assert_eq!(n, b.len(), "every maximally stressed convergent cell erupts");
    }
}
