//! Plate assignment by seeded flood fill.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TectonicConfig;
use crate::noise::{hash, salt};
use crate::terrain::Cell;

/// A rigid drifting region of the surface.
///
/// Created once by `assign_plates` and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub id: usize,
    pub continental: bool,
    /// Drift in local (east, north) components.
    pub drift: Vec2,
    /// Cell the flood fill started from.
    pub seed_cell: usize,
    pub cell_count: usize,
}

/// Frontier entry ordered by lowest cost first, then lowest cell id.
#[derive(Debug, PartialEq)]
struct Frontier {
    cost: f32,
    cell: usize,
    plate: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.cell.cmp(&self.cell))
            .then_with(|| other.plate.cmp(&self.plate))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Assigns every cell to one of `plate_count` plates and returns the plates.
///
/// Seeds are drawn with a ChaCha8 stream keyed by `seed`; growth is a
/// priority flood fill whose step cost is jittered by the hash. Cells the
/// fill cannot reach (disconnected input) are repaired from assigned
/// neighbors, and any still left over are given a hashed plate, so every cell
/// ends with a valid plate id. The largest plates become continental until
/// `continental_fraction` of the cells is covered.
pub fn assign_plates(
    cells: &mut [Cell],
    plate_count: usize,
    seed: u64,
    config: &TectonicConfig,
) -> Vec<Plate> {
    let n = cells.len();
    if n == 0 {
        return Vec::new();
    }
    let count = plate_count.clamp(1, n);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let seeds = sample(&mut rng, n, count).into_vec();

    let mut plates: Vec<Plate> = seeds
        .iter()
        .enumerate()
        .map(|(id, &seed_cell)| {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let jitter = 1.0 - config.drift_randomness + config.drift_randomness * rng.random::<f32>();
            Plate {
                id,
                continental: false,
                drift: Vec2::from_angle(angle) * config.drift_scale * jitter,
                seed_cell,
                cell_count: 0,
            }
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();
    for plate in &plates {
        heap.push(Frontier { cost: 0.0, cell: plate.seed_cell, plate: plate.id });
    }
    while let Some(Frontier { cost, cell, plate }) = heap.pop() {
        if owner[cell].is_some() {
            continue;
        }
        owner[cell] = Some(plate);
        for &nb in &cells[cell].neighbors {
            if owner[nb].is_none() {
                let step = 1.0 + config.growth_noise * hash(seed, nb as u64, salt::PLATE_GROWTH);
                heap.push(Frontier { cost: cost + step, cell: nb, plate });
            }
        }
    }

    let orphans = owner.iter().filter(|o| o.is_none()).count();
    if orphans > 0 {
        debug!(orphans, "repairing unassigned cells");
        loop {
            let mut changed = false;
            for i in 0..n {
                if owner[i].is_none() {
                    if let Some(p) = cells[i].neighbors.iter().find_map(|&nb| owner[nb]) {
                        owner[i] = Some(p);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        for (i, slot) in owner.iter_mut().enumerate() {
            if slot.is_none() {
                let pick = (hash(seed, i as u64, salt::PLATE_GROWTH) * count as f32) as usize;
                *slot = Some(pick.min(count - 1));
            }
        }
    }

    for (cell, slot) in cells.iter_mut().zip(&owner) {
        let p = slot.unwrap_or(0);
        cell.plate_id = Some(p);
        plates[p].cell_count += 1;
    }

    let mut by_size: Vec<usize> = (0..count).collect();
    by_size.sort_by(|&a, &b| plates[b].cell_count.cmp(&plates[a].cell_count).then(a.cmp(&b)));
    let target = (config.continental_fraction.clamp(0.0, 1.0) * n as f32).round() as usize;
    let mut covered = 0;
    for p in by_size {
        if covered >= target {
            break;
        }
        plates[p].continental = true;
        covered += plates[p].cell_count;
    }

    for cell in cells.iter_mut() {
        cell.continental = cell.plate_id.is_some_and(|p| plates[p].continental);
    }

    plates
}
