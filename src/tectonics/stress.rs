//! Boundary stress from relative plate drift.

use tracing::debug;

use super::{classify_boundary, BoundaryType, Plate, TectonicConfig};
use crate::exec::{fill_cells, map_cells};
use crate::geometry::CellFrames;
use crate::terrain::Cell;

/// Computes per-cell stress and boundary type.
///
/// Cells touching another plate take the strongest interaction over their
/// cross-plate edges: collisions weigh most, divergence less, shear least.
/// Stress then spreads `stress_spread` rings inward with `stress_falloff`
/// decay per ring; the boundary tag stays on the edge cells. Returns the
/// number of boundary cells.
pub fn compute_stress(
    cells: &mut [Cell],
    plates: &[Plate],
    frames: &CellFrames,
    config: &TectonicConfig,
    parallel: bool,
) -> usize {
    let norm = 1.0 / (2.0 * config.drift_scale).max(1e-6);

    let edge: Vec<(f32, Option<BoundaryType>)> = map_cells(parallel, cells.len(), |i| {
        let cell = &cells[i];
        let Some(p) = cell.plate_id else {
            return (0.0, None);
        };
        let mut best: (f32, Option<BoundaryType>) = (0.0, None);
        for (k, &j) in cell.neighbors.iter().enumerate() {
            let Some(q) = cells[j].plate_id else { continue };
            if q == p {
                continue;
            }
            let motion = classify_boundary(plates[p].drift, plates[q].drift, frames.directions[i][k]);
            let weight = match motion.kind {
                BoundaryType::Convergent => config.collision_stress,
                BoundaryType::Divergent => config.divergence_stress,
                BoundaryType::Transform => config.shear_stress,
            };
            let stress = weight * motion.speed() * norm;
            if best.1.is_none() || stress > best.0 {
                best = (stress, Some(motion.kind));
            }
        }
        best
    });

    let mut current: Vec<f32> = edge.iter().map(|e| e.0).collect();
    let mut next = current.clone();
    for _ in 0..config.stress_spread {
        fill_cells(parallel, &mut next, |i| {
            let inherited = cells[i]
                .neighbors
                .iter()
                .map(|&j| current[j])
                .fold(0.0f32, f32::max);
            current[i].max(inherited * config.stress_falloff)
        });
        std::mem::swap(&mut current, &mut next);
    }

    let mut boundary_cells = 0;
    for ((cell, stress), (_, kind)) in cells.iter_mut().zip(current).zip(edge) {
        cell.stress = stress;
        cell.boundary = kind;
        if kind.is_some() {
            boundary_cells += 1;
        }
    }
    debug!(boundary_cells, "plate stress computed");
    boundary_cells
}
