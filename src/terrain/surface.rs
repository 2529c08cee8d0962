//! Base surface classification.

use std::cmp::Ordering;

use super::{Cell, PlanetConfiguration, ReliefThresholds, SurfaceType};

/// Counts produced by [`classify_base_surface`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSummary {
    pub ocean: usize,
    pub ice: usize,
    pub lava: usize,
    pub land: usize,
}

/// Returns the elevation at or below which `fraction` of the cells lie.
///
/// `None` when the fraction rounds to zero cells (a dry planet).
pub fn sea_level_for_fraction(cells: &[Cell], fraction: f32) -> Option<u8> {
    let n = cells.len();
    let k = (fraction.clamp(0.0, 1.0) * n as f32).round() as usize;
    if k == 0 {
        return None;
    }
    let mut elevations: Vec<u8> = cells.iter().map(|c| c.elevation).collect();
    elevations.sort_unstable();
    Some(elevations[k.min(n) - 1])
}

/// Relief class of a land cell purely from its height above `base`.
pub fn classify_relief(elevation: u8, base: u8, thresholds: &ReliefThresholds) -> SurfaceType {
    let h = elevation.saturating_sub(base);
    if h >= thresholds.mountains {
        SurfaceType::Mountains
    } else if h >= thresholds.hills {
        SurfaceType::Hills
    } else {
        SurfaceType::Plains
    }
}

/// Assigns every cell a surface type from elevation, sea level, and the planet.
///
/// Submerged cells become `Ocean` (or `Lava` on molten planets); the
/// `ice_fraction` of ocean cells nearest the poles freeze to `Ice` (all of them
/// on frozen planets). Land is split into plains/hills/mountains, with volcanic
/// land marked `Volcano`.
pub fn classify_base_surface(
    cells: &mut [Cell],
    planet: &PlanetConfiguration,
    sea_level: Option<u8>,
    relief_base: u8,
    thresholds: &ReliefThresholds,
) -> SurfaceSummary {
    let mut summary = SurfaceSummary::default();
    let mut ocean_ids = Vec::new();

    for cell in cells.iter_mut() {
        let submerged = sea_level.is_some_and(|s| cell.elevation <= s);
        cell.surface = if submerged {
            if planet.is_molten() {
                summary.lava += 1;
                SurfaceType::Lava
            } else {
                ocean_ids.push(cell.id);
                SurfaceType::Ocean
            }
        } else {
            summary.land += 1;
            if cell.volcanic {
                SurfaceType::Volcano
            } else {
                classify_relief(cell.elevation, relief_base, thresholds)
            }
        };
    }

    let ice_fraction = if planet.is_frozen() { 1.0 } else { planet.ice_fraction.clamp(0.0, 1.0) };
    let frozen = (ice_fraction * ocean_ids.len() as f32).round() as usize;
    if frozen > 0 {
        ocean_ids.sort_by(|&a, &b| {
            let la = cells[a].latitude.abs();
            let lb = cells[b].latitude.abs();
            lb.partial_cmp(&la).unwrap_or(Ordering::Equal).then(a.cmp(&b))
        });
        for &id in ocean_ids.iter().take(frozen) {
            cells[id].surface = SurfaceType::Ice;
        }
    }
    summary.ice = frozen;
    summary.ocean = ocean_ids.len() - frozen;

    summary
}
