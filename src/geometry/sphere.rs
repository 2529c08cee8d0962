//! Spherical helpers and per-cell local frames.

use glam::{Vec2, Vec3};

use crate::exec::map_cells;
use crate::terrain::Cell;

/// Unit-sphere position for a latitude/longitude pair in degrees (Y is north).
pub fn lat_lon_to_unit(latitude_deg: f32, longitude_deg: f32) -> Vec3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    Vec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

/// Latitude/longitude in degrees for a point on (or near) the unit sphere.
pub fn unit_to_lat_lon(p: Vec3) -> (f32, f32) {
    let p = p.normalize_or_zero();
    let lat = p.y.clamp(-1.0, 1.0).asin();
    let lon = p.z.atan2(p.x);
    (lat.to_degrees(), lon.to_degrees())
}

/// Returns `(east, north)` tangent unit vectors at sphere point `p`.
///
/// Both are tangent to the sphere at `p`. Near the poles a stable fallback is used.
pub fn local_tangent_basis(p: Vec3) -> (Vec3, Vec3) {
    let up = Vec3::Y;
    let mut north = up - p * up.dot(p);
    let nlen = north.length();
    if nlen < 1e-6 {
        let a = if p.x.abs() < 0.9 { Vec3::X } else { Vec3::Z };
        north = (a - p * a.dot(p)).normalize_or_zero();
    } else {
        north /= nlen;
    }
    let east = p.cross(north).normalize_or_zero();
    (east, north)
}

/// Projects a 3D tangent vector at `p` onto local `(east, north)` components.
pub fn to_local(p: Vec3, v: Vec3) -> Vec2 {
    let (east, north) = local_tangent_basis(p);
    Vec2::new(v.dot(east), v.dot(north))
}

/// Precomputed geometry for every cell and each of its neighbors.
///
/// `directions[i][k]` is the unit direction from cell `i` toward its `k`-th
/// neighbor in `i`'s local (east, north) frame; `reverse_slot[i][k]` is the
/// position of `i` inside that neighbor's list, which lets scatter-style
/// transfers be evaluated as gathers.
#[derive(Debug, Clone)]
pub struct CellFrames {
    pub points: Vec<Vec3>,
    pub directions: Vec<Vec<Vec2>>,
    pub distances_km: Vec<Vec<f32>>,
    pub reverse_slot: Vec<Vec<Option<usize>>>,
    /// Mean neighbor spacing over the whole grid (km).
    pub mean_spacing_km: f32,
}

impl CellFrames {
    pub fn new(cells: &[Cell], radius_km: f32, parallel: bool) -> Self {
        let points: Vec<Vec3> =
            cells.iter().map(|c| lat_lon_to_unit(c.latitude, c.longitude)).collect();

        let per_cell: Vec<(Vec<Vec2>, Vec<f32>)> = map_cells(parallel, cells.len(), |i| {
            let p = points[i];
            let (east, north) = local_tangent_basis(p);
            cells[i]
                .neighbors
                .iter()
                .map(|&j| {
                    let q = points[j];
                    let tangent = q - p * p.dot(q);
                    let dir = Vec2::new(tangent.dot(east), tangent.dot(north)).normalize_or_zero();
                    let arc = p.dot(q).clamp(-1.0, 1.0).acos();
                    (dir, (arc * radius_km).max(1e-3))
                })
                .unzip()
        });

        let reverse_slot = map_cells(parallel, cells.len(), |i| {
            cells[i]
                .neighbors
                .iter()
                .map(|&j| cells[j].neighbors.iter().position(|&k| k == i))
                .collect()
        });

        let (directions, distances_km): (Vec<_>, Vec<_>) = per_cell.into_iter().unzip();

        let (sum, count) = distances_km
            .iter()
            .flatten()
            .fold((0.0f64, 0usize), |(s, n), &d| (s + d as f64, n + 1));
        let mean_spacing_km = if count > 0 { (sum / count as f64) as f32 } else { 1.0 };

        Self { points, directions, distances_km, reverse_slot, mean_spacing_km }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
