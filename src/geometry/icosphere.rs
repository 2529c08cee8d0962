//! Geodesic grid generator.
//!
//! Produces the cell coordinates an external tile-set loader would supply:
//! a subdivided icosahedron with `10 * 4^level + 2` vertices. The first 12
//! vertices are the icosahedron corners, which keeps them at ids `0..12`,
//! the distinguished cells of degree 5.

use std::collections::HashMap;

use glam::DVec3;

use super::sphere::unit_to_lat_lon;
use crate::terrain::Cell;

const FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_vertices() -> Vec<DVec3> {
    let phi = (1.0 + 5.0_f64.sqrt()) * 0.5;
    [
        DVec3::new(-1.0, phi, 0.0),
        DVec3::new(1.0, phi, 0.0),
        DVec3::new(-1.0, -phi, 0.0),
        DVec3::new(1.0, -phi, 0.0),
        DVec3::new(0.0, -1.0, phi),
        DVec3::new(0.0, 1.0, phi),
        DVec3::new(0.0, -1.0, -phi),
        DVec3::new(0.0, 1.0, -phi),
        DVec3::new(phi, 0.0, -1.0),
        DVec3::new(phi, 0.0, 1.0),
        DVec3::new(-phi, 0.0, -1.0),
        DVec3::new(-phi, 0.0, 1.0),
    ]
    .into_iter()
    .map(DVec3::normalize)
    .collect()
}

/// Number of cells produced at a subdivision level.
pub fn icosphere_cell_count(level: u32) -> usize {
    10 * 4usize.pow(level) + 2
}

/// Unit-sphere vertex positions of a subdivided icosahedron.
pub fn icosphere_points(level: u32) -> Vec<DVec3> {
    let mut points = icosahedron_vertices();
    let mut faces: Vec<[usize; 3]> = FACES.to_vec();

    for _ in 0..level {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut next = Vec::with_capacity(faces.len() * 4);
        let mut midpoint = |a: usize, b: usize, points: &mut Vec<DVec3>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                points.push((points[a] + points[b]).normalize());
                points.len() - 1
            })
        };
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut points);
            let bc = midpoint(b, c, &mut points);
            let ca = midpoint(c, a, &mut points);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    points
}

/// Blank cells (coordinates only) on a geodesic grid.
///
/// Neighbor lists are left empty; `build_topology` fills them.
pub fn icosphere(level: u32) -> Vec<Cell> {
    icosphere_points(level)
        .into_iter()
        .enumerate()
        .map(|(id, p)| {
            let (lat, lon) = unit_to_lat_lon(p.as_vec3());
            Cell::new(id, lat, lon)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_counts() {
        for level in 0..4 {
            assert_eq!(icosphere(level).len(), icosphere_cell_count(level));
        }
        assert_eq!(icosphere_cell_count(2), 162);
    }

    #[test]
    fn test_points_on_unit_sphere() {
        for p in icosphere_points(2) {
            assert!((p.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_corners_keep_first_ids() {
        let base = icosahedron_vertices();
        let fine = icosphere_points(3);
        for (a, b) in base.iter().zip(&fine) {
            assert_eq!(a, b);
        }
    }
}
