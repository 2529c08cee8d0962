//! Exact-degree neighbor graph construction.
//!
//! Cells `0..PENTAGON_COUNT` get five neighbors, every other cell six. The
//! graph is built once from coordinates: k-nearest selection by squared chord
//! distance, symmetrization, then a bounded repair loop. Malformed coordinates
//! are reported as a `TopologyError`; nothing is silently patched.

use glam::DVec3;
use thiserror::Error;
use tracing::debug;

use crate::exec::map_cells;
use crate::terrain::Cell;

/// Number of distinguished degree-5 cells.
pub const PENTAGON_COUNT: usize = 12;

/// Nearest cells kept per cell as repair candidates.
const CANDIDATES: usize = 12;
const MAX_REPAIR_ROUNDS: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("cell at index {index} carries id {id}")]
    IdMismatch { index: usize, id: usize },

    #[error("cell {0} has non-finite coordinates")]
    InvalidCoordinates(usize),

    #[error("cell {cell} reached degree {found}, expected {required}")]
    DegreeUnsatisfied { cell: usize, found: usize, required: usize },

    #[error("neighbor relation is not symmetric between cells {0} and {1}")]
    Asymmetric(usize, usize),
}

/// Degree a cell must end up with.
pub fn required_degree(id: usize) -> usize {
    if id < PENTAGON_COUNT {
        5
    } else {
        6
    }
}

fn to_unit(cell: &Cell) -> DVec3 {
    let lat = (cell.latitude as f64).to_radians();
    let lon = (cell.longitude as f64).to_radians();
    DVec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

/// Uniform bucket grid over `[-1, 1]^3` for nearest-cell queries.
struct BucketGrid {
    size: usize,
    buckets: Vec<Vec<usize>>,
}

impl BucketGrid {
    fn new(points: &[DVec3]) -> Self {
        let size = ((points.len() as f64 / 8.0).sqrt().ceil() as usize).max(1);
        let mut buckets = vec![Vec::new(); size * size * size];
        for (i, p) in points.iter().enumerate() {
            let [x, y, z] = Self::coord(size, *p);
            buckets[(z * size + y) * size + x].push(i);
        }
        Self { size, buckets }
    }

    fn coord(size: usize, p: DVec3) -> [usize; 3] {
        let f = |v: f64| (((v + 1.0) * 0.5 * size as f64) as usize).min(size - 1);
        [f(p.x), f(p.y), f(p.z)]
    }

    fn cell_width(&self) -> f64 {
        2.0 / self.size as f64
    }

    /// Ids of the `k` nearest points to `points[i]`, nearest first; ties by id.
    fn nearest(&self, points: &[DVec3], i: usize, k: usize) -> Vec<usize> {
        if k == 0 {
            return Vec::new();
        }
        let p = points[i];
        let [cx, cy, cz] = Self::coord(self.size, p);
        let size = self.size as isize;
        let mut found: Vec<(f64, usize)> = Vec::new();

        for ring in 0..=size {
            for dz in -ring..=ring {
                for dy in -ring..=ring {
                    for dx in -ring..=ring {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != ring {
                            continue;
                        }
                        let (x, y, z) = (cx as isize + dx, cy as isize + dy, cz as isize + dz);
                        if x < 0 || y < 0 || z < 0 || x >= size || y >= size || z >= size {
                            continue;
                        }
                        let bucket = &self.buckets[((z * size + y) * size + x) as usize];
                        for &j in bucket {
                            if j != i {
                                found.push((p.distance_squared(points[j]), j));
                            }
                        }
                    }
                }
            }

            if found.len() >= k {
                found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                // Every unvisited point is at least `ring` bucket widths away.
                let reach = ring as f64 * self.cell_width();
                if found[k - 1].0 <= reach * reach {
                    break;
                }
            }
        }

        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.truncate(k);
        found.into_iter().map(|(_, j)| j).collect()
    }
}

struct Repair<'a> {
    points: &'a [DVec3],
    adjacency: Vec<Vec<usize>>,
    evictions: usize,
    additions: usize,
}

impl Repair<'_> {
    fn dist(&self, a: usize, b: usize) -> f64 {
        self.points[a].distance_squared(self.points[b])
    }

    fn link(&mut self, a: usize, b: usize) {
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.additions += 1;
    }

    fn unlink(&mut self, a: usize, b: usize) {
        self.adjacency[a].retain(|&x| x != b);
        self.adjacency[b].retain(|&x| x != a);
        self.evictions += 1;
    }

    fn farthest(&self, i: usize) -> Option<usize> {
        self.adjacency[i].iter().copied().max_by(|&a, &b| {
            self.dist(i, a).total_cmp(&self.dist(i, b)).then(a.cmp(&b))
        })
    }

    fn symmetrize(&mut self) {
        for i in 0..self.adjacency.len() {
            for k in 0..self.adjacency[i].len() {
                let j = self.adjacency[i][k];
                if !self.adjacency[j].contains(&i) {
                    self.adjacency[j].push(i);
                }
            }
        }
    }

    fn evict_overfull(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.adjacency.len() {
            while self.adjacency[i].len() > required_degree(i) {
                let Some(far) = self.farthest(i) else { break };
                self.unlink(i, far);
                changed = true;
            }
        }
        changed
    }

    fn fill_underfull(&mut self, candidates: &[Vec<usize>]) -> bool {
        let mut changed = false;
        for i in 0..self.adjacency.len() {
            for &c in &candidates[i] {
                if self.adjacency[i].len() >= required_degree(i) {
                    break;
                }
                if !self.adjacency[i].contains(&c) && self.adjacency[c].len() < required_degree(c) {
                    self.link(i, c);
                    changed = true;
                }
            }
            if self.adjacency[i].len() >= required_degree(i) {
                continue;
            }
            // No candidate has room: take one whose farthest link is longer than
            // ours, leaving it over-full for the next eviction pass.
            let steal = candidates[i].iter().copied().find(|&c| {
                !self.adjacency[i].contains(&c)
                    && self.farthest(c).is_some_and(|f| self.dist(i, c) < self.dist(c, f))
            });
            if let Some(c) = steal {
                self.link(i, c);
                changed = true;
            }
        }
        changed
    }
}

/// Fills every cell's neighbor list with exactly `required_degree(id)` ids.
///
/// The result is symmetric and sorted by id. Fails if the coordinates do not
/// admit such a graph.
pub fn build_topology(cells: &mut [Cell], parallel: bool) -> Result<(), TopologyError> {
    for (index, cell) in cells.iter().enumerate() {
        if cell.id != index {
            return Err(TopologyError::IdMismatch { index, id: cell.id });
        }
        if !cell.latitude.is_finite() || !cell.longitude.is_finite() {
            return Err(TopologyError::InvalidCoordinates(index));
        }
    }

    let n = cells.len();
    let points: Vec<DVec3> = cells.iter().map(to_unit).collect();
    let grid = BucketGrid::new(&points);
    let k = CANDIDATES.min(n.saturating_sub(1));
    let candidates = map_cells(parallel, n, |i| grid.nearest(&points, i, k));

    let mut repair = Repair {
        points: &points,
        adjacency: candidates
            .iter()
            .enumerate()
            .map(|(i, c)| c.iter().take(required_degree(i)).copied().collect())
            .collect(),
        evictions: 0,
        additions: 0,
    };
    repair.symmetrize();

    let mut rounds = 0;
    while rounds < MAX_REPAIR_ROUNDS {
        rounds += 1;
        let evicted = repair.evict_overfull();
        let filled = repair.fill_underfull(&candidates);
        if !evicted && !filled {
            break;
        }
    }

    for (i, list) in repair.adjacency.iter().enumerate() {
        let required = required_degree(i);
        if list.len() != required {
            return Err(TopologyError::DegreeUnsatisfied { cell: i, found: list.len(), required });
        }
        if let Some(&j) = list.iter().find(|&&j| !repair.adjacency[j].contains(&i)) {
            return Err(TopologyError::Asymmetric(i, j));
        }
    }

    debug!(
        cells = n,
        rounds,
        evictions = repair.evictions,
        additions = repair.additions,
        "topology built"
    );

    for (cell, mut list) in cells.iter_mut().zip(repair.adjacency) {
        list.sort_unstable();
        cell.neighbors = list;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::icosphere;

    fn assert_exact_degree(cells: &[Cell]) {
        for c in cells {
            assert_eq!(c.degree(), required_degree(c.id), "cell {}", c.id);
            for &n in &c.neighbors {
                assert_ne!(n, c.id);
                assert!(cells[n].neighbors.contains(&c.id), "{} -> {} not symmetric", c.id, n);
            }
        }
    }

    #[test]
    fn test_icosahedron_degree() {
        let mut cells = icosphere(0);
        build_topology(&mut cells, false).unwrap();
        assert_exact_degree(&cells);
    }

    #[test]
    fn test_subdivided_degree_and_symmetry() {
        for level in 1..=3 {
            let mut cells = icosphere(level);
            build_topology(&mut cells, true).unwrap();
            assert_exact_degree(&cells);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut a = icosphere(3);
        let mut b = a.clone();
        build_topology(&mut a, true).unwrap();
        build_topology(&mut b, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_cells_is_structural_error() {
        let mut cells: Vec<Cell> = (0..4).map(|i| Cell::new(i, 0.0, i as f32 * 90.0)).collect();
        let err = build_topology(&mut cells, false).unwrap_err();
        assert!(matches!(err, TopologyError::DegreeUnsatisfied { .. }));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut cells = icosphere(0);
        cells[3].latitude = f32::NAN;
        assert_eq!(build_topology(&mut cells, false), Err(TopologyError::InvalidCoordinates(3)));

        let mut cells = icosphere(0);
        cells.swap(1, 2);
        assert!(matches!(
            build_topology(&mut cells, false),
            Err(TopologyError::IdMismatch { index: 1, id: 2 })
        ));
    }

    #[test]
    fn test_required_degree() {
        assert_eq!(required_degree(0), 5);
        assert_eq!(required_degree(PENTAGON_COUNT - 1), 5);
        assert_eq!(required_degree(PENTAGON_COUNT), 6);
    }
}
