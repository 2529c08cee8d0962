//! Pass 2: tracing a channel from a source toward water.

use std::collections::HashSet;

use thiserror::Error;

use super::RiverConfig;
use crate::geometry::lat_lon_to_unit;
use crate::noise::{hash, salt};
use crate::terrain::Cell;

/// Read-only view of the terrain a channel is traced over.
#[derive(Debug, Clone, Copy)]
pub struct Terrain<'a> {
    pub cells: &'a [Cell],
    pub distance: &'a [Option<u32>],
    pub passable: &'a [bool],
}

/// Where a traced channel ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEnd {
    /// Drains into this water cell.
    Water(usize),
    /// Joins this already-claimed channel cell.
    Join(usize),
}

impl PathEnd {
    pub fn cell(self) -> usize {
        match self {
            PathEnd::Water(i) | PathEnd::Join(i) => i,
        }
    }
}

/// Channel cells from the source to the last cell before `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedPath {
    pub cells: Vec<usize>,
    pub end: PathEnd,
}

/// Non-fatal tracing failure; the source is retried or abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingFailure {
    #[error("source cell {0} is impassable or cut off from water")]
    Impassable(usize),
    #[error("no admissible step from cell {cell} after {steps} steps")]
    DeadEnd { cell: usize, steps: usize },
}

/// Elevation preference of a step: lower, equal, then mildly higher.
fn step_rank(from: u8, to: u8, tolerance: u8) -> Option<u8> {
    if to < from {
        Some(0)
    } else if to == from {
        Some(1)
    } else if to <= from.saturating_add(tolerance) {
        Some(2)
    } else {
        None
    }
}

struct Tracer<'a> {
    terrain: Terrain<'a>,
    seed: u64,
    attempt: u64,
    tolerance: u8,
    straight_chance: f32,
}

impl Tracer<'_> {
    fn position(&self, i: usize) -> glam::Vec3 {
        let c = &self.terrain.cells[i];
        lat_lon_to_unit(c.latitude, c.longitude)
    }

    /// Best next cell among neighbors whose distance satisfies `admit`.
    fn pick(
        &self,
        current: usize,
        previous: Option<usize>,
        on_path: &HashSet<usize>,
        admit: impl Fn(u32) -> bool,
    ) -> Option<usize> {
        let t = &self.terrain;
        let here = t.cells[current].elevation;
        let ranked: Vec<(u8, u8, usize)> = t.cells[current]
            .neighbors
            .iter()
            .copied()
            .filter(|&j| t.passable[j] && !on_path.contains(&j))
            .filter(|&j| t.distance[j].is_some_and(&admit))
            .filter_map(|j| {
                let e = t.cells[j].elevation;
                step_rank(here, e, self.tolerance).map(|r| (r, e, j))
            })
            .collect();

        let best = ranked.iter().map(|&(r, e, _)| (r, e)).min()?;
        let group: Vec<usize> = ranked.iter().filter(|&&(r, e, _)| (r, e) == best).map(|&(_, _, j)| j).collect();
        if group.len() == 1 {
            return group.first().copied();
        }

        let salt_offset = self.attempt << 8;
        if let Some(prev) = previous {
            if hash(self.seed, current as u64, salt::RIVER_STRAIGHT + salt_offset) < self.straight_chance {
                let origin = self.position(current);
                let heading = origin - self.position(prev);
                return group.iter().copied().max_by(|&a, &b| {
                    let da = (self.position(a) - origin).dot(heading);
                    let db = (self.position(b) - origin).dot(heading);
                    da.total_cmp(&db).then(b.cmp(&a))
                });
            }
        }

        let key = |j: usize| hash(self.seed, ((current as u64) << 32) | j as u64, salt::RIVER_TIE_BREAK + salt_offset);
        group.iter().copied().min_by(|&a, &b| key(a).total_cmp(&key(b)).then(a.cmp(&b)))
    }
}

/// Traces a channel from `start` until it reaches water or a claimed channel.
///
/// Each step goes to a passable neighbor closer to water; when none qualifies
/// the tracer may take up to `max_sideways_steps` consecutive steps at the same
/// distance. Among admissible neighbors lower beats equal beats mildly higher
/// (`uphill_tolerance × (attempt + 1)`); ties are broken by `(seed, cell,
/// attempt)` hashes with an occasional preference for the straightest
/// continuation.
pub fn trace_path(
    terrain: Terrain<'_>,
    claimed: &[bool],
    start: usize,
    seed: u64,
    attempt: u32,
    config: &RiverConfig,
) -> Result<TracedPath, RoutingFailure> {
    let cells = terrain.cells;
    if !terrain.passable[start] || terrain.distance[start].is_none() {
        return Err(RoutingFailure::Impassable(start));
    }

    let tracer = Tracer {
        terrain,
        seed,
        attempt: attempt as u64,
        tolerance: config.uphill_tolerance.saturating_mul(attempt.saturating_add(1).min(255) as u8),
        straight_chance: config.straight_chance,
    };

    let mut path = vec![start];
    let mut on_path = HashSet::from([start]);
    let mut previous = None;
    let mut current = start;
    let mut sideways = 0;

    loop {
        let here = &cells[current];

        let mouth = here.neighbors.iter().copied().filter(|&j| cells[j].is_water()).min_by_key(|&j| (cells[j].elevation, j));
        if let Some(water) = mouth {
            return Ok(TracedPath { cells: path, end: PathEnd::Water(water) });
        }

        let limit = here.elevation.saturating_add(tracer.tolerance);
        let join = here
            .neighbors
            .iter()
            .copied()
            .filter(|&j| claimed[j] && !on_path.contains(&j) && cells[j].elevation <= limit)
            .min_by_key(|&j| (cells[j].elevation, j));
        if let Some(channel) = join {
            return Ok(TracedPath { cells: path, end: PathEnd::Join(channel) });
        }

        let d = terrain.distance[current].unwrap_or(u32::MAX);
        let next = match tracer.pick(current, previous, &on_path, |nd| nd < d) {
            Some(next) => {
                sideways = 0;
                next
            }
            None if sideways < config.max_sideways_steps => {
                match tracer.pick(current, previous, &on_path, |nd| nd == d) {
                    Some(next) => {
                        sideways += 1;
                        next
                    }
                    None => return Err(RoutingFailure::DeadEnd { cell: current, steps: path.len() - 1 }),
                }
            }
            None => return Err(RoutingFailure::DeadEnd { cell: current, steps: path.len() - 1 }),
        };

        previous = Some(current);
        current = next;
        path.push(next);
        on_path.insert(next);
    }
}

#[cfg(test)]
mod tests {
    use super::super::potential::{distance_to_water, passable_mask};
    use super::super::test_support::{plateau, strip};
    use super::*;

    #[test]
    fn test_strip_drains_to_the_sea() {
        let cells = strip(10);
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let claimed = vec![false; cells.len()];
        let path = trace_path(terrain, &claimed, 9, 1, 0, &RiverConfig::default()).unwrap();
        assert_eq!(path.cells, (1..=9).rev().collect::<Vec<_>>());
        assert_eq!(path.end, PathEnd::Water(0));
    }

    #[test]
    fn test_stops_at_claimed_channel() {
        let cells = strip(10);
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let mut claimed = vec![false; cells.len()];
        claimed[4] = true;
        let path = trace_path(terrain, &claimed, 9, 1, 0, &RiverConfig::default()).unwrap();
        assert_eq!(path.cells, vec![9, 8, 7, 6, 5]);
        assert_eq!(path.end, PathEnd::Join(4));
    }

    #[test]
    fn test_pit_is_a_dead_end() {
        let mut cells = strip(6);
        cells[1].elevation = 120;
        cells[2].elevation = 20;
        cells[3].elevation = 130;
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let claimed = vec![false; cells.len()];
        let result = trace_path(terrain, &claimed, 2, 1, 0, &RiverConfig::default());
        assert_eq!(result, Err(RoutingFailure::DeadEnd { cell: 2, steps: 0 }));
    }

    #[test]
    fn test_plateau_tie_breaks_are_deterministic() {
        let cells = plateau(2);
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let claimed = vec![false; cells.len()];
        let start = (0..cells.len()).max_by_key(|&i| (distance[i], i)).unwrap();

        let a = trace_path(terrain, &claimed, start, 77, 0, &RiverConfig::default()).unwrap();
        let b = trace_path(terrain, &claimed, start, 77, 0, &RiverConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.end, PathEnd::Water(0));
        for w in a.cells.windows(2) {
            assert!(distance[w[1]] < distance[w[0]]);
        }
    }

    #[test]
    fn test_plateau_paths_vary_with_seed_but_never_climb_away() {
        let cells = plateau(3);
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let claimed = vec![false; cells.len()];
        let start = (0..cells.len()).max_by_key(|&i| (distance[i], i)).unwrap();

        let mut seen = HashSet::new();
        for seed in 1..=16 {
            let path = trace_path(terrain, &claimed, start, seed, 0, &RiverConfig::default()).unwrap();
            assert_eq!(path.end, PathEnd::Water(0), "seed {}", seed);
            for w in path.cells.windows(2) {
                assert!(distance[w[1]] <= distance[w[0]], "seed {} stepped away from water", seed);
            }
            seen.insert(path.cells);
        }
        assert!(seen.len() >= 2, "every seed chose the same plateau path");
    }

    #[test]
    fn test_impassable_start_is_rejected() {
        let mut cells = strip(4);
        cells[3].temperature_max = -30.0;
        let passable = passable_mask(&cells);
        let distance = distance_to_water(&cells, &passable);
        let terrain = Terrain { cells: &cells, distance: &distance, passable: &passable };
        let claimed = vec![false; cells.len()];
        let result = trace_path(terrain, &claimed, 3, 1, 0, &RiverConfig::default());
        assert_eq!(result, Err(RoutingFailure::Impassable(3)));
    }
}
