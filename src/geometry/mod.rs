//! Spherical grid geometry.
//!
//! Generates geodesic cell coordinates, builds the exact-degree neighbor graph,
//! and precomputes the per-neighbor local frames the solvers read.

mod icosphere;
mod sphere;
mod topology;

pub use icosphere::{icosphere, icosphere_cell_count, icosphere_points};
pub use sphere::{lat_lon_to_unit, local_tangent_basis, to_local, unit_to_lat_lon, CellFrames};
pub use topology::{build_topology, required_degree, TopologyError, PENTAGON_COUNT};
