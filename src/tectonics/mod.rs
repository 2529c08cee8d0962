//! Tectonic relief stages.
//!
//! Assigns plates by flood fill, derives boundary stress from relative drift,
//! and turns stress into elevation: uplift, boundary mountains and volcanism.

mod config;
mod plate;
mod relief;
mod stress;
pub mod boundary;

pub use boundary::{classify_boundary, BoundaryMotion, BoundaryType};
pub use config::TectonicConfig;
pub use plate::{assign_plates, Plate};
pub use relief::{apply_uplift, apply_volcanism, place_mountains};
pub use stress::compute_stress;
