//! Erosion solver.
//!
//! Reshapes elevation with iterative thermal, hydraulic and aeolian transfer
//! toward each cell's lowest neighbor, then keeps relief classes consistent
//! with the new elevations.

mod config;
mod solver;

pub use config::ErosionConfig;
pub use solver::{erode, reclassify_relief, ErosionSummary};
