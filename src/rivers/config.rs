//! River network configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the river network builder.
///
/// Heights and drops are in elevation units; discharge ratios are relative to
/// the mean source contribution of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverConfig {
    /// Fraction of candidate cells, by discharge potential, that become sources.
    pub source_fraction: f32,
    /// Minimum source height above the relief base.
    pub min_source_height: u8,

    /// Extra tracing attempts before a source is abandoned. Each retry uses a
    /// fresh tie-break stream and a wider uphill tolerance.
    pub retries: u32,
    /// How far a step may climb on the first attempt.
    pub uphill_tolerance: u8,
    /// Consecutive steps allowed that do not get closer to water.
    pub max_sideways_steps: u32,
    /// Chance that a tie is broken toward the straightest continuation.
    pub straight_chance: f32,

    /// Bound on the soil exchange, as a fraction of the smaller of inflow and
    /// local contribution (loss) or of the local runoff (gain).
    pub soil_exchange: f32,

    /// Mouth cells at least this many times the mean source flow are deltas.
    pub delta_ratio: f32,
    /// Drop to the downstream cell that makes a waterfall.
    pub waterfall_drop: u8,
    /// Incision below the neighbor mean that makes a canyon.
    pub canyon_depth: f32,
    /// Incision below the neighbor mean that makes a valley.
    pub valley_depth: f32,

    /// Swamps form on plains no higher than this above the relief base.
    pub swamp_max_height: u8,
    /// Minimum soil moisture (%) of a swamp.
    pub swamp_min_soil: f32,
    /// Cells within this many steps of a river never become swamp.
    pub swamp_river_distance: u32,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            source_fraction: 0.2,
            min_source_height: 8,
            retries: 3,
            uphill_tolerance: 2,
            max_sideways_steps: 4,
            straight_chance: 0.35,
            soil_exchange: 0.1,
            delta_ratio: 16.0,
            waterfall_drop: 25,
            canyon_depth: 30.0,
            valley_depth: 12.0,
            swamp_max_height: 6,
            swamp_min_soil: 75.0,
            swamp_river_distance: 2,
        }
    }
}

impl RiverConfig {
    /// Discharge tier multipliers (small → medium → large → very large).
    pub const TIERS: [f32; 3] = [4.0, 16.0, 64.0];
}
