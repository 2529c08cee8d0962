//! Deterministic noise for the simulation.
//!
//! Every pseudorandom quantity in the solvers (jitter, turbulence, tie-breaks,
//! volcanism rolls) comes from [`hash`], a pure function of `(seed, id, salt)`.
//! There is no shared random state, so results do not depend on execution order.

mod hash;

pub use hash::{hash, hash_signed, hash_u64, salt};
