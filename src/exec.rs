//! Sequential/parallel execution of per-cell maps.
//!
//! Every solver iteration is a pure map from an immutable snapshot to a fresh
//! output buffer, so the two modes produce bit-identical results. The mode is
//! chosen per run by `GenerationSettings::parallel`.

use rayon::prelude::*;

/// Collects `f(i)` for `i in 0..n`, in index order.
pub fn map_cells<T, F>(parallel: bool, n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

/// Writes `f(i)` into `out[i]` for every slot of a preallocated buffer.
pub fn fill_cells<T, F>(parallel: bool, out: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        out.par_iter_mut().enumerate().for_each(|(i, slot)| *slot = f(i));
    } else {
        out.iter_mut().enumerate().for_each(|(i, slot)| *slot = f(i));
    }
}
