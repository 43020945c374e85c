//! Johnson–Lindenstrauss sign sketch sized by the target spectral tolerance.
//!
//! The sketch is a dense `k×e` matrix with independent fair `±1/√k` entries,
//! where `k = ⌈ln(n/ε²)⌉`. Multiplying it against the weighted incidence
//! preserves pairwise squared distances of the incidence columns within
//! `(1 ± ε)` with high probability while using only `O(log n / ε²)` rows
//! instead of one per edge entry. The matrix is regenerated fresh for every
//! sparsification call from the pipeline's seeded random stream.

use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{SparsifyError, SparsifyResult};

/// Sketch dimension `k = ⌈ln(n/ε²)⌉`, clipped to be at least 1.
///
/// Smaller `ε` yields a larger (or equal) sketch; callers must additionally
/// keep `k ≤ e`, otherwise the reduction is pointless.
pub fn sketch_dimension(nnodes: usize, epsilon: f64) -> usize {
    let k = ((nnodes as f64) / (epsilon * epsilon)).ln().ceil();
    let k = if k.is_finite() && k >= 1.0 { k as usize } else { 1 };
    debug!("sketch dimension for n={}, epsilon={}: {}", nnodes, epsilon, k);
    k
}

/// Draws a fresh `k×e` sign-sketch matrix with entries `±1/√k`.
pub fn sample_projection(
    k: usize,
    nentries: usize,
    rng: &mut ChaCha8Rng,
) -> SparsifyResult<DenseMatrix<f64>> {
    let scale = 1.0 / (k as f64).sqrt();
    let rows: Vec<Vec<f64>> = (0..k)
        .map(|_| {
            (0..nentries)
                .map(|_| if rng.random::<bool>() { scale } else { -scale })
                .collect()
        })
        .collect();
    debug!("sampled {}x{} sign sketch (scale {:.6})", k, nentries, scale);
    dense_from_rows(rows)
}

/// Assembles a row-major `Vec<Vec<f64>>` into a `DenseMatrix`.
pub(crate) fn dense_from_rows(rows: Vec<Vec<f64>>) -> SparsifyResult<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(&rows)
        .map_err(|err| SparsifyError::Numerical(format!("dense matrix assembly failed: {}", err)))
}
