//! Approximate effective resistances from the solved sketch.
//!
//! For edge entry `t = (i, j)` the estimate is `R[t] = ‖Z[:,i] − Z[:,j]‖²`,
//! which under the sketch's distance-preservation guarantee approximates
//! `(eᵢ−eⱼ)ᵗL⁺·YᵗY·L⁺(eᵢ−eⱼ)`, twice the true effective resistance because
//! every undirected edge contributes two incidence rows. The uniform factor
//! cancels when the estimates are normalized into sampling probabilities.
//! Entries are independent of each other, so the computation is parallel with
//! no shared mutable state.

use log::debug;
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

/// One approximate resistance per edge entry, in edge-list order.
pub fn approximate_resistances(
    sketch: &DenseMatrix<f64>,
    edges: &[(usize, usize)],
) -> Vec<f64> {
    let (k, _) = sketch.shape();
    let resistances: Vec<f64> = edges
        .par_iter()
        .map(|&(i, j)| {
            let mut acc = 0.0;
            for r in 0..k {
                let d = *sketch.get((r, i)) - *sketch.get((r, j));
                acc += d * d;
            }
            acc
        })
        .collect();

    if !resistances.is_empty() {
        let min = resistances.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = resistances.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let mean = resistances.iter().sum::<f64>() / resistances.len() as f64;
        debug!(
            "approximate resistances over {} entries: min={:.6}, max={:.6}, mean={:.6}",
            resistances.len(),
            min,
            max,
            mean
        );
    }
    resistances
}
