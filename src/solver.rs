//! Iterative least-squares solve of `Z·L = Q·Y` by gradient descent.
//!
//! The sketch `Z ≈ Q·Y·L⁺` is the only quantity the resistance estimates
//! need, and it is obtained without ever forming the pseudoinverse: plain
//! gradient descent on the squared-Frobenius loss `‖Q·Y − Z·L‖²`. Because
//! `L` is symmetric the update decomposes row by row,
//!
//! ```ignore
//! ρ_r = (QY)_r − z_r·L
//! z_r ← z_r + η · ρ_r·L
//! ```
//!
//! so every iteration is row-parallel with no cross-row dependency; only the
//! floating-point summation order of the loss differs between thread counts.
//!
//! Early stopping tracks the best loss seen so far and the iteration at which
//! it occurred: when the current loss fails to beat the best by at least
//! `tolerance` and more than `convergence_after` iterations have elapsed since
//! the best, the solve stops. This guards against wasting iterations on
//! numerical plateaus while tolerating transient non-monotonicity. The hard
//! cap `max_iters` always applies and is *not* an error: the solver returns
//! whatever sketch it has, flagging the miss in [`SolveReport`]. Loss values
//! are logged every `log_every` iterations for diagnostics only; the
//! convergence check runs every iteration regardless of the logging cadence.

use std::time::Instant;

use log::{debug, info, warn};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::CsMat;

use crate::error::{SparsifyError, SparsifyResult};
use crate::graph::GraphMatrices;
use crate::projection::dense_from_rows;

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Step size; `None` resolves to [`suggested_eta`] for the graph at hand.
    pub eta: Option<f64>,
    /// Hard iteration cap.
    pub max_iters: usize,
    /// Iterations without sufficient improvement before the early stop.
    pub convergence_after: usize,
    /// Minimum loss improvement counted as progress.
    pub tolerance: f64,
    /// Diagnostic logging cadence; has no effect on the output.
    pub log_every: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            eta: None,
            max_iters: 1000,
            convergence_after: 25,
            tolerance: 1e-9,
            log_every: 100,
        }
    }
}

/// Diagnostics surfaced alongside the solved sketch so callers can tune
/// `max_iters`/`eta` when the cap was hit without satisfying the convergence
/// rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
    pub best_loss: f64,
    pub best_iteration: usize,
    pub final_loss: f64,
    /// The step size actually used.
    pub eta: f64,
}

/// Step size safe against divergence for the given weighted degrees.
///
/// Gradient descent on `‖QY − ZL‖²` diverges once `η ≥ 2/λ_max(L)²`; the
/// Gershgorin bound `λ_max(L) ≤ 2·max_degree` gives `η = 1/(2·max_degree)²`
/// at most half the divergence threshold.
pub fn suggested_eta(degrees: &[f64]) -> f64 {
    let max_degree = degrees.iter().fold(0.0_f64, |a, &d| a.max(d));
    if max_degree <= 0.0 {
        return 1e-3;
    }
    let bound = 2.0 * max_degree;
    1.0 / (bound * bound)
}

/// Runs the gradient-descent solve; returns the `k×n` sketch and its report.
///
/// The initial sketch is drawn with independent standard-normal entries from
/// the pipeline's random stream. A non-finite loss (pathological `eta`, or an
/// overflow in the residual) propagates as [`SparsifyError::Numerical`].
pub fn solve(
    graph: &GraphMatrices,
    projection: &DenseMatrix<f64>,
    options: &SolverOptions,
    rng: &mut ChaCha8Rng,
) -> SparsifyResult<(DenseMatrix<f64>, SolveReport)> {
    let n = graph.nnodes;
    let (k, qcols) = projection.shape();
    debug_assert_eq!(qcols, graph.nedges());

    let eta = options.eta.unwrap_or_else(|| suggested_eta(&graph.degrees));
    info!(
        "solving {}x{} sketch: eta={:.3e}, max_iters={}, convergence_after={}, tolerance={:.1e}",
        k, n, eta, options.max_iters, options.convergence_after, options.tolerance
    );

    // Fixed right-hand side: one row of Q·Y per sketch row.
    let weighted_incidence = graph.weighted_incidence();
    let target: Vec<Vec<f64>> = (0..k)
        .into_par_iter()
        .map(|r| {
            let qrow: Vec<f64> = projection.get_row(r).iterator(0).copied().collect();
            row_times_sparse(&qrow, &weighted_incidence)
        })
        .collect();

    let mut sketch_rows: Vec<Vec<f64>> = (0..k)
        .map(|_| (0..n).map(|_| StandardNormal.sample(rng)).collect())
        .collect();

    let start = Instant::now();
    let mut best_loss = f64::INFINITY;
    let mut best_iteration = 0usize;
    let mut final_loss = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0usize;

    for iter in 0..options.max_iters {
        iterations = iter + 1;

        let loss: f64 = sketch_rows
            .par_iter_mut()
            .zip(target.par_iter())
            .map(|(zrow, trow)| {
                let zl = row_times_sparse(zrow, &graph.laplacian);
                let residual: Vec<f64> =
                    trow.iter().zip(zl.iter()).map(|(t, v)| t - v).collect();
                let gradient = row_times_sparse(&residual, &graph.laplacian);
                for (z, g) in zrow.iter_mut().zip(gradient.iter()) {
                    *z += eta * g;
                }
                residual.iter().map(|r| r * r).sum::<f64>()
            })
            .sum();

        if !loss.is_finite() {
            return Err(SparsifyError::Numerical(format!(
                "loss became non-finite at iteration {} (eta={:.3e})",
                iter, eta
            )));
        }
        final_loss = loss;

        if iter % options.log_every == 0 {
            debug!(
                "iteration {}: loss {:.6e} (best {:.6e} at {})",
                iter, loss, best_loss, best_iteration
            );
        }

        if loss < best_loss - options.tolerance {
            best_loss = loss;
            best_iteration = iter;
        } else if iter - best_iteration > options.convergence_after {
            converged = true;
            info!(
                "converged after {} iterations: loss {:.6e}, best {:.6e} at iteration {}",
                iterations, loss, best_loss, best_iteration
            );
            break;
        }
    }

    if !converged {
        warn!(
            "iteration cap {} reached without satisfying the convergence rule (loss {:.6e}); \
             returning the current sketch",
            options.max_iters, final_loss
        );
    }
    debug!("solve time: {:?}", start.elapsed());

    let sketch = dense_from_rows(sketch_rows)?;
    Ok((
        sketch,
        SolveReport {
            iterations,
            converged,
            best_loss,
            best_iteration,
            final_loss,
            eta,
        },
    ))
}

/// `out[c] = Σ_m row[m]·M[m,c]` for a CSR matrix, iterating stored rows only.
fn row_times_sparse(row: &[f64], matrix: &CsMat<f64>) -> Vec<f64> {
    let (rows, cols) = matrix.shape();
    debug_assert_eq!(row.len(), rows);
    let mut out = vec![0.0; cols];
    for (m, srow) in matrix.outer_iterator().enumerate() {
        let rv = row[m];
        if rv == 0.0 {
            continue;
        }
        for (c, &v) in srow.iter() {
            out[c] += rv * v;
        }
    }
    out
}
