//! Resistance-weighted importance sampling of the sparsified edge set.
//!
//! Edge entries are drawn with replacement with probability proportional to
//! `weight × resistance`: edges that are both heavy and structurally pivotal
//! are over-represented to control the variance of the resulting Laplacian
//! estimator. Each draw of entry `t = (i, j)` with original weight `w`
//! accumulates `w / (q·p[t])` into the output at `(i, j)`, so the output's
//! Laplacian equals the input's in expectation. Both orientations of an
//! undirected edge are separate entries and separately eligible, which is how
//! symmetry of the output is maintained in expectation.
//!
//! The optional vertex-blow-up guard mixes the distribution with a
//! degree-reciprocal floor: per entry, `1/n` times the reciprocal of the
//! smaller endpoint degree is added, the result halved (the average of the
//! two distributions), then renormalized. This bounds how much a single
//! vertex's incident weight can be amplified when a low-probability edge
//! touching a low-degree vertex is sampled and reweighted. The trade-off is a
//! constant-factor loss in the spectral guarantee, quoted as up to `2ε` but
//! not derived from the sampling theorem; treat that figure as a documented
//! heuristic claim.

use log::{debug, info};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand_chacha::ChaCha8Rng;
use sprs::{CsMat, TriMat};

use crate::error::{SparsifyError, SparsifyResult};
use crate::graph::GraphMatrices;

/// Per-entry sampling probabilities `p[t] ∝ w[t]·R[t]`, normalized to sum 1,
/// with the optional degree-reciprocal floor applied.
///
/// Fails when every entry's mass is zero: a draw would be undefined, and
/// silently producing a degenerate graph is worse than stopping.
pub fn sampling_probabilities(
    graph: &GraphMatrices,
    resistances: &[f64],
    prevent_vertex_blow_up: bool,
) -> SparsifyResult<Vec<f64>> {
    debug_assert_eq!(resistances.len(), graph.nedges());

    let masses: Vec<f64> = graph
        .weights
        .iter()
        .zip(resistances.iter())
        .map(|(w, r)| w * r)
        .collect();
    let total: f64 = masses.iter().sum();
    if !total.is_finite() {
        return Err(SparsifyError::Numerical(format!(
            "sampling mass is non-finite ({})",
            total
        )));
    }
    if total <= 0.0 {
        return Err(SparsifyError::DegenerateSampling(
            "all weight-resistance products are zero".to_string(),
        ));
    }

    let mut probabilities: Vec<f64> = masses.iter().map(|m| m / total).collect();

    if prevent_vertex_blow_up {
        let n = graph.nnodes as f64;
        for (t, &(i, j)) in graph.edges.iter().enumerate() {
            let min_degree = graph.degrees[i].min(graph.degrees[j]);
            if min_degree > 0.0 {
                probabilities[t] = 0.5 * (probabilities[t] + 1.0 / (n * min_degree));
            }
        }
        // The floor mass only approximately sums to 1, so the halved average
        // is renormalized to keep the draw distribution exact.
        let sum: f64 = probabilities.iter().sum();
        for p in probabilities.iter_mut() {
            *p /= sum;
        }
        debug!("applied vertex blow-up floor over {} entries", probabilities.len());
    }

    Ok(probabilities)
}

/// Draws `q` edge entries with replacement and accumulates the reweighted
/// contributions into a sparse matrix of the input's shape.
///
/// Returns the accumulated graph and the number of accumulation events
/// (always `q`); repeated draws of the same entry sum into the same cell, so
/// the number of distinct non-zeros can be smaller. `q` larger than the edge
/// entry count is valid; duplicates are expected and desired.
pub fn sample_sparsifier(
    graph: &GraphMatrices,
    q: usize,
    resistances: &[f64],
    prevent_vertex_blow_up: bool,
    rng: &mut ChaCha8Rng,
) -> SparsifyResult<(CsMat<f64>, usize)> {
    let probabilities = sampling_probabilities(graph, resistances, prevent_vertex_blow_up)?;
    let distribution = WeightedIndex::new(&probabilities)
        .map_err(|err| SparsifyError::DegenerateSampling(err.to_string()))?;

    let n = graph.nnodes;
    let mut accumulator = TriMat::with_capacity((n, n), q.min(graph.nedges()));
    for _ in 0..q {
        let t = distribution.sample(rng);
        let (i, j) = graph.edges[t];
        let contribution = graph.weights[t] / (q as f64 * probabilities[t]);
        accumulator.add_triplet(i, j, contribution);
    }

    // Duplicate triplets are summed on conversion.
    let sparsified = accumulator.to_csr();
    info!(
        "sampled {} draws into {} distinct cells ({} edge entries available)",
        q,
        sparsified.nnz(),
        graph.nedges()
    );
    Ok((sparsified, q))
}
