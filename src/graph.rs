//! Algebraic representation of a weighted undirected graph.
//!
//! Derives from a sparse symmetric adjacency matrix `A` everything the
//! resistance pipeline consumes:
//!
//! 1. **Laplacian** `L = D − A` where `D` is the diagonal of weighted degrees
//! 2. **Edge list**: every structurally non-zero `(row, col)` of `A` in CSR
//!    iteration order. Because `A` is stored symmetrically, each undirected
//!    edge appears twice (once per direction); this duplication is intentional
//!    and carried through incidence rows, weights, resistances, and sampling.
//! 3. **Signed incidence** `B` (one row per edge entry, `+1` at the source
//!    column, `−1` at the target column) and the diagonal of per-entry
//!    square-root weights, so that `Y = diag(√w)·B` satisfies `YᵗY = 2L`
//!    (the factor of two comes from the duplicated entries).
//!
//! All caller-contract violations (non-square, asymmetric, negative weights,
//! self-loops) fail here, before any computation.

use approx::abs_diff_eq;
use log::{debug, info};
use sprs::{CsMat, TriMat};

use crate::error::{SparsifyError, SparsifyResult};

/// Tolerance for the symmetry check on the input adjacency.
pub const SYMMETRY_TOL: f64 = 1e-9;

/// Matrices and index structures derived once from the input adjacency.
#[derive(Debug, Clone)]
pub struct GraphMatrices {
    /// Combinatorial Laplacian `L = D − A`, CSR, positive semi-definite.
    pub laplacian: CsMat<f64>,
    /// Signed incidence matrix, one row per edge entry (e×n).
    pub incidence: CsMat<f64>,
    /// Square roots of the per-entry weights (diagonal of `W^{1/2}`).
    pub weight_sqrt: Vec<f64>,
    /// `(row, col)` of every structurally non-zero adjacency entry.
    pub edges: Vec<(usize, usize)>,
    /// Weight of the corresponding edge entry.
    pub weights: Vec<f64>,
    /// Weighted degree per vertex.
    pub degrees: Vec<f64>,
    pub nnodes: usize,
}

impl GraphMatrices {
    /// Validates the adjacency matrix and builds the derived representation.
    ///
    /// The edge enumeration order is the CSR outer iteration order of the
    /// input, which is fixed and stable for a given matrix.
    pub fn from_adjacency(adjacency: &CsMat<f64>) -> SparsifyResult<Self> {
        let (rows, cols) = adjacency.shape();
        if rows != cols {
            return Err(SparsifyError::InvalidGraph(format!(
                "adjacency must be square, got {}x{}",
                rows, cols
            )));
        }
        let n = rows;

        for (i, row) in adjacency.outer_iterator().enumerate() {
            for (j, &w) in row.iter() {
                if i == j {
                    return Err(SparsifyError::InvalidGraph(format!(
                        "self-loop at vertex {}",
                        i
                    )));
                }
                if !w.is_finite() {
                    return Err(SparsifyError::InvalidGraph(format!(
                        "non-finite weight {} at ({}, {})",
                        w, i, j
                    )));
                }
                if w < 0.0 {
                    return Err(SparsifyError::InvalidGraph(format!(
                        "negative weight {} at ({}, {})",
                        w, i, j
                    )));
                }
                let mirrored = adjacency.get(j, i).copied().unwrap_or(0.0);
                if !abs_diff_eq!(w, mirrored, epsilon = SYMMETRY_TOL) {
                    return Err(SparsifyError::InvalidGraph(format!(
                        "asymmetric entries at ({}, {}): {} vs {}",
                        i, j, w, mirrored
                    )));
                }
            }
        }

        let nnz = adjacency.nnz();
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(nnz);
        let mut weights: Vec<f64> = Vec::with_capacity(nnz);
        let mut degrees: Vec<f64> = vec![0.0; n];
        for (i, row) in adjacency.outer_iterator().enumerate() {
            for (j, &w) in row.iter() {
                edges.push((i, j));
                weights.push(w);
                degrees[i] += w;
            }
        }
        let nedges = edges.len();

        let mut lap = TriMat::with_capacity((n, n), nnz + n);
        for (i, &d) in degrees.iter().enumerate() {
            lap.add_triplet(i, i, d);
        }
        for (t, &(i, j)) in edges.iter().enumerate() {
            lap.add_triplet(i, j, -weights[t]);
        }

        let mut inc = TriMat::with_capacity((nedges, n), 2 * nedges);
        for (t, &(i, j)) in edges.iter().enumerate() {
            inc.add_triplet(t, i, 1.0);
            inc.add_triplet(t, j, -1.0);
        }

        let weight_sqrt: Vec<f64> = weights.iter().map(|w| w.sqrt()).collect();

        info!(
            "built graph representation: {} vertices, {} edge entries, total weight {:.6}",
            n,
            nedges,
            weights.iter().sum::<f64>()
        );

        Ok(Self {
            laplacian: lap.to_csr(),
            incidence: inc.to_csr(),
            weight_sqrt,
            edges,
            weights,
            degrees,
            nnodes: n,
        })
    }

    /// Number of edge entries (twice the number of undirected edges).
    pub fn nedges(&self) -> usize {
        self.edges.len()
    }

    /// `Y = diag(√w)·B`: the weighted incidence matrix (e×n), one sparse row
    /// per edge entry with `+√w` at the source and `−√w` at the target.
    pub fn weighted_incidence(&self) -> CsMat<f64> {
        let nedges = self.nedges();
        let mut y = TriMat::with_capacity((nedges, self.nnodes), 2 * nedges);
        for (t, &(i, j)) in self.edges.iter().enumerate() {
            let s = self.weight_sqrt[t];
            y.add_triplet(t, i, s);
            y.add_triplet(t, j, -s);
        }
        debug!("built weighted incidence: {}x{}", nedges, self.nnodes);
        y.to_csr()
    }
}

/// Laplacian quadratic form `xᵗLx = ½ Σ A[i,j]·(x[i] − x[j])²`, evaluated
/// directly over the stored entries of an adjacency matrix.
///
/// Also accepts the accumulated output of the sampler, whose stored entries
/// need not be mirrored exactly; each entry contributes half its weighted
/// squared difference, which coincides with `xᵗLx` whenever the matrix is
/// symmetric.
pub fn quadratic_form(adjacency: &CsMat<f64>, x: &[f64]) -> f64 {
    let mut acc = 0.0;
    for (i, row) in adjacency.outer_iterator().enumerate() {
        for (j, &w) in row.iter() {
            let d = x[i] - x[j];
            acc += 0.5 * w * d * d;
        }
    }
    acc
}
