//! Spectral graph sparsification via approximate effective resistances.
//!
//! Given an edge-weighted undirected graph, this crate computes a reweighted
//! graph on the same vertex set with far fewer edges whose Laplacian
//! quadratic form approximates the original within a multiplicative `(1±ε)`
//! factor for every vector.
//!
//! # Pipeline
//!
//! 1. **Representation** ([`graph`]): Laplacian `L = D − A`, signed incidence
//!    `B`, and square-root weights from the adjacency matrix.
//! 2. **Sketch** ([`projection`]): a `k×e` random sign matrix with
//!    `k = ⌈ln(n/ε²)⌉`, the Johnson–Lindenstrauss step.
//! 3. **Solve** ([`solver`]): gradient descent on `‖Q·Y − Z·L‖²` producing
//!    `Z ≈ Q·Y·L⁺` without forming the pseudoinverse.
//! 4. **Resistances** ([`resistance`]): `R[t] = ‖Z[:,i] − Z[:,j]‖²` per edge
//!    entry.
//! 5. **Sampling** ([`sampling`]): `q` draws with replacement with
//!    `p ∝ weight × resistance`, accumulating `w/(q·p)` per draw so the
//!    output Laplacian is unbiased.
//!
//! Data flows strictly forward; [`sparsify::spectral_sparsify`] composes the
//! stages and threads one seeded random stream through all of them.
//!
//! # Example
//!
//! ```
//! use resparse::{spectral_sparsify, SparsifyConfig};
//! use sprs::TriMat;
//!
//! // Unweighted triangle.
//! let mut a = TriMat::new((3, 3));
//! for &(i, j) in &[(0, 1), (1, 2), (0, 2)] {
//!     a.add_triplet(i, j, 1.0);
//!     a.add_triplet(j, i, 1.0);
//! }
//! let config = SparsifyConfig::new().with_epsilon(0.5).with_seed(42);
//! let result = spectral_sparsify(&a.to_csr(), &config).unwrap();
//! assert!(result.graph.nnz() <= result.samples);
//! ```

pub mod error;
pub mod graph;
pub mod projection;
pub mod resistance;
pub mod sampling;
pub mod solver;
pub mod sparsify;

pub use crate::error::{SparsifyError, SparsifyResult};
pub use crate::solver::{SolveReport, SolverOptions};
pub use crate::sparsify::{spectral_sparsify, Sparsified, SparsifyConfig};

#[cfg(test)]
mod tests;
