//! Error taxonomy for the sparsification pipeline.
//!
//! Validation errors are raised at the boundary component that detects them
//! (graph representation, sampler, config validation); no component continues
//! with corrupted state. Solver non-convergence is deliberately *not* an
//! error: it is reported through `SolveReport` instead.

#[derive(Debug)]
pub enum SparsifyError {
    /// The input adjacency matrix violates the caller contract
    /// (non-square, asymmetric, negative weights, self-loops).
    InvalidGraph(String),
    /// A configuration value is outside its accepted range.
    InvalidConfig(String),
    /// Every sampling probability collapsed to zero; a draw is undefined.
    DegenerateSampling(String),
    /// A residual or projected value became non-finite during computation.
    Numerical(String),
}

impl std::fmt::Display for SparsifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SparsifyError::InvalidGraph(e) => write!(f, "invalid graph: {}", e),
            SparsifyError::InvalidConfig(e) => write!(f, "invalid config: {}", e),
            SparsifyError::DegenerateSampling(e) => {
                write!(f, "degenerate sampling distribution: {}", e)
            }
            SparsifyError::Numerical(e) => write!(f, "numerical failure: {}", e),
        }
    }
}

impl std::error::Error for SparsifyError {}

pub type SparsifyResult<T> = Result<T, SparsifyError>;
