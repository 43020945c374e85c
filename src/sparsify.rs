//! Pipeline orchestration: representation → sketch → solve → resistances →
//! sampling.
//!
//! [`spectral_sparsify`] wires the five stages together; each stage's output
//! is consumed unmodified by the next and no stage is invoked more than once
//! per call. Randomness is drawn from a single ChaCha8 stream seeded at this
//! boundary — from the configured seed, or from a fresh one that is recorded
//! in the result so any run can be reproduced.

use std::time::Instant;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::error::{SparsifyError, SparsifyResult};
use crate::graph::GraphMatrices;
use crate::projection::{sample_projection, sketch_dimension};
use crate::resistance::approximate_resistances;
use crate::sampling::sample_sparsifier;
use crate::solver::{solve, SolveReport, SolverOptions};

/// Every recognized option with its default; validated once at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsifyConfig {
    /// Target spectral tolerance; also drives the default sample budget and
    /// the sketch dimension. Must be > 0.
    pub epsilon: f64,
    /// Explicit edge-sample budget; `None` defaults to `⌈n·ln(n)/ε²⌉`.
    pub q: Option<usize>,
    /// Gradient-descent step size; `None` resolves to a Gershgorin-safe
    /// default for the graph at hand. Must be > 0 when set.
    pub eta: Option<f64>,
    /// Hard solver iteration cap.
    pub max_iters: usize,
    /// Iterations without sufficient improvement before the solver stops.
    pub convergence_after: usize,
    /// Minimum loss improvement counted as progress.
    pub tolerance: f64,
    /// Diagnostic logging cadence; has no effect on the output.
    pub log_every: usize,
    /// Enables the probability-floor correction in the sampler.
    pub prevent_vertex_blow_up: bool,
    /// Seed for the random stream; `None` draws one and records it.
    pub seed: Option<u64>,
}

impl Default for SparsifyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.3,
            q: None,
            eta: None,
            max_iters: 1000,
            convergence_after: 25,
            tolerance: 1e-9,
            log_every: 100,
            prevent_vertex_blow_up: false,
            seed: None,
        }
    }
}

impl SparsifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_sample_budget(mut self, q: usize) -> Self {
        self.q = Some(q);
        self
    }

    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_convergence_after(mut self, convergence_after: usize) -> Self {
        self.convergence_after = convergence_after;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_vertex_blow_up_guard(mut self, enabled: bool) -> Self {
        self.prevent_vertex_blow_up = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> SparsifyResult<()> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(SparsifyError::InvalidConfig(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }
        if let Some(eta) = self.eta {
            if !(eta > 0.0 && eta.is_finite()) {
                return Err(SparsifyError::InvalidConfig(format!(
                    "eta must be a positive finite number, got {}",
                    eta
                )));
            }
        }
        if let Some(q) = self.q {
            if q == 0 {
                return Err(SparsifyError::InvalidConfig(
                    "q must be a positive integer".to_string(),
                ));
            }
        }
        if self.max_iters == 0 {
            return Err(SparsifyError::InvalidConfig(
                "max_iters must be a positive integer".to_string(),
            ));
        }
        if self.convergence_after == 0 {
            return Err(SparsifyError::InvalidConfig(
                "convergence_after must be a positive integer".to_string(),
            ));
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(SparsifyError::InvalidConfig(format!(
                "tolerance must be a non-negative finite number, got {}",
                self.tolerance
            )));
        }
        if self.log_every == 0 {
            return Err(SparsifyError::InvalidConfig(
                "log_every must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Default edge-sample budget `⌈n·ln(n)/ε²⌉`.
    pub fn default_sample_budget(&self, nnodes: usize) -> usize {
        let n = nnodes as f64;
        let budget = (n * n.ln() / (self.epsilon * self.epsilon)).ceil();
        if budget.is_finite() && budget >= 1.0 {
            budget as usize
        } else {
            1
        }
    }

    fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            eta: self.eta,
            max_iters: self.max_iters,
            convergence_after: self.convergence_after,
            tolerance: self.tolerance,
            log_every: self.log_every,
        }
    }
}

/// The sparsified graph together with the run's diagnostics.
#[derive(Debug, Clone)]
pub struct Sparsified {
    /// Sparse weighted adjacency of the input's shape; at most `samples`
    /// accumulation events, symmetric in expectation.
    pub graph: CsMat<f64>,
    pub solver: SolveReport,
    pub sketch_dimension: usize,
    /// Number of sampling draws performed.
    pub samples: usize,
    /// Seed of the random stream, recorded for reproducibility.
    pub seed: u64,
}

/// Computes a spectral sparsifier of the given adjacency matrix.
///
/// The input must be square, symmetric, non-negative, and free of self-loops;
/// violations fail before any computation. The output approximates the
/// input's Laplacian quadratic form within the configured tolerance for every
/// vector, using at most `q` weighted edge contributions.
pub fn spectral_sparsify(
    adjacency: &CsMat<f64>,
    config: &SparsifyConfig,
) -> SparsifyResult<Sparsified> {
    config.validate()?;
    let start = Instant::now();

    let graph = GraphMatrices::from_adjacency(adjacency)?;
    let n = graph.nnodes;
    let e = graph.nedges();
    if e == 0 {
        return Err(SparsifyError::DegenerateSampling(
            "graph has no edge entries to sample".to_string(),
        ));
    }

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    info!(
        "sparsifying {} vertices / {} edge entries: epsilon={}, seed={}",
        n, e, config.epsilon, seed
    );
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut k = sketch_dimension(n, config.epsilon);
    if k > e {
        warn!(
            "sketch dimension {} exceeds edge entry count {}; clipping",
            k, e
        );
        k = e;
    }
    let projection = sample_projection(k, e, &mut rng)?;

    let (sketch, report) = solve(&graph, &projection, &config.solver_options(), &mut rng)?;

    let resistances = approximate_resistances(&sketch, &graph.edges);

    let q = config.q.unwrap_or_else(|| config.default_sample_budget(n));
    debug!("edge-sample budget: {}", q);
    let (sparsified, samples) =
        sample_sparsifier(&graph, q, &resistances, config.prevent_vertex_blow_up, &mut rng)?;

    info!(
        "sparsification complete in {:?}: {} edge entries -> {} stored cells",
        start.elapsed(),
        e,
        sparsified.nnz()
    );

    Ok(Sparsified {
        graph: sparsified,
        solver: report,
        sketch_dimension: k,
        samples,
        seed,
    })
}
