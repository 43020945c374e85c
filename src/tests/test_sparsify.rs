// ============================================================
// End-to-end pipeline: config validation, determinism, quality
// ============================================================

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprs::TriMat;

use crate::error::SparsifyError;
use crate::graph::quadratic_form;
use crate::sparsify::{spectral_sparsify, SparsifyConfig};
use crate::tests::test_data::{complete, triangle, triplets, zero_mean_probe};

#[test]
fn config_defaults_validate() {
    assert!(SparsifyConfig::default().validate().is_ok());
}

#[test]
fn config_rejects_out_of_range_values() {
    let bad = [
        SparsifyConfig::new().with_epsilon(0.0),
        SparsifyConfig::new().with_epsilon(f64::NAN),
        SparsifyConfig::new().with_eta(-1.0),
        SparsifyConfig::new().with_sample_budget(0),
        SparsifyConfig::new().with_max_iters(0),
        SparsifyConfig::new().with_convergence_after(0),
        SparsifyConfig::new().with_tolerance(-1e-3),
        SparsifyConfig::new().with_log_every(0),
    ];
    for config in bad {
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SparsifyError::InvalidConfig(_)), "{}", err);
    }
}

#[test]
fn default_sample_budget_follows_the_formula() {
    // ⌈n·ln(n)/ε²⌉
    let config = SparsifyConfig::new().with_epsilon(0.3);
    assert_eq!(config.default_sample_budget(120), 6384);
    let loose = SparsifyConfig::new().with_epsilon(1.0);
    assert_eq!(loose.default_sample_budget(10), 24);
}

#[test]
fn invalid_config_fails_before_any_computation() {
    let config = SparsifyConfig::new().with_epsilon(-0.5);
    let err = spectral_sparsify(&triangle(), &config).unwrap_err();
    assert!(matches!(err, SparsifyError::InvalidConfig(_)), "{}", err);
}

#[test]
fn edgeless_graph_is_degenerate() {
    let adjacency = TriMat::new((3, 3)).to_csr();
    let err = spectral_sparsify(&adjacency, &SparsifyConfig::default()).unwrap_err();
    assert!(matches!(err, SparsifyError::DegenerateSampling(_)), "{}", err);
}

#[test]
fn seed_is_recorded_and_reproducible() {
    let config = SparsifyConfig::new().with_seed(7).with_sample_budget(40);
    let a = spectral_sparsify(&triangle(), &config).unwrap();
    let b = spectral_sparsify(&triangle(), &config).unwrap();
    assert_eq!(a.seed, 7);
    assert_eq!(a.samples, 40);
    assert_eq!(triplets(&a.graph), triplets(&b.graph));
    assert_eq!(a.solver, b.solver);
}

#[test]
fn sketch_dimension_is_clipped_to_the_entry_count() {
    // ⌈ln(3/0.0025)⌉ = 8 exceeds the triangle's 6 edge entries
    let config = SparsifyConfig::new()
        .with_epsilon(0.05)
        .with_seed(1)
        .with_sample_budget(40);
    let result = spectral_sparsify(&triangle(), &config).unwrap();
    assert_eq!(result.sketch_dimension, 6);
}

#[test]
fn guard_runs_through_the_full_pipeline() {
    let config = SparsifyConfig::new()
        .with_seed(5)
        .with_sample_budget(100)
        .with_vertex_blow_up_guard(true);
    let result = spectral_sparsify(&complete(12), &config).unwrap();
    assert_eq!(result.samples, 100);
    assert!(result.graph.nnz() <= 100);
}

#[test]
fn quadratic_form_is_preserved_on_a_dense_graph() {
    crate::tests::init();
    let n = 120;
    let adjacency = complete(n);
    let config = SparsifyConfig::new().with_epsilon(0.3).with_seed(1234);
    let result = spectral_sparsify(&adjacency, &config).unwrap();
    assert!(result.solver.converged, "{:?}", result.solver);
    assert_eq!(result.sketch_dimension, 8);
    assert_eq!(result.samples, 6384);
    assert!(result.graph.nnz() < adjacency.nnz());

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let probes = 200;
    let mut within = 0;
    for _ in 0..probes {
        let x = zero_mean_probe(n, &mut rng);
        let original = quadratic_form(&adjacency, &x);
        let sparsified = quadratic_form(&result.graph, &x);
        let ratio = sparsified / original;
        if (0.7..=1.3).contains(&ratio) {
            within += 1;
        }
    }
    assert!(
        within >= 190,
        "only {} of {} probes within the spectral band",
        within,
        probes
    );
}
