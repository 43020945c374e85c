// ============================================================
// Importance sampling: distribution, budget, unbiasedness, guard
// ============================================================

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprs::CsMat;

use crate::error::SparsifyError;
use crate::graph::GraphMatrices;
use crate::sampling::{sample_sparsifier, sampling_probabilities};
use crate::tests::test_data::{adjacency_from_edges, path, triangle};

/// K5 with a light pendant vertex hanging off vertex 4.
fn lollipop() -> CsMat<f64> {
    let mut edges = Vec::new();
    for i in 0..5 {
        for j in (i + 1)..5 {
            edges.push((i, j, 1.0));
        }
    }
    edges.push((4, 5, 0.01));
    adjacency_from_edges(6, &edges)
}

fn incident_weight(matrix: &CsMat<f64>, vertex: usize) -> f64 {
    let mut acc = 0.0;
    for (i, row) in matrix.outer_iterator().enumerate() {
        for (j, &w) in row.iter() {
            if i == vertex || j == vertex {
                acc += w;
            }
        }
    }
    acc
}

#[test]
fn probabilities_follow_weight_times_resistance() {
    let graph = GraphMatrices::from_adjacency(&path(3)).unwrap();
    // CSR entry order: (0,1), (1,0), (1,2), (2,1)
    assert_eq!(graph.edges, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
    let resistances = vec![1.0, 1.0, 2.0, 2.0];
    let probabilities = sampling_probabilities(&graph, &resistances, false).unwrap();
    assert_abs_diff_eq!(probabilities[0], 1.0 / 6.0, epsilon = 1e-12);
    assert_abs_diff_eq!(probabilities[1], 1.0 / 6.0, epsilon = 1e-12);
    assert_abs_diff_eq!(probabilities[2], 1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(probabilities[3], 1.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn all_zero_resistances_are_degenerate() {
    let graph = GraphMatrices::from_adjacency(&triangle()).unwrap();
    let resistances = vec![0.0; graph.nedges()];
    let err = sampling_probabilities(&graph, &resistances, false).unwrap_err();
    assert!(matches!(err, SparsifyError::DegenerateSampling(_)), "{}", err);
}

#[test]
fn non_finite_resistances_fail() {
    let graph = GraphMatrices::from_adjacency(&triangle()).unwrap();
    let mut resistances = vec![1.0; graph.nedges()];
    resistances[2] = f64::INFINITY;
    let err = sampling_probabilities(&graph, &resistances, false).unwrap_err();
    assert!(matches!(err, SparsifyError::Numerical(_)), "{}", err);
}

#[test]
fn guarded_probabilities_remain_a_distribution() {
    let graph = GraphMatrices::from_adjacency(&lollipop()).unwrap();
    let resistances = vec![1.0; graph.nedges()];
    let probabilities = sampling_probabilities(&graph, &resistances, true).unwrap();
    let sum: f64 = probabilities.iter().sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
    assert!(probabilities.iter().all(|&p| p > 0.0));
}

#[test]
fn sample_budget_is_respected() {
    let graph = GraphMatrices::from_adjacency(&triangle()).unwrap();
    let resistances = vec![1.0; graph.nedges()];
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let (sparsified, samples) = sample_sparsifier(&graph, 10, &resistances, false, &mut rng).unwrap();
    assert_eq!(samples, 10);
    assert_eq!(sparsified.shape(), (3, 3));
    // repeated draws merge, so distinct cells never exceed the entry count
    assert!(sparsified.nnz() <= graph.nedges());
}

#[test]
fn oversampling_the_edge_set_is_valid() {
    let graph = GraphMatrices::from_adjacency(&triangle()).unwrap();
    let resistances = vec![1.0; graph.nedges()];
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let (sparsified, samples) = sample_sparsifier(&graph, 500, &resistances, false, &mut rng).unwrap();
    assert_eq!(samples, 500);
    assert!(sparsified.nnz() <= graph.nedges());
    // with 500 draws over 6 entries every cell is hit almost surely
    assert_eq!(sparsified.nnz(), graph.nedges());
}

#[test]
fn accumulated_weight_is_unbiased() {
    crate::tests::init();
    let graph = GraphMatrices::from_adjacency(&path(3)).unwrap();
    let resistances = vec![1.0, 1.0, 2.0, 2.0];
    let runs = 3000u64;
    let q = 8;
    let mut total = 0.0;
    for seed in 0..runs {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (sparsified, _) = sample_sparsifier(&graph, q, &resistances, false, &mut rng).unwrap();
        total += sparsified.data().iter().sum::<f64>();
    }
    let mean = total / runs as f64;
    // E[Σ entries] equals the input's total stored weight
    assert!((mean - 4.0).abs() < 0.08, "mean accumulated weight {}", mean);
}

#[test]
fn blow_up_guard_caps_pendant_amplification() {
    crate::tests::init();
    let graph = GraphMatrices::from_adjacency(&lollipop()).unwrap();
    let resistances = vec![1.0; graph.nedges()];
    let q = 50;
    let trials = 200u64;

    let mut max_plain = 0.0_f64;
    let mut max_guarded = 0.0_f64;
    for seed in 0..trials {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (plain, _) = sample_sparsifier(&graph, q, &resistances, false, &mut rng).unwrap();
        max_plain = max_plain.max(incident_weight(&plain, 5));

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (guarded, _) = sample_sparsifier(&graph, q, &resistances, true, &mut rng).unwrap();
        max_guarded = max_guarded.max(incident_weight(&guarded, 5));
    }

    // Unguarded, a rare draw of the light pendant edge is reweighted to ~40x
    // its original weight; the floor keeps it near the true incident weight.
    assert!(max_plain > 0.3, "worst pendant weight {}", max_plain);
    assert!(max_guarded < 0.1, "guarded pendant weight {}", max_guarded);
    assert!(max_guarded < max_plain);
}
