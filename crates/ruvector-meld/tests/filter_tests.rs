//! Tests for the MELD graph filter entry point
//!
//! Tests cover:
//! - Exact and Chebyshev paths for both kernels
//! - Option parsing and validation errors
//! - Signal orientation and storage format

use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;
use ruvector_meld::{
    meld, meld_vector, CsrMatrix, FilterConfig, FilterKernel, FilterMethod, Graph, LaplacianGraph,
    LaplacianNorm, MeldError, SignalData, SpectralGraph, WeightedGraph,
};

fn two_cliques() -> LaplacianGraph {
    let mut edges = Vec::new();
    for base in [0, 4] {
        for i in 0..4 {
            for j in (i + 1)..4 {
                edges.push((base + i, base + j, 1.0));
            }
        }
    }
    edges.push((3, 4, 0.2));
    LaplacianGraph::from_edges(8, &edges).unwrap()
}

fn noisy_step() -> Vec<f64> {
    vec![-1.0, -0.6, -1.3, -0.9, 1.1, 0.7, 1.2, 0.9]
}

#[cfg(test)]
mod exact_vs_approximate {
    use super::*;

    #[test]
    fn test_regularized_laplacian_agrees() {
        let g = two_cliques();
        for strength in [0.5, 1.0, 4.0] {
            let exact = FilterConfig::with_strength(strength).method(FilterMethod::Exact);
            let approx = exact.clone().method(FilterMethod::Approximate).chebyshev_degree(60);

            let a = meld_vector(&noisy_step(), &g, &exact).unwrap();
            let b = meld_vector(&noisy_step(), &g, &approx).unwrap();
            for (x, y) in a.iter().zip(&b) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_higher_order_agrees() {
        let g = two_cliques();
        let exact = FilterConfig::with_strength(0.5)
            .order(2)
            .spectral_shift(0.1)
            .method(FilterMethod::Exact);
        let approx = exact.clone().method(FilterMethod::Approximate).chebyshev_degree(80);

        let a = meld_vector(&noisy_step(), &g, &exact).unwrap();
        let b = meld_vector(&noisy_step(), &g, &approx).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_random_walk_agrees() {
        let g = two_cliques();
        let exact = FilterConfig::with_strength(4.0)
            .kernel(FilterKernel::RandomWalk)
            .method(FilterMethod::Exact);
        let approx = exact.clone().method(FilterMethod::Approximate);

        let a = meld_vector(&noisy_step(), &g, &exact).unwrap();
        let b = meld_vector(&noisy_step(), &g, &approx).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_cached_basis_does_not_change_result() {
        let mut g = two_cliques();
        let config = FilterConfig::with_strength(2.0);
        let before = meld_vector(&noisy_step(), &g, &config).unwrap();
        g.compute_fourier_basis().unwrap();
        let after = meld_vector(&noisy_step(), &g, &config).unwrap();
        for (x, y) in before.iter().zip(&after) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-6);
        }
    }
}

#[cfg(test)]
mod filter_semantics {
    use super::*;

    #[test]
    fn test_identity_at_zero_strength() {
        let g = two_cliques();
        let config = FilterConfig::from_options(0.0, "exact", "regularized_laplacian").unwrap();
        let out = meld_vector(&noisy_step(), &g, &config).unwrap();
        for (x, y) in out.iter().zip(&noisy_step()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_preserves_mean_on_combinatorial_laplacian() {
        // h(0) = 1, so the constant component passes unchanged
        let g = two_cliques();
        let signal = noisy_step();
        let out = meld_vector(&signal, &g, &FilterConfig::with_strength(3.0)).unwrap();
        let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
        assert_abs_diff_eq!(mean(&out), mean(&signal), epsilon = 1e-6);
    }

    #[test]
    fn test_stronger_filter_is_smoother() {
        let g = two_cliques();
        let signal = noisy_step();
        let energy = |s: &[f64]| -> f64 {
            let v = nalgebra::DVector::from_column_slice(s);
            (v.transpose() * g.laplacian() * &v)[(0, 0)]
        };
        let weak = meld_vector(&signal, &g, &FilterConfig::with_strength(0.5)).unwrap();
        let strong = meld_vector(&signal, &g, &FilterConfig::with_strength(5.0)).unwrap();
        assert!(energy(&strong) < energy(&weak));
        assert!(energy(&weak) < energy(&signal));
    }

    #[test]
    fn test_normalized_laplacian_graph() {
        let weighted = WeightedGraph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]).unwrap();
        let g = LaplacianGraph::new(weighted, LaplacianNorm::Normalized);
        let exact = FilterConfig::with_strength(1.0).method(FilterMethod::Exact);
        let approx = FilterConfig::with_strength(1.0);
        let a = meld_vector(&[1.0, 0.0, 0.0, 1.0], &g, &exact).unwrap();
        let b = meld_vector(&[1.0, 0.0, 0.0, 1.0], &g, &approx).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_multiple_signals_filtered_independently() {
        let g = two_cliques();
        let a = noisy_step();
        let b: Vec<f64> = a.iter().rev().copied().collect();
        let block = DMatrix::from_fn(8, 2, |i, j| if j == 0 { a[i] } else { b[i] });

        let config = FilterConfig::with_strength(1.0);
        let out = meld(&SignalData::Dense(block), &g, &config).unwrap().to_dense();
        let single = meld_vector(&b, &g, &config).unwrap();
        for i in 0..8 {
            assert_abs_diff_eq!(out[(i, 1)], single[i], epsilon = 1e-12);
        }
    }
}

#[cfg(test)]
mod errors {
    use super::*;

    #[test]
    fn test_bogus_method() {
        let err = FilterConfig::from_options(1.0, "bogus", "randomwalk").unwrap_err();
        match err {
            MeldError::UnsupportedOption { value, .. } => assert_eq!(value, "bogus"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bogus_kernel() {
        assert!(matches!(
            FilterConfig::from_options(1.0, "cheby", "heat"),
            Err(MeldError::UnsupportedOption { .. })
        ));
    }

    #[test]
    fn test_fractional_exact_random_walk() {
        let g = two_cliques();
        let config = FilterConfig::with_strength(1.5)
            .kernel(FilterKernel::RandomWalk)
            .method(FilterMethod::Exact);
        assert!(matches!(
            meld_vector(&noisy_step(), &g, &config),
            Err(MeldError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_graph_without_laplacian() {
        let g = two_cliques().into_weighted();
        assert_eq!(g.kind(), "WeightedGraph");
        assert!(matches!(
            meld_vector(&noisy_step(), &g, &FilterConfig::default()),
            Err(MeldError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_singular_exact_system() {
        // With γ = shift = 1 the system I + (L − I) is L itself, singular on the constant vector
        let g = LaplacianGraph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
        let config = FilterConfig::with_strength(1.0)
            .spectral_shift(1.0)
            .method(FilterMethod::Exact);
        assert!(matches!(
            meld_vector(&[1.0, 2.0, 3.0], &g, &config),
            Err(MeldError::SingularMatrix { .. })
        ));
    }
}

#[cfg(test)]
mod orientation {
    use super::*;

    #[test]
    fn test_row_signals_are_transposed() {
        let g = two_cliques();
        let signal = noisy_step();
        let rows = DMatrix::from_fn(3, 8, |_, j| signal[j]);
        let out = meld(&SignalData::Dense(rows), &g, &FilterConfig::default()).unwrap();
        assert_eq!(out.shape(), (8, 3));

        let single = meld_vector(&signal, &g, &FilterConfig::default()).unwrap();
        let dense = out.to_dense();
        for i in 0..8 {
            assert_abs_diff_eq!(dense[(i, 2)], single[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_neither_axis_matches() {
        let g = two_cliques();
        let bad = DMatrix::from_element(3, 7, 1.0);
        assert!(matches!(
            meld(&SignalData::Dense(bad), &g, &FilterConfig::default()),
            Err(MeldError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_sparse_signal_round_trip_format() {
        let g = two_cliques();
        let sparse = CsrMatrix::from_triplets(8, 1, &[(0, 0, 1.0), (5, 0, -1.0)]);
        let out = meld(&SignalData::Sparse(sparse.clone()), &g, &FilterConfig::default()).unwrap();
        assert!(out.is_sparse());

        let dense = meld(&SignalData::Dense(sparse.to_dense()), &g, &FilterConfig::default())
            .unwrap()
            .to_dense();
        assert!((out.to_dense() - dense).norm() < 1e-12);
    }
}
