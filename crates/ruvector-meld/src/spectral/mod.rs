//! Spectral Methods for Graph Signals
//!
//! Chebyshev polynomials and spectral graph filtering without
//! eigendecomposition, plus the MELD low-pass filter built on top.
//!
//! ## Mathematical Background
//!
//! Chebyshev polynomials T_k(x) satisfy:
//! - T_0(x) = 1
//! - T_1(x) = x
//! - T_{k+1}(x) = 2x·T_k(x) - T_{k-1}(x)
//!
//! A kernel h(λ) on [0, λ_max] is interpolated in this basis after the
//! change of variable x = 2λ/λ_max − 1, and h(L)·X is evaluated with the
//! same recurrence applied to the scaled operator 2L/λ_max − I.

mod chebyshev;
mod graph_filter;

pub use chebyshev::{ChebyshevExpansion, ChebyshevPolynomial};
pub use graph_filter::{meld, meld_vector, SignalData};

use nalgebra::DMatrix;

use crate::sparse::CsrMatrix;

/// Power-iteration steps used when estimating λ_max
const LAMBDA_MAX_ITERS: usize = 500;

/// Relative change at which power iteration stops early
const LAMBDA_MAX_TOL: f64 = 1e-10;

/// Headroom applied to the power-iteration estimate so the spectrum
/// stays inside the Chebyshev interval
const LAMBDA_MAX_MARGIN: f64 = 1.01;

/// Scaled Laplacian for Chebyshev approximation
/// L_scaled = 2L/λ_max - I (eigenvalues in [-1, 1])
#[derive(Debug, Clone)]
pub struct ScaledLaplacian {
    /// Sparse scaled operator
    pub operator: CsrMatrix,
    /// Matrix dimension
    pub n: usize,
    /// Upper bound of the spectrum
    pub lambda_max: f64,
}

impl ScaledLaplacian {
    /// Scale an operator whose spectrum lies in [0, lambda_max].
    /// The operator need not be symmetric.
    pub fn from_operator(op: &DMatrix<f64>, lambda_max: f64) -> Self {
        let n = op.nrows();
        let lambda_max = lambda_max.max(1e-8);
        let scale = 2.0 / lambda_max;

        let mut entries = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let v = op[(i, j)];
                if i == j {
                    entries.push((i, j, scale * v - 1.0));
                } else if v != 0.0 {
                    entries.push((i, j, scale * v));
                }
            }
        }

        Self {
            operator: CsrMatrix::from_triplets(n, n, &entries),
            n,
            lambda_max,
        }
    }

    /// Scale an operator, estimating λ_max by power iteration
    pub fn estimate(op: &DMatrix<f64>) -> Self {
        Self::from_operator(op, estimate_lambda_max(op))
    }

    /// Apply scaled Laplacian to every column: Y = L_scaled * X
    pub fn apply(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        self.operator.mul_dense(x)
    }

    /// Get original (unscaled) maximum eigenvalue estimate
    pub fn lambda_max(&self) -> f64 {
        self.lambda_max
    }
}

/// Estimate the largest eigenvalue magnitude of `op` by power iteration,
/// with a 1% margin.
pub fn estimate_lambda_max(op: &DMatrix<f64>) -> f64 {
    let n = op.nrows();
    if n == 0 {
        return 0.0;
    }

    // Deterministic start vector that is not constant, since the constant
    // vector spans the null space of a graph Laplacian.
    let mut x: Vec<f64> = (0..n)
        .map(|j| {
            let h = (j as u64 + 1).wrapping_mul(2654435769) % 4294967296;
            h as f64 / 4294967296.0 + 0.5
        })
        .collect();
    crate::utils::normalize_mut(&mut x);

    let mut lambda = 0.0;
    for _ in 0..LAMBDA_MAX_ITERS {
        let mut y = vec![0.0; n];
        for i in 0..n {
            y[i] = (0..n).map(|j| op[(i, j)] * x[j]).sum();
        }

        let norm = crate::utils::norm(&y);
        if norm < 1e-15 {
            break;
        }
        for i in 0..n {
            x[i] = y[i] / norm;
        }

        let converged = (norm - lambda).abs() <= LAMBDA_MAX_TOL * norm;
        lambda = norm;
        if converged {
            break;
        }
    }

    lambda * LAMBDA_MAX_MARGIN
}
