//! Graph adapters
//!
//! The filtering and clustering stages only see a graph through two traits:
//! [`Graph`] (vertex count, adjacency, diffusion operator) and
//! [`SpectralGraph`] (Laplacian, Fourier basis, λ_max estimate and the
//! Chebyshev filter primitive). A graph advertises spectral capability
//! through [`Graph::as_spectral`]; operations that need it reject graphs
//! that return `None` with a type mismatch.

mod laplacian;

pub use laplacian::{LaplacianGraph, LaplacianNorm, WeightedGraph};

use nalgebra::{DMatrix, DVector};

use crate::error::Result;

/// Eigendecomposition of a graph Laplacian, eigenvalues ascending
#[derive(Debug, Clone)]
pub struct FourierBasis {
    /// Eigenvalues e, ascending
    pub eigenvalues: DVector<f64>,
    /// Eigenvectors U, one column per eigenvalue
    pub eigenvectors: DMatrix<f64>,
}

impl FourierBasis {
    /// Largest eigenvalue
    pub fn lambda_max(&self) -> f64 {
        self.eigenvalues.iter().copied().fold(0.0, f64::max)
    }
}

/// A weighted graph over a fixed vertex set
pub trait Graph {
    /// Number of vertices N
    fn vertex_count(&self) -> usize;

    /// Symmetric weight matrix W (N×N)
    fn adjacency(&self) -> &DMatrix<f64>;

    /// Diffusion operator (N×N) whose powers define the windows
    fn diffusion_operator(&self) -> DMatrix<f64>;

    /// Short description used in type mismatch errors
    fn kind(&self) -> &'static str;

    /// Spectral view of this graph, if it has one
    fn as_spectral(&self) -> Option<&dyn SpectralGraph> {
        None
    }

    /// Mutable spectral view of this graph, if it has one
    fn as_spectral_mut(&mut self) -> Option<&mut dyn SpectralGraph> {
        None
    }
}

/// A graph with a Laplacian and a (lazily computed) Fourier basis
pub trait SpectralGraph: Graph {
    /// Graph Laplacian L (N×N)
    fn laplacian(&self) -> &DMatrix<f64>;

    /// Compute and cache the eigendecomposition of L. May take some time.
    fn compute_fourier_basis(&mut self) -> Result<()>;

    /// Cached Fourier basis, if computed
    fn fourier_basis(&self) -> Option<&FourierBasis>;

    /// Upper bound on the largest Laplacian eigenvalue
    fn estimate_lmax(&self) -> f64;

    /// Apply h(L) to each column of `signal` via a Chebyshev expansion of
    /// `kernel` of the given degree
    fn apply_spectral_filter(
        &self,
        kernel: &dyn Fn(f64) -> f64,
        signal: &DMatrix<f64>,
        degree: usize,
    ) -> DMatrix<f64>;
}

/// Row-normalize a weight matrix into a random-walk operator P = D⁻¹W.
/// Rows of isolated vertices stay zero.
pub fn row_stochastic(w: &DMatrix<f64>) -> DMatrix<f64> {
    let mut p = w.clone();
    for (i, mut row) in p.row_iter_mut().enumerate() {
        let degree: f64 = w.row(i).sum();
        if degree > 0.0 {
            row /= degree;
        }
    }
    p
}

/// Vertex degrees (row sums of W)
pub fn degrees(w: &DMatrix<f64>) -> Vec<f64> {
    w.row_iter().map(|row| row.sum()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_stochastic() {
        let w = DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let p = row_stochastic(&w);

        assert!((p.row(0).sum() - 1.0).abs() < 1e-12);
        assert!((p[(0, 2)] - 0.75).abs() < 1e-12);
        assert!((p.row(1).sum() - 1.0).abs() < 1e-12);
        // Isolated vertex keeps a zero row
        assert_eq!(p.row(2).sum(), 0.0);
    }
}
