//! Concrete graph adapters built from a weight matrix.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{degrees, row_stochastic, FourierBasis, Graph, SpectralGraph};
use crate::error::{MeldError, Result};
use crate::spectral::{estimate_lambda_max, ChebyshevExpansion, ScaledLaplacian};

/// Tolerance for the symmetry check on weight matrices
const SYMMETRY_TOL: f64 = 1e-10;

/// Laplacian normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaplacianNorm {
    /// Unnormalized: L = D - W
    #[default]
    Combinatorial,
    /// Symmetric: L_sym = I - D^{-1/2} W D^{-1/2}
    Normalized,
}

/// Weighted undirected graph known only through its weights.
///
/// Carries no Laplacian or Fourier basis, so spectral operations reject it.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    weights: DMatrix<f64>,
}

impl WeightedGraph {
    /// Build from a dense symmetric, non-negative weight matrix
    pub fn from_adjacency(weights: DMatrix<f64>) -> Result<Self> {
        let (rows, cols) = weights.shape();
        if rows != cols {
            return Err(MeldError::shape_mismatch("a square weight matrix", (rows, cols)));
        }
        if rows == 0 {
            return Err(MeldError::empty_input("graph has no vertices"));
        }
        for i in 0..rows {
            for j in 0..cols {
                let w = weights[(i, j)];
                if !w.is_finite() || w < 0.0 {
                    return Err(MeldError::invalid_parameter(
                        "adjacency",
                        format!("weight ({}, {}) = {} must be finite and non-negative", i, j, w),
                    ));
                }
                if (w - weights[(j, i)]).abs() > SYMMETRY_TOL {
                    return Err(MeldError::invalid_parameter(
                        "adjacency",
                        format!("weights ({0}, {1}) and ({1}, {0}) differ", i, j),
                    ));
                }
            }
        }
        Ok(Self { weights })
    }

    /// Build from undirected edges `(u, v, weight)`
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut weights = DMatrix::zeros(n, n);
        for &(u, v, w) in edges {
            if u >= n || v >= n {
                return Err(MeldError::invalid_parameter(
                    "edges",
                    format!("edge ({}, {}) out of range for {} vertices", u, v, n),
                ));
            }
            weights[(u, v)] += w;
            if u != v {
                weights[(v, u)] += w;
            }
        }
        Self::from_adjacency(weights)
    }
}

impl Graph for WeightedGraph {
    fn vertex_count(&self) -> usize {
        self.weights.nrows()
    }

    fn adjacency(&self) -> &DMatrix<f64> {
        &self.weights
    }

    fn diffusion_operator(&self) -> DMatrix<f64> {
        row_stochastic(&self.weights)
    }

    fn kind(&self) -> &'static str {
        "WeightedGraph"
    }
}

/// Weighted graph with a Laplacian and cached Fourier basis
#[derive(Debug, Clone)]
pub struct LaplacianGraph {
    graph: WeightedGraph,
    laplacian: DMatrix<f64>,
    norm: LaplacianNorm,
    basis: Option<FourierBasis>,
}

impl LaplacianGraph {
    /// Attach a Laplacian of the given normalization to a weighted graph
    pub fn new(graph: WeightedGraph, norm: LaplacianNorm) -> Self {
        let laplacian = build_laplacian(graph.adjacency(), norm);
        Self {
            graph,
            laplacian,
            norm,
            basis: None,
        }
    }

    /// Combinatorial-Laplacian graph from a dense weight matrix
    pub fn from_adjacency(weights: DMatrix<f64>) -> Result<Self> {
        Ok(Self::new(
            WeightedGraph::from_adjacency(weights)?,
            LaplacianNorm::Combinatorial,
        ))
    }

    /// Combinatorial-Laplacian graph from undirected edges
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        Ok(Self::new(
            WeightedGraph::from_edges(n, edges)?,
            LaplacianNorm::Combinatorial,
        ))
    }

    /// Laplacian normalization in use
    pub fn norm(&self) -> LaplacianNorm {
        self.norm
    }

    /// Drop the spectral capability, keeping only the weights
    pub fn into_weighted(self) -> WeightedGraph {
        self.graph
    }
}

fn build_laplacian(w: &DMatrix<f64>, norm: LaplacianNorm) -> DMatrix<f64> {
    let n = w.nrows();
    let d = degrees(w);
    match norm {
        LaplacianNorm::Combinatorial => DMatrix::from_diagonal(&DVector::from_vec(d)) - w,
        LaplacianNorm::Normalized => {
            let inv_sqrt: Vec<f64> = d
                .iter()
                .map(|&di| if di > 0.0 { 1.0 / di.sqrt() } else { 0.0 })
                .collect();
            DMatrix::from_fn(n, n, |i, j| {
                let identity = if i == j && d[i] > 0.0 { 1.0 } else { 0.0 };
                identity - inv_sqrt[i] * w[(i, j)] * inv_sqrt[j]
            })
        }
    }
}

impl Graph for LaplacianGraph {
    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn adjacency(&self) -> &DMatrix<f64> {
        self.graph.adjacency()
    }

    fn diffusion_operator(&self) -> DMatrix<f64> {
        self.graph.diffusion_operator()
    }

    fn kind(&self) -> &'static str {
        "LaplacianGraph"
    }

    fn as_spectral(&self) -> Option<&dyn SpectralGraph> {
        Some(self)
    }

    fn as_spectral_mut(&mut self) -> Option<&mut dyn SpectralGraph> {
        Some(self)
    }
}

impl SpectralGraph for LaplacianGraph {
    fn laplacian(&self) -> &DMatrix<f64> {
        &self.laplacian
    }

    fn compute_fourier_basis(&mut self) -> Result<()> {
        if self.basis.is_some() {
            return Ok(());
        }
        let n = self.vertex_count();
        debug!(n, "computing Fourier basis");

        let eigen = SymmetricEigen::new(self.laplacian.clone());
        let values: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
        let order = crate::utils::argsort(&values);

        let eigenvalues = DVector::from_iterator(n, order.iter().map(|&k| values[k]));
        let eigenvectors = DMatrix::from_fn(n, n, |i, j| eigen.eigenvectors[(i, order[j])]);

        self.basis = Some(FourierBasis {
            eigenvalues,
            eigenvectors,
        });
        Ok(())
    }

    fn fourier_basis(&self) -> Option<&FourierBasis> {
        self.basis.as_ref()
    }

    fn estimate_lmax(&self) -> f64 {
        match &self.basis {
            Some(basis) => basis.lambda_max(),
            None => estimate_lambda_max(&self.laplacian),
        }
    }

    fn apply_spectral_filter(
        &self,
        kernel: &dyn Fn(f64) -> f64,
        signal: &DMatrix<f64>,
        degree: usize,
    ) -> DMatrix<f64> {
        let lambda_max = self.estimate_lmax();
        let scaled = ScaledLaplacian::from_operator(&self.laplacian, lambda_max);
        ChebyshevExpansion::from_kernel(kernel, scaled.lambda_max(), degree).apply(&scaled, signal)
    }
}
