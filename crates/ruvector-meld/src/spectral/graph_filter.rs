//! MELD graph filtering
//!
//! Smooths a signal over a graph with the low-pass kernels
//!
//! - regularized Laplacian: h(λ) = 1 / (1 + (γλ − shift)^order), the exact
//!   solution of argmin_z ½‖x − z‖² + γ zᵀLz for order 1 and no shift;
//! - random walk: h(λ) = (α − λ)^γ on the degree-normalized Laplacian,
//!   i.e. γ steps of a lazy random walk,
//!
//! either exactly, as an explicit matrix function, or through a Chebyshev
//! expansion of h that never forms an inverse or an eigendecomposition.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{estimate_lambda_max, ChebyshevExpansion, ScaledLaplacian};
use crate::config::{FilterConfig, FilterKernel, FilterMethod};
use crate::error::{MeldError, Result};
use crate::graph::{Graph, SpectralGraph};
use crate::sparse::CsrMatrix;
use crate::utils::matrix_power;

/// A graph signal (or a block of signals, one per column)
#[derive(Debug, Clone, PartialEq)]
pub enum SignalData {
    /// Dense matrix
    Dense(DMatrix<f64>),
    /// Sparse matrix
    Sparse(CsrMatrix),
}

impl SignalData {
    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            SignalData::Dense(m) => m.shape(),
            SignalData::Sparse(m) => m.shape(),
        }
    }

    /// Dense copy
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            SignalData::Dense(m) => m.clone(),
            SignalData::Sparse(m) => m.to_dense(),
        }
    }

    /// Whether the signal is stored sparsely
    pub fn is_sparse(&self) -> bool {
        matches!(self, SignalData::Sparse(_))
    }

    /// Wrap `dense` in the same storage as `self`
    fn same_format(&self, dense: DMatrix<f64>) -> SignalData {
        match self {
            SignalData::Dense(_) => SignalData::Dense(dense),
            SignalData::Sparse(_) => SignalData::Sparse(CsrMatrix::from_dense(&dense)),
        }
    }
}

impl From<DMatrix<f64>> for SignalData {
    fn from(m: DMatrix<f64>) -> Self {
        SignalData::Dense(m)
    }
}

impl From<CsrMatrix> for SignalData {
    fn from(m: CsrMatrix) -> Self {
        SignalData::Sparse(m)
    }
}

impl From<&[f64]> for SignalData {
    /// A single signal as an N×1 column
    fn from(v: &[f64]) -> Self {
        SignalData::Dense(DMatrix::from_column_slice(v.len(), 1, v))
    }
}

/// Smooth `signal` over `graph`.
///
/// The signal is `N×p` (one signal per column). A `p×N` input with
/// `p ≠ N` is transposed with a warning, and the result is returned as
/// `N×p`. The output uses the input's storage format.
///
/// # Errors
///
/// - `TypeMismatch` if the graph has no spectral capability
/// - `ShapeMismatch` if neither axis of the signal has length N
/// - `InvalidParameter` for out-of-range filter parameters
/// - `SingularMatrix` if the exact regularized filter cannot be inverted
pub fn meld<G: Graph + ?Sized>(
    signal: &SignalData,
    graph: &G,
    config: &FilterConfig,
) -> Result<SignalData> {
    config.validate()?;

    let spectral = graph.as_spectral().ok_or_else(|| {
        MeldError::type_mismatch("a graph with a Laplacian and Fourier basis", graph.kind())
    })?;

    let n = graph.vertex_count();
    let (rows, cols) = signal.shape();
    let mut x = signal.to_dense();
    if rows != n {
        if cols == n {
            warn!(
                rows,
                cols, "input matrix is column-wise rather than row-wise; transposing (output will be transposed)"
            );
            x = x.transpose();
        } else {
            return Err(MeldError::shape_mismatch(
                format!("{} vertices along either axis", n),
                (rows, cols),
            ));
        }
    }

    debug!(
        n,
        signals = x.ncols(),
        method = ?config.method,
        kernel = ?config.kernel,
        strength = config.strength,
        "applying MELD filter"
    );

    let smoothed = match (config.method, config.kernel) {
        (FilterMethod::Exact, FilterKernel::RegularizedLaplacian) => {
            exact_regularized(spectral, config, &x)?
        }
        (FilterMethod::Exact, FilterKernel::RandomWalk) => exact_random_walk(spectral, config, &x),
        (FilterMethod::Approximate, FilterKernel::RegularizedLaplacian) => {
            let (gamma, shift, order) = (config.strength, config.spectral_shift, config.order);
            let kernel = move |lambda: f64| 1.0 / (1.0 + (gamma * lambda - shift).powi(order as i32));
            spectral.apply_spectral_filter(&kernel, &x, config.chebyshev_degree)
        }
        (FilterMethod::Approximate, FilterKernel::RandomWalk) => {
            approximate_random_walk(spectral, config, &x)
        }
    };

    Ok(signal.same_format(smoothed))
}

/// Smooth a single signal of length N
pub fn meld_vector<G: Graph + ?Sized>(
    signal: &[f64],
    graph: &G,
    config: &FilterConfig,
) -> Result<Vec<f64>> {
    let smoothed = meld(&SignalData::from(signal), graph, config)?.to_dense();
    Ok(smoothed.iter().copied().collect())
}

/// (I + (γL − shift·I)^order)⁻¹ applied to X
fn exact_regularized(
    graph: &dyn SpectralGraph,
    config: &FilterConfig,
    x: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = graph.vertex_count();
    let identity = DMatrix::<f64>::identity(n, n);
    let shifted = graph.laplacian() * config.strength - &identity * config.spectral_shift;
    let system = &identity + matrix_power(&shifted, config.order);

    let inverse = system.try_inverse().ok_or_else(|| {
        MeldError::singular_matrix(format!(
            "I + (γL - shift·I)^{} with γ = {}, shift = {}",
            config.order, config.strength, config.spectral_shift
        ))
    })?;

    Ok(inverse.transpose() * x)
}

/// Degree-normalized Laplacian (L·D)ᵀ with D = diag(1/deg).
/// Isolated vertices get a zero column scale.
fn random_walk_laplacian(graph: &dyn SpectralGraph) -> DMatrix<f64> {
    let w = graph.adjacency();
    let inv_degree: Vec<f64> = w
        .column_iter()
        .map(|col| {
            let d = col.sum();
            if d > 0.0 {
                1.0 / d
            } else {
                0.0
            }
        })
        .collect();
    let d = DMatrix::from_diagonal(&DVector::from_vec(inv_degree));
    (graph.laplacian() * d).transpose()
}

/// (α·I − (L·D)ᵀ)^γ applied to X
fn exact_random_walk(
    graph: &dyn SpectralGraph,
    config: &FilterConfig,
    x: &DMatrix<f64>,
) -> DMatrix<f64> {
    let n = graph.vertex_count();
    let walk = DMatrix::<f64>::identity(n, n) * config.alpha - random_walk_laplacian(graph);
    // validate() guarantees an integral, non-negative step count
    matrix_power(&walk, config.strength as u32) * x
}

/// Chebyshev approximation of (α − λ)^γ on the degree-normalized
/// Laplacian, which is passed by value rather than swapped into the graph
fn approximate_random_walk(
    graph: &dyn SpectralGraph,
    config: &FilterConfig,
    x: &DMatrix<f64>,
) -> DMatrix<f64> {
    let operator = random_walk_laplacian(graph);
    let scaled = ScaledLaplacian::from_operator(&operator, estimate_lambda_max(&operator));

    let (alpha, steps) = (config.alpha, config.strength);
    let kernel = move |lambda: f64| {
        let base = alpha - lambda;
        // Fractional powers of a negative base only occur in the λ_max
        // margin, past the last eigenvalue.
        if base < 0.0 && steps.fract() != 0.0 {
            0.0
        } else {
            base.powf(steps)
        }
    };

    ChebyshevExpansion::from_kernel(kernel, scaled.lambda_max(), config.chebyshev_degree)
        .apply(&scaled, x)
}
