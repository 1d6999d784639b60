//! Multi-scale diffusion windows
//!
//! A window at scale t is built from the graph's diffusion operator P,
//! column-normalized and stored transposed, so every stored row has unit
//! L2 norm.

use nalgebra::DMatrix;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Representation;
use crate::sparse::CsrMatrix;
use crate::utils::{matrix_power, normalize_columns_mut};

/// A normalized N×N window in the estimator's representation
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    /// Dense window, normalize(P^t)ᵀ
    Dense(DMatrix<f64>),
    /// Sparse window, normalize(P.^t)ᵀ with an elementwise power
    Sparse(CsrMatrix),
}

impl Window {
    /// Number of vertices
    pub fn dim(&self) -> usize {
        match self {
            Window::Dense(m) => m.nrows(),
            Window::Sparse(m) => m.rows,
        }
    }

    /// Dense copy
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Window::Dense(m) => m.clone(),
            Window::Sparse(m) => m.to_dense(),
        }
    }

    /// Representation this window is stored in
    pub fn representation(&self) -> Representation {
        match self {
            Window::Dense(_) => Representation::Dense,
            Window::Sparse(_) => Representation::Sparse,
        }
    }
}

/// Build one window of `scale` from the diffusion operator.
///
/// Dense windows use the matrix power P^t. Sparse windows raise each
/// stored entry of P to t instead, which differs from P^t for t > 1.
pub fn build_window(operator: &DMatrix<f64>, scale: u32, representation: Representation) -> Window {
    match representation {
        Representation::Dense => {
            let mut window = matrix_power(operator, scale);
            normalize_columns_mut(&mut window);
            Window::Dense(window.transpose())
        }
        Representation::Sparse => {
            let exponent = i32::try_from(scale).unwrap_or(i32::MAX);
            let window = CsrMatrix::from_dense(operator)
                .elementwise_powi(exponent)
                .normalize_columns()
                .transpose();
            Window::Sparse(window)
        }
    }
}

/// Build one window per scale, in scale order
pub fn build_windows(
    operator: &DMatrix<f64>,
    scales: &[u32],
    representation: Representation,
) -> Vec<Window> {
    let build = |&scale: &u32| {
        trace!(scale, ?representation, "building window");
        build_window(operator, scale, representation)
    };

    #[cfg(feature = "parallel")]
    {
        scales.par_iter().map(build).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        scales.iter().map(build).collect()
    }
}
