//! Windowed graph-Fourier spectrograms
//!
//! For each window the centred signal is spread along the window's rows,
//! projected onto the Fourier basis and normalized per column; the
//! transposed result is saturated with [`activate`] and the scales are
//! summed into one N×N map.

use nalgebra::DMatrix;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::window::Window;
use crate::utils::normalize_columns_mut;

/// Sensitivity the pipeline passes to [`activate`]
pub const ACTIVATION_SENSITIVITY: f64 = 1.0;

/// Saturating nonlinearity tanh(α·|x|), entrywise
pub fn activate(x: &DMatrix<f64>, alpha: f64) -> DMatrix<f64> {
    x.map(|v| (alpha * v.abs()).tanh())
}

/// Normalized spectrogram of `signal` under one window (before activation).
///
/// Computes normalize_columns(Uᵀ · (W ⊙ s 1ᵀ))ᵀ where row i of the window
/// is scaled by `signal[i]`.
pub fn window_spectrogram(signal: &[f64], window: &Window, eigenvectors: &DMatrix<f64>) -> DMatrix<f64> {
    let mut projected = match window {
        Window::Dense(w) => {
            let mut weighted = w.clone();
            for (mut row, &s) in weighted.row_iter_mut().zip(signal) {
                row *= s;
            }
            eigenvectors.transpose() * weighted
        }
        Window::Sparse(w) => {
            // Uᵀ C = (Cᵀ U)ᵀ keeps the sparse factor on the left
            let weighted = w.scale_rows(signal);
            weighted.transpose().mul_dense(eigenvectors).transpose()
        }
    };
    normalize_columns_mut(&mut projected);
    projected.transpose()
}

/// Activated per-scale spectrograms, in window order
pub fn spectrogram_history(
    signal: &[f64],
    windows: &[Window],
    eigenvectors: &DMatrix<f64>,
) -> Vec<DMatrix<f64>> {
    let per_scale = |(scale, window): (usize, &Window)| {
        trace!(scale, "computing spectrogram");
        activate(
            &window_spectrogram(signal, window, eigenvectors),
            ACTIVATION_SENSITIVITY,
        )
    };

    #[cfg(feature = "parallel")]
    {
        windows.par_iter().enumerate().map(per_scale).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        windows.iter().enumerate().map(per_scale).collect()
    }
}

/// Entrywise sum of the per-scale spectrograms, accumulated in order
pub fn aggregate(history: &[DMatrix<f64>], n: usize) -> DMatrix<f64> {
    history
        .iter()
        .fold(DMatrix::zeros(n, n), |acc, scale| acc + scale)
}
