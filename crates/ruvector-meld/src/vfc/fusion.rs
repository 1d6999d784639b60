//! Fusion of the spectrogram with the smoothed signal
//!
//! The spectrogram is reduced to its leading principal components and the
//! smoothed signal is appended as one more column, rescaled so that its
//! range matches the widest principal component times `weight`.

use nalgebra::DMatrix;

use crate::decomposition::Pca;
use crate::error::{MeldError, Result};
use crate::utils::{max_column_range, value_range, EPS};

/// Factor applied to the smoothed signal: (PC range / signal range) · weight.
/// A constant signal counts as having range 1.
pub fn fusion_scale(components: &DMatrix<f64>, smoothed: &[f64], weight: f64) -> f64 {
    let range_dim = max_column_range(components);
    let range_signal = value_range(smoothed);
    let divisor = if range_signal < EPS { 1.0 } else { range_signal };
    range_dim / divisor * weight
}

/// N×(n_components + 1) feature matrix: principal components of the
/// spectrogram followed by the rescaled smoothed signal
pub fn fuse(
    spectrogram: &DMatrix<f64>,
    smoothed: &[f64],
    weight: f64,
    n_components: usize,
) -> Result<DMatrix<f64>> {
    let n = spectrogram.nrows();
    if smoothed.len() != n {
        return Err(MeldError::shape_mismatch(
            format!("{} smoothed values", n),
            (smoothed.len(), 1),
        ));
    }
    if !weight.is_finite() {
        return Err(MeldError::invalid_parameter(
            "weight",
            format!("must be finite, got {}", weight),
        ));
    }

    let components = Pca::new(n_components).fit_transform(spectrogram)?;
    let scale = fusion_scale(&components, smoothed, weight);

    let k = components.ncols();
    let mut fused = components.insert_column(k, 0.0);
    for (i, &v) in smoothed.iter().enumerate() {
        fused[(i, k)] = v * scale;
    }
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrogram(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, n, |i, j| ((i + 1) as f64 * (j as f64 * 0.7).cos()).tanh().abs())
    }

    #[test]
    fn test_shape_and_last_column_range() {
        let sg = spectrogram(8);
        let smoothed: Vec<f64> = (0..8).map(|i| i as f64 * 0.25).collect();
        let fused = fuse(&sg, &smoothed, 2.0, 3).unwrap();
        assert_eq!(fused.shape(), (8, 4));

        let pcs = fused.columns(0, 3).into_owned();
        let last: Vec<f64> = fused.column(3).iter().copied().collect();
        let expected = max_column_range(&pcs) * 2.0;
        assert!((value_range(&last) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_constant_signal_does_not_divide_by_zero() {
        let sg = spectrogram(6);
        let fused = fuse(&sg, &[0.5; 6], 1.0, 2).unwrap();
        assert!(fused.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            fuse(&spectrogram(5), &[1.0; 4], 1.0, 2),
            Err(MeldError::ShapeMismatch { .. })
        ));
    }
}
