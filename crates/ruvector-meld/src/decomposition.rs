//! Principal component analysis
//!
//! Exact PCA through the eigendecomposition of the sample covariance.
//! Data are centred but not scaled. Components are sorted by explained
//! variance, and each is signed so that its largest-magnitude loading is
//! positive, which makes projections reproducible across runs.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeldError, Result};

/// Principal component analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pca {
    n_components: usize,
    /// Feature means of the training data
    mean: Option<DVector<f64>>,
    /// Principal axes, one column per component (n_features × n_components)
    components: Option<DMatrix<f64>>,
    /// Variance along each principal axis
    explained_variance: Option<DVector<f64>>,
}

impl Pca {
    /// Unfitted PCA keeping `n_components` components
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            mean: None,
            components: None,
            explained_variance: None,
        }
    }

    /// Number of components kept
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Principal axes, if fitted
    pub fn components(&self) -> Option<&DMatrix<f64>> {
        self.components.as_ref()
    }

    /// Explained variance per component, if fitted
    pub fn explained_variance(&self) -> Option<&DVector<f64>> {
        self.explained_variance.as_ref()
    }

    /// Fit the principal axes of the rows of `data` (samples × features)
    pub fn fit(&mut self, data: &DMatrix<f64>) -> Result<()> {
        let (n_samples, n_features) = data.shape();
        if n_samples == 0 || n_features == 0 {
            return Err(MeldError::empty_input("PCA input has no samples or features"));
        }
        let k = self.n_components;
        if k == 0 || k > n_samples.min(n_features) {
            return Err(MeldError::invalid_parameter(
                "n_components",
                format!(
                    "{} components need at least as many samples and features, got {}x{}",
                    k, n_samples, n_features
                ),
            ));
        }

        let mean = DVector::from_iterator(n_features, data.column_iter().map(|c| c.mean()));
        let mut centred = data.clone();
        for (mut column, &mu) in centred.column_iter_mut().zip(mean.iter()) {
            column.add_scalar_mut(-mu);
        }

        let dof = n_samples.saturating_sub(1).max(1) as f64;
        let covariance = (centred.transpose() * &centred) / dof;
        let eigen = SymmetricEigen::new(covariance);

        let mut pairs: Vec<(f64, usize)> = eigen
            .eigenvalues
            .iter()
            .copied()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();
        pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut components = DMatrix::zeros(n_features, k);
        let mut variance = DVector::zeros(k);
        for (j, &(value, idx)) in pairs.iter().take(k).enumerate() {
            let axis = eigen.eigenvectors.column(idx);
            let pivot = axis
                .iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            components.set_column(j, &(axis * sign));
            variance[j] = value.max(0.0);
        }

        debug!(
            n_samples,
            n_features,
            n_components = k,
            leading_variance = variance[0],
            "fitted PCA"
        );

        self.mean = Some(mean);
        self.components = Some(components);
        self.explained_variance = Some(variance);
        Ok(())
    }

    /// Project the rows of `data` onto the fitted axes (samples × n_components)
    pub fn transform(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (mean, components) = match (&self.mean, &self.components) {
            (Some(mean), Some(components)) => (mean, components),
            _ => {
                return Err(MeldError::invalid_parameter(
                    "pca",
                    "transform called before fit",
                ))
            }
        };
        if data.ncols() != mean.len() {
            return Err(MeldError::shape_mismatch(
                format!("{} features", mean.len()),
                data.shape(),
            ));
        }

        let mut centred = data.clone();
        for (mut column, &mu) in centred.column_iter_mut().zip(mean.iter()) {
            column.add_scalar_mut(-mu);
        }
        Ok(centred * components)
    }

    /// Fit, then project the training data
    pub fn fit_transform(&mut self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.fit(data)?;
        self.transform(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_dominant_direction() {
        // Points spread along (1, 1) with small noise along (1, -1)
        let data = DMatrix::from_fn(20, 2, |i, j| {
            let t = i as f64 - 10.0;
            let noise = if i % 2 == 0 { 0.05 } else { -0.05 };
            if j == 0 {
                t + noise
            } else {
                t - noise
            }
        });
        let mut pca = Pca::new(1);
        pca.fit(&data).unwrap();

        let axis = pca.components().unwrap().column(0).into_owned();
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((axis[0] - expected).abs() < 1e-3);
        assert!((axis[1] - expected).abs() < 1e-3);
    }

    #[test]
    fn test_variance_sorted_and_projection_centred() {
        let data = DMatrix::from_fn(12, 4, |i, j| ((i * (j + 1)) as f64).sin() + j as f64 * i as f64 * 0.1);
        let mut pca = Pca::new(3);
        let projected = pca.fit_transform(&data).unwrap();

        assert_eq!(projected.shape(), (12, 3));
        let variance = pca.explained_variance().unwrap();
        assert!(variance[0] >= variance[1] && variance[1] >= variance[2]);
        for column in projected.column_iter() {
            assert!(column.mean().abs() < 1e-10);
        }
    }

    #[test]
    fn test_deterministic_sign() {
        let data = DMatrix::from_fn(8, 3, |i, j| (i as f64 - 4.0) * (j as f64 + 1.0));
        let mut pca = Pca::new(1);
        pca.fit(&data).unwrap();
        let axis = pca.components().unwrap().column(0).into_owned();
        let pivot = axis.iter().copied().fold(0.0_f64, |b, x| if x.abs() > b.abs() { x } else { b });
        assert!(pivot > 0.0);
    }

    #[test]
    fn test_too_many_components() {
        let data = DMatrix::from_element(5, 5, 1.0);
        assert!(matches!(
            Pca::new(25).fit(&data),
            Err(MeldError::InvalidParameter { .. })
        ));
    }
}
