//! Clustering of fused vertex features
//!
//! The pipeline sees its clustering backend through [`ClusteringPrimitive`]
//! and post-processes whatever labels it returns with
//! [`relabel_by_signal`], so that label 0 is always the lowest-signal
//! region no matter how the backend happened to number its clusters.

mod kmeans;

pub use kmeans::KMeans;

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::config::KMeansConfig;
use crate::error::{MeldError, Result};
use crate::utils::{argsort, inverse_permutation};

/// A clustering algorithm over the rows of a feature matrix
pub trait ClusteringPrimitive {
    /// Replace the cluster count and tunables
    fn configure(&mut self, config: &KMeansConfig) -> Result<()>;

    /// Number of clusters requested
    fn n_clusters(&self) -> usize;

    /// Cluster the rows of `features`, one label per row
    fn fit_predict(&mut self, features: &DMatrix<f64>) -> Result<Vec<usize>>;
}

/// Renumber clusters by ascending mean of `signal` over their members.
///
/// Only clusters that actually occur are numbered, so the output uses
/// labels `0..m` for the `m` distinct input labels. Ties keep the order
/// of the original cluster ids. Applying it to its own output is a no-op.
pub fn relabel_by_signal(labels: &[usize], signal: &[f64]) -> Result<Vec<usize>> {
    if labels.len() != signal.len() {
        return Err(MeldError::shape_mismatch(
            format!("{} signal values, one per label", labels.len()),
            (signal.len(), 1),
        ));
    }

    let mut totals: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for (&label, &value) in labels.iter().zip(signal) {
        let entry = totals.entry(label).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let ids: Vec<usize> = totals.keys().copied().collect();
    let means: Vec<f64> = totals.values().map(|&(sum, count)| sum / count as f64).collect();
    let rank = inverse_permutation(&argsort(&means));

    let remap: BTreeMap<usize, usize> = ids.into_iter().zip(rank).collect();
    Ok(labels.iter().map(|label| remap[label]).collect())
}

/// Mean of `signal` over the members of each label `0..k`
pub fn cluster_means(labels: &[usize], signal: &[f64], k: usize) -> Vec<f64> {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (&label, &value) in labels.iter().zip(signal) {
        if label < k {
            sums[label] += value;
            counts[label] += 1;
        }
    }
    sums.iter()
        .zip(&counts)
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relabel_orders_by_mean() {
        let labels = vec![2, 2, 0, 0, 1, 1];
        let signal = vec![0.1, 0.2, 5.0, 6.0, -3.0, -2.0];
        let relabeled = relabel_by_signal(&labels, &signal).unwrap();

        // cluster 1 (mean -2.5) -> 0, cluster 2 (0.15) -> 1, cluster 0 (5.5) -> 2
        assert_eq!(relabeled, vec![1, 1, 2, 2, 0, 0]);

        let means = cluster_means(&relabeled, &signal, 3);
        assert!(means[0] <= means[1] && means[1] <= means[2]);
    }

    #[test]
    fn test_relabel_idempotent() {
        let labels = vec![3, 1, 1, 0, 3, 2];
        let signal = vec![1.0, -1.0, -2.0, 4.0, 2.0, 0.0];
        let once = relabel_by_signal(&labels, &signal).unwrap();
        let twice = relabel_by_signal(&once, &signal).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_relabel_compacts_missing_ids() {
        let labels = vec![7, 7, 4];
        let signal = vec![1.0, 1.0, 0.0];
        assert_eq!(relabel_by_signal(&labels, &signal).unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn test_relabel_length_mismatch() {
        assert!(matches!(
            relabel_by_signal(&[0, 1], &[1.0]),
            Err(MeldError::ShapeMismatch { .. })
        ));
    }
}
