//! K-means clustering
//!
//! k-means++ seeding followed by Lloyd iterations, restarted `n_init`
//! times from one seeded generator; the run with the lowest inertia wins.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::ClusteringPrimitive;
use crate::config::KMeansConfig;
use crate::error::{MeldError, Result};
use crate::utils::squared_euclidean;

/// Outcome of one k-means run
#[derive(Debug, Clone)]
struct Run {
    labels: Vec<usize>,
    centroids: Vec<Vec<f64>>,
    inertia: f64,
    iterations: usize,
}

/// Seeded k-means
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
    centroids: Option<Vec<Vec<f64>>>,
    inertia: Option<f64>,
}

impl KMeans {
    /// Create with configuration
    pub fn new(config: KMeansConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            centroids: None,
            inertia: None,
        })
    }

    /// Create with just number of clusters
    pub fn with_k(k: usize) -> Result<Self> {
        Self::new(KMeansConfig::with_k(k))
    }

    /// Current configuration
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Centroids of the last fit, one per cluster
    pub fn centroids(&self) -> Option<&[Vec<f64>]> {
        self.centroids.as_deref()
    }

    /// Sum of squared distances to the nearest centroid after the last fit
    pub fn inertia(&self) -> Option<f64> {
        self.inertia
    }

    /// k-means++ seeding: each new centroid is drawn with probability
    /// proportional to its squared distance from the nearest chosen one
    fn init_centroids(&self, points: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n = points.len();
        let k = self.config.n_clusters;
        let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
        centroids.push(points[rng.gen_range(0..n)].clone());

        let mut distances: Vec<f64> = points
            .iter()
            .map(|p| squared_euclidean(p, &centroids[0]))
            .collect();

        for _ in 1..k {
            let total: f64 = distances.iter().sum();
            let chosen = if total > 0.0 {
                let threshold = rng.gen::<f64>() * total;
                let mut cumsum = 0.0;
                let mut chosen = n - 1;
                for (i, &d) in distances.iter().enumerate() {
                    cumsum += d;
                    if cumsum >= threshold && d > 0.0 {
                        chosen = i;
                        break;
                    }
                }
                chosen
            } else {
                // All points coincide with a centroid
                rng.gen_range(0..n)
            };

            let centroid = points[chosen].clone();
            for (d, p) in distances.iter_mut().zip(points) {
                *d = d.min(squared_euclidean(p, &centroid));
            }
            centroids.push(centroid);
        }

        centroids
    }

    /// Nearest centroid and its squared distance
    fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (c, centroid) in centroids.iter().enumerate() {
            let dist = squared_euclidean(point, centroid);
            if dist < best.1 {
                best = (c, dist);
            }
        }
        best
    }

    fn run_once(&self, points: &[Vec<f64>], tolerance: f64, rng: &mut StdRng) -> Run {
        let n = points.len();
        let dim = points[0].len();
        let k = self.config.n_clusters;

        let mut centroids = self.init_centroids(points, rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for iter in 0..self.config.max_iter {
            iterations = iter + 1;

            // Assign points to nearest centroid
            let mut distances = vec![0.0; n];
            for (i, point) in points.iter().enumerate() {
                let (c, d) = Self::nearest(point, &centroids);
                labels[i] = c;
                distances[i] = d;
            }

            // Update centroids
            let mut sums = vec![vec![0.0; dim]; k];
            let mut counts = vec![0usize; k];
            for (point, &c) in points.iter().zip(&labels) {
                counts[c] += 1;
                for (s, &x) in sums[c].iter_mut().zip(point) {
                    *s += x;
                }
            }

            let mut shift = 0.0;
            for c in 0..k {
                let updated = if counts[c] > 0 {
                    sums[c].iter().map(|s| s / counts[c] as f64).collect()
                } else {
                    // Empty cluster: move it to the worst-fitted point
                    let far = distances
                        .iter()
                        .enumerate()
                        .fold((0, f64::NEG_INFINITY), |best, (i, &d)| {
                            if d > best.1 {
                                (i, d)
                            } else {
                                best
                            }
                        })
                        .0;
                    distances[far] = 0.0;
                    points[far].clone()
                };
                shift += squared_euclidean(&centroids[c], &updated);
                centroids[c] = updated;
            }

            if shift <= tolerance {
                break;
            }
        }

        // Final assignment against the converged centroids
        let mut inertia = 0.0;
        for (i, point) in points.iter().enumerate() {
            let (c, d) = Self::nearest(point, &centroids);
            labels[i] = c;
            inertia += d;
        }

        Run {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// Absolute convergence threshold: `tolerance` times the mean feature variance
fn scaled_tolerance(points: &[Vec<f64>], tolerance: f64) -> f64 {
    let n = points.len() as f64;
    let dim = points[0].len();
    if dim == 0 {
        return 0.0;
    }
    let mut total_variance = 0.0;
    for j in 0..dim {
        let mean = points.iter().map(|p| p[j]).sum::<f64>() / n;
        total_variance += points.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / n;
    }
    tolerance * total_variance / dim as f64
}

impl ClusteringPrimitive for KMeans {
    fn configure(&mut self, config: &KMeansConfig) -> Result<()> {
        config.validate()?;
        self.config = config.clone();
        self.centroids = None;
        self.inertia = None;
        Ok(())
    }

    fn n_clusters(&self) -> usize {
        self.config.n_clusters
    }

    fn fit_predict(&mut self, features: &DMatrix<f64>) -> Result<Vec<usize>> {
        let (n, _) = features.shape();
        if n == 0 {
            return Err(MeldError::empty_input("k-means on an empty feature matrix"));
        }
        if self.config.n_clusters > n {
            return Err(MeldError::invalid_parameter(
                "n_clusters",
                format!(
                    "{} clusters requested for {} samples",
                    self.config.n_clusters, n
                ),
            ));
        }

        let points: Vec<Vec<f64>> = features
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        let tolerance = scaled_tolerance(&points, self.config.tolerance);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<Run> = None;
        for init in 0..self.config.n_init {
            let run = self.run_once(&points, tolerance, &mut rng);
            trace!(init, inertia = run.inertia, iterations = run.iterations, "k-means run");
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let best = best.ok_or_else(|| MeldError::invalid_parameter("n_init", "must be at least 1"))?;
        debug!(
            samples = n,
            k = self.config.n_clusters,
            inertia = best.inertia,
            "k-means finished"
        );

        self.centroids = Some(best.centroids);
        self.inertia = Some(best.inertia);
        Ok(best.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> DMatrix<f64> {
        // Three well separated groups in 2-D
        let pts = [
            (0.0, 0.0),
            (0.1, 0.2),
            (-0.1, 0.1),
            (10.0, 10.0),
            (10.2, 9.9),
            (9.9, 10.1),
            (-10.0, 5.0),
            (-10.1, 5.2),
            (-9.8, 4.9),
        ];
        DMatrix::from_fn(pts.len(), 2, |i, j| if j == 0 { pts[i].0 } else { pts[i].1 })
    }

    #[test]
    fn test_separates_blobs() {
        let mut km = KMeans::with_k(3).unwrap();
        let labels = km.fit_predict(&blobs()).unwrap();

        assert_eq!(labels.len(), 9);
        for group in labels.chunks(3) {
            assert!(group.iter().all(|&l| l == group[0]));
        }
        assert_ne!(labels[0], labels[3]);
        assert_ne!(labels[3], labels[6]);
        assert_ne!(labels[0], labels[6]);
        assert!(km.inertia().unwrap() < 1.0);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let data = blobs();
        let a = KMeans::with_k(2).unwrap().fit_predict(&data).unwrap();
        let b = KMeans::with_k(2).unwrap().fit_predict(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_clusters() {
        let mut km = KMeans::with_k(20).unwrap();
        assert!(matches!(
            km.fit_predict(&blobs()),
            Err(MeldError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_identical_points() {
        let data = DMatrix::from_element(5, 3, 1.0);
        let mut km = KMeans::with_k(2).unwrap();
        let labels = km.fit_predict(&data).unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(km.inertia().unwrap(), 0.0);
    }

    #[test]
    fn test_configure_resets_fit() {
        let mut km = KMeans::with_k(3).unwrap();
        km.fit_predict(&blobs()).unwrap();
        km.configure(&KMeansConfig::with_k(2)).unwrap();
        assert_eq!(km.n_clusters(), 2);
        assert!(km.centroids().is_none());
    }
}
