//! Vertex-frequency clustering
//!
//! [`VertexFrequencyCluster`] groups the vertices of a graph using joint
//! vertex/frequency features of a signal:
//!
//! 1. `fit`: builds one normalized diffusion window per scale and caches
//!    the graph's Fourier basis;
//! 2. `transform`: computes the activated windowed-Fourier spectrogram of
//!    the centred raw signal, sums it over scales, reduces it with PCA and
//!    appends the rescaled smoothed signal;
//! 3. `predict`: clusters the fused features with k-means and renumbers
//!    the clusters by ascending mean raw signal.
//!
//! The stages are strictly ordered. Refitting drops every later result.

mod fusion;
mod spectrogram;
mod window;

pub use fusion::{fuse, fusion_scale};
pub use spectrogram::{activate, aggregate, spectrogram_history, window_spectrogram, ACTIVATION_SENSITIVITY};
pub use window::{build_window, build_windows, Window};

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::cluster::{relabel_by_signal, ClusteringPrimitive, KMeans};
use crate::config::{KMeansConfig, Representation, VfcConfig};
use crate::error::{MeldError, Result, Stage};
use crate::graph::Graph;
use crate::spectral::SignalData;
use crate::utils::center;

/// Output of `fit`
#[derive(Debug, Clone)]
struct Fitted {
    n: usize,
    windows: Vec<Window>,
    eigenvectors: DMatrix<f64>,
}

/// Output of `transform`
#[derive(Debug, Clone)]
struct Transformed {
    /// Mean-centred raw signal
    res: Vec<f64>,
    /// Smoothed signal as given
    ees: Vec<f64>,
    /// Activated spectrogram per scale
    history: Vec<DMatrix<f64>>,
    /// Sum of `history`
    spectrogram: DMatrix<f64>,
    /// PCA components plus the rescaled smoothed signal
    features: DMatrix<f64>,
}

#[derive(Debug, Clone)]
enum State {
    Unfit,
    Fit(Fitted),
    Transformed(Fitted, Transformed),
    Predicted(Fitted, Transformed, Vec<usize>),
}

/// Vertex-frequency clustering estimator
#[derive(Debug, Clone)]
pub struct VertexFrequencyCluster {
    config: VfcConfig,
    clusterer: KMeans,
    state: State,
}

impl VertexFrequencyCluster {
    /// Create an unfitted estimator
    pub fn new(config: VfcConfig) -> Result<Self> {
        config.validate()?;
        let clusterer = KMeans::new(KMeansConfig {
            n_clusters: config.n_clusters,
            ..config.kmeans.clone()
        })?;
        Ok(Self {
            config,
            clusterer,
            state: State::Unfit,
        })
    }

    /// Estimator with `n_clusters` clusters and default settings
    pub fn with_clusters(n_clusters: usize) -> Result<Self> {
        Self::new(VfcConfig::with_clusters(n_clusters))
    }

    /// Configuration
    pub fn config(&self) -> &VfcConfig {
        &self.config
    }

    /// Current pipeline stage
    pub fn stage(&self) -> Stage {
        match self.state {
            State::Unfit => Stage::Unfit,
            State::Fit(..) => Stage::Fit,
            State::Transformed(..) => Stage::Transformed,
            State::Predicted(..) => Stage::Predicted,
        }
    }

    fn fitted(&self) -> Option<&Fitted> {
        match &self.state {
            State::Unfit => None,
            State::Fit(f) | State::Transformed(f, _) | State::Predicted(f, _, _) => Some(f),
        }
    }

    fn transformed(&self) -> Option<&Transformed> {
        match &self.state {
            State::Transformed(_, t) | State::Predicted(_, t, _) => Some(t),
            _ => None,
        }
    }

    /// Build the windows and cache the Fourier basis of `graph`.
    ///
    /// Any earlier transform or prediction is discarded.
    pub fn fit<G: Graph + ?Sized>(&mut self, graph: &mut G) -> Result<&mut Self> {
        let kind = graph.kind();
        let n = graph.vertex_count();
        if n == 0 {
            return Err(MeldError::empty_input("graph has no vertices"));
        }
        if n < self.config.n_components {
            return Err(MeldError::invalid_parameter(
                "n_components",
                format!(
                    "{} principal components need at least as many vertices, graph has {}",
                    self.config.n_components, n
                ),
            ));
        }

        let spectral = graph.as_spectral_mut().ok_or_else(|| {
            MeldError::type_mismatch("a graph with a Laplacian and Fourier basis", kind)
        })?;

        let operator = spectral.diffusion_operator();
        let scales = self.config.resolved_window_sizes();
        if self.config.representation == Representation::Sparse
            && !self.config.suppress_warnings
            && scales.iter().any(|&t| t > 1)
        {
            warn!(
                "sparse windows raise the diffusion operator to each scale entrywise, \
                 which differs from the matrix power used by dense windows"
            );
        }

        spectral.compute_fourier_basis()?;
        let eigenvectors = spectral
            .fourier_basis()
            .map(|basis| basis.eigenvectors.clone())
            .ok_or_else(|| MeldError::empty_input("graph returned no Fourier basis"))?;

        let windows = build_windows(&operator, &scales, self.config.representation);
        debug!(
            n,
            windows = windows.len(),
            representation = ?self.config.representation,
            "fitted vertex-frequency estimator"
        );

        self.state = State::Fit(Fitted {
            n,
            windows,
            eigenvectors,
        });
        Ok(self)
    }

    /// Compute the fused N×(n_components + 1) feature matrix of a raw
    /// signal `res` and its smoothed version `ees`.
    pub fn transform(&mut self, res: &[f64], ees: &[f64], weight: f64) -> Result<DMatrix<f64>> {
        self.transform_data(&SignalData::from(res), &SignalData::from(ees), weight)
    }

    /// [`transform`](Self::transform) for signals stored as N×1 or 1×N
    /// matrices
    pub fn transform_data(
        &mut self,
        res: &SignalData,
        ees: &SignalData,
        weight: f64,
    ) -> Result<DMatrix<f64>> {
        let fitted = self
            .fitted()
            .ok_or_else(|| MeldError::state("transform", Stage::Fit, self.stage()))?;
        let n = fitted.n;
        let res = center(&as_vertex_signal(res, n)?);
        let ees = as_vertex_signal(ees, n)?;

        let history = spectrogram_history(&res, &fitted.windows, &fitted.eigenvectors);
        let spectrogram = aggregate(&history, n);
        let features = fuse(&spectrogram, &ees, weight, self.config.n_components)?;
        debug!(
            n,
            scales = history.len(),
            features = features.ncols(),
            "transformed signal"
        );

        let fitted = self.take_fitted()?;
        let result = features.clone();
        self.state = State::Transformed(
            fitted,
            Transformed {
                res,
                ees,
                history,
                spectrogram,
                features,
            },
        );
        Ok(result)
    }

    /// Cluster the fused features; label 0 has the lowest mean raw signal
    pub fn predict(&mut self) -> Result<Vec<usize>> {
        let transformed = match &self.state {
            State::Unfit => return Err(MeldError::state("predict", Stage::Fit, Stage::Unfit)),
            State::Fit(_) => {
                return Err(MeldError::state("predict", Stage::Transformed, Stage::Fit))
            }
            State::Transformed(_, t) | State::Predicted(_, t, _) => t,
        };

        let raw = self.clusterer.fit_predict(&transformed.features)?;
        let labels = relabel_by_signal(&raw, &transformed.res)?;
        debug!(
            n = labels.len(),
            k = self.clusterer.n_clusters(),
            "predicted cluster labels"
        );

        self.state = match std::mem::replace(&mut self.state, State::Unfit) {
            State::Transformed(f, t) | State::Predicted(f, t, _) => {
                State::Predicted(f, t, labels.clone())
            }
            other => other,
        };
        Ok(labels)
    }

    /// `fit` then `transform`
    pub fn fit_transform<G: Graph + ?Sized>(
        &mut self,
        graph: &mut G,
        res: &[f64],
        ees: &[f64],
        weight: f64,
    ) -> Result<DMatrix<f64>> {
        self.fit(graph)?;
        self.transform(res, ees, weight)
    }

    /// `fit`, `transform` then `predict`
    pub fn fit_predict<G: Graph + ?Sized>(
        &mut self,
        graph: &mut G,
        res: &[f64],
        ees: &[f64],
        weight: f64,
    ) -> Result<Vec<usize>> {
        self.fit_transform(graph, res, ees, weight)?;
        self.predict()
    }

    /// Replace the clustering tunables. `kmeans.n_clusters` becomes the
    /// estimator's cluster count. Predicted labels are dropped; the
    /// transformed features are kept.
    pub fn set_kmeans_params(&mut self, kmeans: KMeansConfig) -> Result<()> {
        self.clusterer.configure(&kmeans)?;
        self.config.n_clusters = kmeans.n_clusters;
        self.config.kmeans = kmeans;

        self.state = match std::mem::replace(&mut self.state, State::Unfit) {
            State::Predicted(f, t, _) => State::Transformed(f, t),
            other => other,
        };
        Ok(())
    }

    fn take_fitted(&mut self) -> Result<Fitted> {
        match std::mem::replace(&mut self.state, State::Unfit) {
            State::Fit(f) | State::Transformed(f, _) | State::Predicted(f, _, _) => Ok(f),
            State::Unfit => Err(MeldError::state("transform", Stage::Fit, Stage::Unfit)),
        }
    }

    /// Vertex count bound at fit time
    pub fn n_vertices(&self) -> Option<usize> {
        self.fitted().map(|f| f.n)
    }

    /// Windows built at fit time, one per scale
    pub fn windows(&self) -> Option<&[Window]> {
        self.fitted().map(|f| f.windows.as_slice())
    }

    /// Cached Fourier basis (eigenvectors as columns)
    pub fn eigenvectors(&self) -> Option<&DMatrix<f64>> {
        self.fitted().map(|f| &f.eigenvectors)
    }

    /// Mean-centred raw signal of the last transform
    pub fn centered_signal(&self) -> Option<&[f64]> {
        self.transformed().map(|t| t.res.as_slice())
    }

    /// Smoothed signal of the last transform
    pub fn smoothed_signal(&self) -> Option<&[f64]> {
        self.transformed().map(|t| t.ees.as_slice())
    }

    /// Activated spectrogram of each scale from the last transform
    pub fn spectrogram_history(&self) -> Option<&[DMatrix<f64>]> {
        self.transformed().map(|t| t.history.as_slice())
    }

    /// Scale-summed spectrogram of the last transform
    pub fn spectrogram(&self) -> Option<&DMatrix<f64>> {
        self.transformed().map(|t| &t.spectrogram)
    }

    /// Fused feature matrix of the last transform
    pub fn features(&self) -> Option<&DMatrix<f64>> {
        self.transformed().map(|t| &t.features)
    }

    /// Labels of the last prediction
    pub fn labels(&self) -> Option<&[usize]> {
        match &self.state {
            State::Predicted(_, _, labels) => Some(labels.as_slice()),
            _ => None,
        }
    }
}

/// Flatten an N×1 or 1×N signal into a length-N vector
fn as_vertex_signal(signal: &SignalData, n: usize) -> Result<Vec<f64>> {
    match signal.shape() {
        (rows, 1) if rows == n => {}
        (1, cols) if cols == n => {}
        shape => {
            return Err(MeldError::shape_mismatch(
                format!("a single signal with one axis of length {}", n),
                shape,
            ))
        }
    }
    Ok(signal.to_dense().iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LaplacianGraph, WeightedGraph};

    /// Two rings of `half` vertices joined by one weak edge
    fn two_rings(half: usize) -> LaplacianGraph {
        let mut edges = Vec::new();
        for offset in [0, half] {
            for i in 0..half {
                edges.push((offset + i, offset + (i + 1) % half, 1.0));
            }
        }
        edges.push((0, half, 0.05));
        LaplacianGraph::from_edges(2 * half, &edges).unwrap()
    }

    fn step_signal(half: usize) -> Vec<f64> {
        (0..2 * half)
            .map(|i| if i < half { -1.0 } else { 1.0 } + 0.01 * (i % 3) as f64)
            .collect()
    }

    fn small_config() -> VfcConfig {
        VfcConfig::with_clusters(2).window_count(3)
    }

    #[test]
    fn test_stage_transitions() {
        let mut g = two_rings(15);
        let signal = step_signal(15);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        assert_eq!(vfc.stage(), Stage::Unfit);

        vfc.fit(&mut g).unwrap();
        assert_eq!(vfc.stage(), Stage::Fit);
        assert_eq!(vfc.windows().unwrap().len(), 3);

        let features = vfc.transform(&signal, &signal, 1.0).unwrap();
        assert_eq!(features.shape(), (30, 26));
        assert_eq!(vfc.stage(), Stage::Transformed);

        let labels = vfc.predict().unwrap();
        assert_eq!(labels.len(), 30);
        assert_eq!(vfc.stage(), Stage::Predicted);

        vfc.fit(&mut g).unwrap();
        assert_eq!(vfc.stage(), Stage::Fit);
        assert!(vfc.labels().is_none());
        assert!(vfc.spectrogram().is_none());
    }

    #[test]
    fn test_transform_before_fit() {
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        let err = vfc.transform(&[0.0; 30], &[0.0; 30], 1.0).unwrap_err();
        assert!(matches!(
            err,
            MeldError::State {
                required: Stage::Fit,
                current: Stage::Unfit,
                ..
            }
        ));
    }

    #[test]
    fn test_predict_before_transform() {
        let mut g = two_rings(15);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        vfc.fit(&mut g).unwrap();
        let err = vfc.predict().unwrap_err();
        assert!(matches!(
            err,
            MeldError::State {
                required: Stage::Transformed,
                current: Stage::Fit,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_signal_length_keeps_state() {
        let mut g = two_rings(15);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        vfc.fit(&mut g).unwrap();
        let err = vfc.transform(&[1.0; 29], &[1.0; 29], 1.0).unwrap_err();
        assert!(matches!(err, MeldError::ShapeMismatch { .. }));
        assert_eq!(vfc.stage(), Stage::Fit);
    }

    #[test]
    fn test_row_oriented_signal() {
        let mut g = two_rings(15);
        let signal = step_signal(15);
        let row = SignalData::Dense(DMatrix::from_row_slice(1, 30, &signal));
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        vfc.fit(&mut g).unwrap();
        let features = vfc.transform_data(&row, &row, 1.0).unwrap();
        assert_eq!(features.nrows(), 30);
    }

    #[test]
    fn test_centred_signal_cached() {
        let mut g = two_rings(15);
        let signal: Vec<f64> = (0..30).map(|i| i as f64 + 100.0).collect();
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        vfc.fit_transform(&mut g, &signal, &signal, 1.0).unwrap();
        let res = vfc.centered_signal().unwrap();
        assert!(res.iter().sum::<f64>().abs() < 1e-9);
        assert_eq!(vfc.spectrogram_history().unwrap().len(), 3);
    }

    #[test]
    fn test_labels_follow_signal() {
        let mut g = two_rings(15);
        let signal = step_signal(15);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        let labels = vfc.fit_predict(&mut g, &signal, &signal, 1.0).unwrap();

        let mean = |label: usize| -> f64 {
            let members: Vec<f64> = labels
                .iter()
                .zip(&signal)
                .filter(|(&l, _)| l == label)
                .map(|(_, &s)| s)
                .collect();
            members.iter().sum::<f64>() / members.len() as f64
        };
        assert!(mean(0) <= mean(1));
    }

    #[test]
    fn test_set_kmeans_params_drops_labels() {
        let mut g = two_rings(15);
        let signal = step_signal(15);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        vfc.fit_predict(&mut g, &signal, &signal, 1.0).unwrap();

        vfc.set_kmeans_params(KMeansConfig::with_k(3)).unwrap();
        assert_eq!(vfc.stage(), Stage::Transformed);
        assert_eq!(vfc.config().n_clusters, 3);

        let labels = vfc.predict().unwrap();
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_fit_rejects_plain_graph() {
        let edges: Vec<_> = (0..30).map(|i| (i, (i + 1) % 30, 1.0)).collect();
        let mut g = WeightedGraph::from_edges(30, &edges).unwrap();
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        assert!(matches!(
            vfc.fit(&mut g),
            Err(MeldError::TypeMismatch { .. })
        ));
        assert_eq!(vfc.stage(), Stage::Unfit);
    }

    #[test]
    fn test_fit_rejects_small_graph() {
        let mut g = two_rings(5);
        let mut vfc = VertexFrequencyCluster::new(small_config()).unwrap();
        assert!(matches!(
            vfc.fit(&mut g),
            Err(MeldError::InvalidParameter { .. })
        ));
    }
}
