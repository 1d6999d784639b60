//! # RuVector MELD
//!
//! Spectral smoothing and vertex-frequency clustering of signals on graphs.
//!
//! ## Core Modules
//!
//! - **Spectral filtering**: the MELD low-pass filter (regularized Laplacian
//!   or random-walk kernel), applied exactly or via Chebyshev polynomials
//! - **Graphs**: the `Graph` / `SpectralGraph` adapter traits with
//!   weight-matrix and Laplacian implementations
//! - **Vertex-frequency clustering**: multi-scale diffusion windows,
//!   windowed graph-Fourier spectrograms, PCA fusion with the smoothed
//!   signal, k-means and signal-ordered labels
//!
//! ## Pipeline
//!
//! ```text
//!            ┌──────────────┐
//!            │    Graph     │  Laplacian, diffusion operator,
//!            │   adapter    │  Fourier basis
//!            └──────┬───────┘
//!        ┌──────────┴───────────┐
//!        ▼                      ▼
//! ┌─────────────┐        ┌─────────────┐
//! │    meld     │        │   windows   │  P^t, normalized
//! │  RES → EES  │        └──────┬──────┘
//! └──────┬──────┘               ▼
//!        │               ┌─────────────┐
//!        │               │ spectrogram │  tanh|Uᵀ(W ⊙ RES)|, summed
//!        │               └──────┬──────┘
//!        └──────────┬───────────┘
//!                   ▼
//!            ┌─────────────┐
//!            │   fusion    │  PCA(25) ‖ scaled EES
//!            └──────┬──────┘
//!                   ▼
//!            ┌─────────────┐
//!            │   k-means   │  labels sorted by mean RES
//!            └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ruvector_meld::{meld_vector, FilterConfig, LaplacianGraph, VertexFrequencyCluster, VfcConfig};
//!
//! // Two rings of 15 vertices joined by a weak edge
//! let mut edges = Vec::new();
//! for offset in [0, 15] {
//!     for i in 0..15 {
//!         edges.push((offset + i, offset + (i + 1) % 15, 1.0));
//!     }
//! }
//! edges.push((0, 15, 0.05));
//! let mut graph = LaplacianGraph::from_edges(30, &edges).unwrap();
//!
//! let res: Vec<f64> = (0..30).map(|i| if i < 15 { -1.0 } else { 1.0 }).collect();
//! let ees = meld_vector(&res, &graph, &FilterConfig::with_strength(1.0)).unwrap();
//!
//! let mut vfc = VertexFrequencyCluster::new(VfcConfig::with_clusters(2).window_count(4)).unwrap();
//! let features = vfc.fit_transform(&mut graph, &res, &ees, 1.0).unwrap();
//! assert_eq!(features.shape(), (30, 26));
//!
//! let labels = vfc.predict().unwrap();
//! assert_eq!(labels.len(), 30);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cluster;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod graph;
pub mod sparse;
pub mod spectral;
pub mod utils;
pub mod vfc;

// Re-exports for convenience - Core
pub use config::{FilterConfig, FilterKernel, FilterMethod, KMeansConfig, Representation, VfcConfig};
pub use error::{MeldError, Result, Stage};

// Re-exports - Graphs
pub use graph::{FourierBasis, Graph, LaplacianGraph, LaplacianNorm, SpectralGraph, WeightedGraph};
pub use sparse::CsrMatrix;

// Re-exports - Spectral filtering
pub use spectral::{estimate_lambda_max, ScaledLaplacian};
pub use spectral::{meld, meld_vector, SignalData};
pub use spectral::{ChebyshevExpansion, ChebyshevPolynomial};

// Re-exports - Clustering
pub use cluster::{relabel_by_signal, ClusteringPrimitive, KMeans};
pub use decomposition::Pca;
pub use vfc::{activate, VertexFrequencyCluster, Window};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cluster::*;
    pub use crate::config::*;
    pub use crate::decomposition::*;
    pub use crate::error::*;
    pub use crate::graph::*;
    pub use crate::sparse::*;
    pub use crate::spectral::*;
    pub use crate::vfc::*;
}
