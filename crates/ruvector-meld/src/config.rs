//! Configuration structures for filtering and vertex-frequency clustering.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MeldError, Result};

/// How a spectral filter is applied to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMethod {
    /// Build the filter as an explicit matrix function and multiply.
    Exact,
    /// Chebyshev polynomial approximation of the kernel.
    Approximate,
}

impl FromStr for FilterMethod {
    type Err = MeldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "matrix" => Ok(Self::Exact),
            "approximate" | "cheby" | "chebyshev" => Ok(Self::Approximate),
            _ => Err(MeldError::unsupported_option("filter method", s)),
        }
    }
}

/// Spectral kernel h(λ) used for smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKernel {
    /// h(λ) = 1 / (1 + (strength·λ − shift)^order)
    RegularizedLaplacian,
    /// h(λ) = (alpha − λ)^strength on the degree-normalized Laplacian
    RandomWalk,
}

impl FromStr for FilterKernel {
    type Err = MeldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "regularizedlaplacian" => Ok(Self::RegularizedLaplacian),
            "randomwalk" => Ok(Self::RandomWalk),
            _ => Err(MeldError::unsupported_option("filter kernel", s)),
        }
    }
}

/// Storage used for diffusion windows, fixed per estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Dense N×N matrices
    #[default]
    Dense,
    /// Compressed sparse row matrices
    Sparse,
}

impl FromStr for Representation {
    type Err = MeldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dense" => Ok(Self::Dense),
            "sparse" => Ok(Self::Sparse),
            _ => Err(MeldError::unsupported_option("representation", s)),
        }
    }
}

/// Parameters of the spectral smoothing filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Smoothing strength; the step count for the random-walk kernel
    pub strength: f64,
    /// Shift of the attenuated eigenvalue range
    pub spectral_shift: f64,
    /// Roll-off sharpness of the regularized-Laplacian kernel
    pub order: u32,
    /// Exact matrix function or Chebyshev approximation
    pub method: FilterMethod,
    /// Kernel to apply
    pub kernel: FilterKernel,
    /// Random-walk laziness term
    pub alpha: f64,
    /// Chebyshev polynomial degree for the approximate method
    pub chebyshev_degree: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strength: 1.0,
            spectral_shift: 0.0,
            order: 1,
            method: FilterMethod::Approximate,
            kernel: FilterKernel::RegularizedLaplacian,
            alpha: 2.0,
            chebyshev_degree: 30,
        }
    }
}

impl FilterConfig {
    /// Config with the given strength and defaults elsewhere.
    pub fn with_strength(strength: f64) -> Self {
        Self {
            strength,
            ..Default::default()
        }
    }

    /// Set the spectral shift.
    pub fn spectral_shift(mut self, shift: f64) -> Self {
        self.spectral_shift = shift;
        self
    }

    /// Set the kernel order.
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set the solve method.
    pub fn method(mut self, method: FilterMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the kernel.
    pub fn kernel(mut self, kernel: FilterKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the random-walk alpha.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the Chebyshev degree.
    pub fn chebyshev_degree(mut self, degree: usize) -> Self {
        self.chebyshev_degree = degree;
        self
    }

    /// Parse method and kernel from their string spellings.
    pub fn from_options(strength: f64, method: &str, kernel: &str) -> Result<Self> {
        Ok(Self {
            strength,
            method: method.parse()?,
            kernel: kernel.parse()?,
            ..Default::default()
        })
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err(MeldError::invalid_parameter(
                "strength",
                format!("must be finite and non-negative, got {}", self.strength),
            ));
        }
        if !self.spectral_shift.is_finite() || !self.alpha.is_finite() {
            return Err(MeldError::invalid_parameter(
                "spectral_shift/alpha",
                "must be finite",
            ));
        }
        if self.order == 0 {
            return Err(MeldError::invalid_parameter("order", "must be at least 1"));
        }
        if self.method == FilterMethod::Approximate && self.chebyshev_degree == 0 {
            return Err(MeldError::invalid_parameter(
                "chebyshev_degree",
                "must be at least 1",
            ));
        }
        if self.method == FilterMethod::Exact
            && self.kernel == FilterKernel::RandomWalk
            && self.strength.fract() != 0.0
        {
            return Err(MeldError::invalid_parameter(
                "strength",
                format!(
                    "exact random-walk filtering is a matrix power and needs an integer step count, got {}",
                    self.strength
                ),
            ));
        }
        Ok(())
    }
}

/// Pass-through tunables of the k-means primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters
    pub n_clusters: usize,
    /// Lloyd iterations per run
    pub max_iter: usize,
    /// Independent k-means++ restarts; the lowest inertia wins
    pub n_init: usize,
    /// Centroid shift below which a run is considered converged
    pub tolerance: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 10,
            max_iter: 300,
            n_init: 10,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    /// Config with just the number of clusters
    pub fn with_k(k: usize) -> Self {
        Self {
            n_clusters: k,
            ..Default::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(MeldError::invalid_parameter(
                "n_clusters",
                "must be at least 1",
            ));
        }
        if self.max_iter == 0 || self.n_init == 0 {
            return Err(MeldError::invalid_parameter(
                "max_iter/n_init",
                "must be at least 1",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(MeldError::invalid_parameter(
                "tolerance",
                format!("must be non-negative, got {}", self.tolerance),
            ));
        }
        Ok(())
    }
}

/// Configuration of a [`VertexFrequencyCluster`](crate::VertexFrequencyCluster).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VfcConfig {
    /// Number of clusters to form
    pub n_clusters: usize,
    /// Number of windows when `window_sizes` is not given
    pub window_count: usize,
    /// Explicit diffusion powers, one window each
    pub window_sizes: Option<Vec<u32>>,
    /// Window storage
    pub representation: Representation,
    /// Silence advisory warnings
    pub suppress_warnings: bool,
    /// Principal components kept from the spectrogram
    pub n_components: usize,
    /// Clustering tunables; `kmeans.n_clusters` follows `n_clusters`
    pub kmeans: KMeansConfig,
}

impl Default for VfcConfig {
    fn default() -> Self {
        Self {
            n_clusters: 10,
            window_count: 9,
            window_sizes: None,
            representation: Representation::Dense,
            suppress_warnings: false,
            n_components: 25,
            kmeans: KMeansConfig::default(),
        }
    }
}

impl VfcConfig {
    /// Config with the given cluster count.
    pub fn with_clusters(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            kmeans: KMeansConfig::with_k(n_clusters),
            ..Default::default()
        }
    }

    /// Use `count` windows of sizes 2^0 … 2^(count−1).
    pub fn window_count(mut self, count: usize) -> Self {
        self.window_count = count;
        self.window_sizes = None;
        self
    }

    /// Use explicit window sizes.
    pub fn window_sizes(mut self, sizes: Vec<u32>) -> Self {
        self.window_sizes = Some(sizes);
        self
    }

    /// Set the window representation.
    pub fn representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    /// Silence advisory warnings.
    pub fn suppress_warnings(mut self, suppress: bool) -> Self {
        self.suppress_warnings = suppress;
        self
    }

    /// Replace the clustering tunables, keeping the cluster count.
    pub fn kmeans(mut self, kmeans: KMeansConfig) -> Self {
        self.kmeans = KMeansConfig {
            n_clusters: self.n_clusters,
            ..kmeans
        };
        self
    }

    /// Diffusion powers of the windows, in build order.
    pub fn resolved_window_sizes(&self) -> Vec<u32> {
        match &self.window_sizes {
            Some(sizes) => sizes.clone(),
            None => (0..self.window_count).map(|i| 1u32 << i).collect(),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(MeldError::invalid_parameter(
                "n_clusters",
                "must be at least 1",
            ));
        }
        let sizes = self.resolved_window_sizes();
        if sizes.is_empty() {
            return Err(MeldError::invalid_parameter(
                "window_sizes",
                "at least one window is required",
            ));
        }
        if self.window_sizes.is_none() && self.window_count > 31 {
            return Err(MeldError::invalid_parameter(
                "window_count",
                format!("2^{} overflows a diffusion power", self.window_count - 1),
            ));
        }
        if self.n_components == 0 {
            return Err(MeldError::invalid_parameter(
                "n_components",
                "must be at least 1",
            ));
        }
        self.kmeans.validate()
    }
}
