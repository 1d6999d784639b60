//! Numerical helpers shared by the filtering and clustering stages

mod numerical;
mod sorting;

pub use numerical::*;
pub use sorting::*;

/// Small epsilon for numerical stability
pub const EPS: f64 = 1e-15;
