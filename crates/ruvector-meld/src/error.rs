//! Error types for ruvector-meld

use std::fmt;

use thiserror::Error;

/// Result type alias for ruvector-meld operations
pub type Result<T> = std::result::Result<T, MeldError>;

/// Pipeline stage of a [`VertexFrequencyCluster`](crate::VertexFrequencyCluster)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No graph has been fit yet
    Unfit,
    /// Windows and Fourier basis are cached
    Fit,
    /// Spectrogram and fused features are cached
    Transformed,
    /// Cluster labels are cached
    Predicted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unfit => "unfit",
            Stage::Fit => "fit",
            Stage::Transformed => "transformed",
            Stage::Predicted => "predicted",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while filtering or clustering graph signals
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeldError {
    /// An enumerated option names a value outside its closed set
    #[error("Unsupported {option}: '{value}' is not implemented")]
    UnsupportedOption {
        /// Option being parsed (e.g. "filter method")
        option: &'static str,
        /// Offending value
        value: String,
    },

    /// An argument lacks a capability the operation needs
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        /// Required capability
        expected: String,
        /// What was supplied
        found: String,
    },

    /// Array dimensions do not align with the graph's vertex count
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape received
        got: String,
    },

    /// An operation was invoked before its predecessor stage completed
    #[error("Estimator must be {required} before running `{operation}` (currently {current})")]
    State {
        /// Operation that was rejected
        operation: &'static str,
        /// Stage the operation requires
        required: Stage,
        /// Stage the estimator is in
        current: Stage,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Singular matrix encountered
    #[error("Singular matrix encountered: {context}")]
    SingularMatrix {
        /// Context where singularity occurred
        context: String,
    },

    /// Empty input where non-empty was required
    #[error("Empty input: {context}")]
    EmptyInput {
        /// Context describing what was empty
        context: String,
    },
}

impl MeldError {
    /// Create an unsupported option error
    pub fn unsupported_option(option: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            option,
            value: value.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a shape mismatch error from `(rows, cols)` pairs
    pub fn shape_mismatch(expected: impl Into<String>, got: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            got: format!("{}x{}", got.0, got.1),
        }
    }

    /// Create a stage ordering error
    pub fn state(operation: &'static str, required: Stage, current: Stage) -> Self {
        Self::State {
            operation,
            required,
            current,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a singular matrix error
    pub fn singular_matrix(context: impl Into<String>) -> Self {
        Self::SingularMatrix {
            context: context.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(context: impl Into<String>) -> Self {
        Self::EmptyInput {
            context: context.into(),
        }
    }
}
