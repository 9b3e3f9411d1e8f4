//! Error types for fault injection operations.
//!
//! Configuration problems are reported eagerly at validation time; runtime
//! and storage failures propagate unchanged from the layer that detected them.

use thiserror::Error;

/// Main error type for `bitflip` operations.
///
/// # Examples
///
/// ```
/// use bitflip::error::InjectError;
///
/// let err = InjectError::InvalidProbability { value: 1.5 };
/// assert!(err.to_string().contains("probability"));
/// ```
#[derive(Error, Debug)]
pub enum InjectError {
    /// Error probability outside the open interval (0, 1).
    #[error("Invalid probability of error injection: {value}, expected 0 < p < 1")]
    InvalidProbability {
        /// Provided value
        value: f64,
    },

    /// Data type is not in the supported set.
    #[error("Invalid data type: {dtype}, supported: {supported}")]
    UnsupportedDType {
        /// Requested dtype
        dtype: String,
        /// Comma-separated list of supported dtypes
        supported: String,
    },

    /// No target device was configured.
    #[error("Please specify device for error injection")]
    DeviceUnspecified,

    /// Device string could not be parsed.
    #[error("Invalid device: '{value}', expected cpu, cuda or cuda:N")]
    InvalidDevice {
        /// Unparsed input
        value: String,
    },

    /// Feature declared but not implemented.
    #[error("Not implemented: {feature}")]
    NotImplemented {
        /// Feature description
        feature: String,
    },

    /// Tensor shapes or lengths don't line up.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape found
        got: Vec<usize>,
    },

    /// Requested device cannot hold tensors in this build.
    #[error("Backend not available: {backend}")]
    BackendUnavailable {
        /// Device description (e.g. "cuda:0")
        backend: String,
    },

    /// An operation needed an error map but none was generated or loaded.
    #[error("No error map: generate or load one first")]
    NoErrorMap,

    /// Invalid or corrupt error map file.
    #[error("Invalid error map format: {message}")]
    Format {
        /// Error description
        message: String,
    },

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InjectError {
    /// Create a format error from any message.
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a length mismatch error for flat buffers.
    #[must_use]
    pub fn length_mismatch(expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
        }
    }

    /// True for errors raised by configuration validation.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidProbability { .. }
                | Self::UnsupportedDType { .. }
                | Self::DeviceUnspecified
                | Self::InvalidDevice { .. }
                | Self::NotImplemented { .. }
        )
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, InjectError>;
