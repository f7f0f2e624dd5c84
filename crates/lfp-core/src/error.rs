//! Error handling for the LFP subsampling framework
//!
//! One error type covers the whole run taxonomy: configuration and
//! missing-input errors abort a run before any probe starts, while shape
//! violations, reference problems, and sink failures stay scoped to a
//! single probe.

use std::fmt;

/// Result type alias for framework operations
pub type LfpResult<T> = Result<T, LfpError>;

/// Error type for all framework operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LfpError {
    /// Invalid run configuration (bad factor, malformed override map)
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// No input data available for the whole run
    MissingInput {
        /// Description of what was missing
        reason: String,
    },

    /// Recording construction or access violated a structural invariant
    InvalidRecording {
        /// Description of the violated invariant
        reason: String,
    },

    /// A stage produced a different shape than the subsampling factors imply
    ShapeMismatch {
        /// Stage that performed the check
        stage: &'static str,
        /// Count the factors imply
        expected: usize,
        /// Count actually observed
        actual: usize,
    },

    /// A count is not evenly divisible by its subsampling factor
    InexactDivision {
        /// Stage that performed the check
        stage: &'static str,
        /// Count being divided
        total: usize,
        /// Subsampling factor
        factor: usize,
    },

    /// Reference channel set is empty or names channels the recording lacks
    InvalidReference {
        /// Description of the reference problem
        reason: String,
    },

    /// Backing data for a probe is absent or unreadable
    ProbeNotFound {
        /// Canonical probe label
        probe: String,
    },

    /// Persistence of a transformed recording failed
    SinkFailure {
        /// Underlying cause
        reason: String,
    },
}

impl fmt::Display for LfpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LfpError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            LfpError::MissingInput { reason } => {
                write!(f, "Missing input: {}", reason)
            }
            LfpError::InvalidRecording { reason } => {
                write!(f, "Invalid recording: {}", reason)
            }
            LfpError::ShapeMismatch { stage, expected, actual } => {
                write!(f, "Shape mismatch in {}: expected {}, got {}",
                       stage, expected, actual)
            }
            LfpError::InexactDivision { stage, total, factor } => {
                write!(f, "Shape mismatch in {}: {} is not divisible by factor {} \
                           (expected {} with remainder {})",
                       stage, total, factor, total / factor, total % factor)
            }
            LfpError::InvalidReference { reason } => {
                write!(f, "Invalid reference set: {}", reason)
            }
            LfpError::ProbeNotFound { probe } => {
                write!(f, "No recording found for {}", probe)
            }
            LfpError::SinkFailure { reason } => {
                write!(f, "Sink write failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for LfpError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::LfpError::InvalidConfig {
            reason: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating recording-invariant errors
#[macro_export]
macro_rules! recording_error {
    ($($arg:tt)*) => {
        $crate::error::LfpError::InvalidRecording {
            reason: format!($($arg)*),
        }
    };
}
