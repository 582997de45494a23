//! Errors raised by the changepoint detectors

use thiserror::Error;

/// Detector failure
///
/// Detectors are deterministic for a given input (and seed), so none of these
/// is worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Cannot detect a changepoint in an empty series")]
    EmptySeries,

    #[error("Insufficient samples: need at least {required} observations, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Numeric degeneracy: {reason}")]
    NumericDegeneracy { reason: String },

    #[error("Sampling cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
