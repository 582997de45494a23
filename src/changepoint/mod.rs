// Changepoint detection along the release-speed axis
//
// Two independent estimators look for the speed that separates a "normal"
// regime from a "degraded" one:
//
// - CUSUM: one-sided cumulative sum of the smoothed, de-meaned outcome; the
//   threshold is the speed where the statistic peaks.
// - Bayesian: fixed-length Metropolis search over split indices of the
//   smoothed outcome under a two-segment Gaussian mean-shift model; the
//   threshold is the speed at the most visited split.
//
// Both detectors select an index into the input series, so the reported
// threshold is always one of the observed speeds. Each detector smooths its
// own copy of the outcomes; nothing is shared between them.

mod bayesian;
mod config;
mod cusum;
mod error;

pub use bayesian::{two_segment_log_likelihood, BayesianDetector, BayesianOutcome, Cancellation};
pub use config::{
    AnalysisConfig, BayesianConfig, CusumConfig, DEFAULT_EDGE_MARGIN, DEFAULT_SAMPLES,
};
pub use cusum::{cusum_statistic, first_argmax, CusumDetector, CusumOutcome};
pub use error::{DetectionError, Result};

use serde::{Deserialize, Serialize};

/// Which estimator produced a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Cusum,
    Bayesian,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::Cusum => write!(f, "CUSUM"),
            DetectionMethod::Bayesian => write!(f, "Bayesian"),
        }
    }
}

/// Covariate selected by one detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// A covariate taken from the input series, never interpolated
    pub threshold: f64,
    pub method: DetectionMethod,
}
