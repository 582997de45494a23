// Configuration for the changepoint detectors
//
// Defaults reproduce the reference analysis: a 10-pitch smoothing window for
// both detectors, drift allowance k = 0.005, decision line h = 0.02 and a
// 5000-iteration Metropolis search with a margin of 5 pitches at each edge.

use crate::smoothing::DEFAULT_WINDOW;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Indices excluded at each end of the series when proposing a split
pub const DEFAULT_EDGE_MARGIN: usize = 5;

/// Largest margin for which `2 * margin + 1` fits in a `usize`
const MAX_EDGE_MARGIN: usize = (usize::MAX - 1) / 2;

/// Default Metropolis iteration count
pub const DEFAULT_SAMPLES: usize = 5000;

/// CUSUM detector parameters
///
/// # Example
/// ```
/// use velocliff::changepoint::CusumConfig;
///
/// let config = CusumConfig::default();
/// assert_eq!(config.drift, 0.005);
/// assert_eq!(config.window, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CusumConfig {
    /// Smoothing window, in observations
    pub window: usize,

    /// Drift allowance `k` subtracted from every deviation
    pub drift: f64,

    /// Decision threshold `h`
    ///
    /// Reported alongside the result (whether the statistic ever exceeded it)
    /// but never used to choose the threshold index: selection is always the
    /// global argmax of the statistic.
    pub decision_threshold: f64,
}

impl Default for CusumConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            drift: 0.005,
            decision_threshold: 0.02,
        }
    }
}

impl CusumConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("cusum.window must be >= 1, got 0".to_string());
        }

        if !self.drift.is_finite() || self.drift < 0.0 {
            return Err(format!(
                "cusum.drift must be finite and non-negative, got {}",
                self.drift
            ));
        }

        if !self.decision_threshold.is_finite() || self.decision_threshold < 0.0 {
            return Err(format!(
                "cusum.decision_threshold must be finite and non-negative, got {}",
                self.decision_threshold
            ));
        }

        Ok(())
    }
}

/// Bayesian changepoint search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianConfig {
    /// Smoothing window, in observations
    pub window: usize,

    /// Number of Metropolis iterations (every iteration is recorded; no burn-in)
    pub n_samples: usize,

    /// Proposals are drawn uniformly from `[edge_margin, n - edge_margin)`
    ///
    /// The series must hold more than `2 * edge_margin` observations.
    pub edge_margin: usize,

    /// Seed for the proposal RNG; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            n_samples: DEFAULT_SAMPLES,
            edge_margin: DEFAULT_EDGE_MARGIN,
            seed: None,
        }
    }
}

impl BayesianConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Smallest series length the search accepts
    pub fn min_series_len(&self) -> usize {
        self.edge_margin.saturating_mul(2).saturating_add(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("bayesian.window must be >= 1, got 0".to_string());
        }

        if self.n_samples == 0 {
            return Err("bayesian.n_samples must be >= 1, got 0".to_string());
        }

        // A zero margin would allow an empty leading segment
        if self.edge_margin == 0 {
            return Err("bayesian.edge_margin must be >= 1, got 0".to_string());
        }

        if self.edge_margin > MAX_EDGE_MARGIN {
            return Err(format!(
                "bayesian.edge_margin must be <= {}, got {}",
                MAX_EDGE_MARGIN, self.edge_margin
            ));
        }

        Ok(())
    }
}

/// Complete analysis configuration
///
/// Loadable from TOML; missing keys fall back to the defaults.
///
/// ```toml
/// [cusum]
/// drift = 0.005
///
/// [bayesian]
/// n_samples = 10000
/// seed = 42
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cusum: CusumConfig,
    pub bayesian: BayesianConfig,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    pub fn validate(&self) -> Result<(), String> {
        self.cusum.validate()?;
        self.bayesian.validate()
    }
}
