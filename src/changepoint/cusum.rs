// One-sided CUSUM threshold detector
//
// The smoothed outcome series is compared against its own global mean. The
// cumulative statistic
//
//   S(0) = max(0, d(0) - k)
//   S(i) = max(0, S(i-1) + d(i) - k)
//
// accumulates deviation above the baseline beyond the drift allowance k.
// The threshold is the covariate where S reaches its global maximum, i.e.
// where the outcome has drifted furthest above baseline in total.
//
// The decision threshold h does not take part in the selection. It is carried
// through to the outcome so callers can draw it as a reference line and see
// whether the statistic ever crossed it.

use super::config::CusumConfig;
use super::error::{DetectionError, Result};
use super::{DetectionMethod, DetectionResult};
use crate::observation::ObservationSeries;
use crate::smoothing::{centered_moving_average, mean};
use serde::Serialize;

/// Full output of a CUSUM run
#[derive(Debug, Clone, Serialize)]
pub struct CusumOutcome {
    /// Selected covariate
    pub result: DetectionResult,
    /// Index of the global maximum of the statistic (first one on ties)
    pub index: usize,
    /// Mean of the smoothed outcome series
    pub baseline: f64,
    /// Smoothed outcome series
    pub smoothed: Vec<f64>,
    /// CUSUM statistic, one value per observation
    pub statistic: Vec<f64>,
    /// Value of the statistic at `index`
    pub peak: f64,
    /// Decision threshold `h` from the configuration (reporting only)
    pub decision_threshold: f64,
    /// Whether `peak` exceeds `h`; never affects `index`
    pub exceeded_decision_threshold: bool,
}

/// One-sided CUSUM detector over a smoothed outcome series
#[derive(Debug, Clone, Default)]
pub struct CusumDetector {
    config: CusumConfig,
}

impl CusumDetector {
    pub fn new(config: CusumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CusumConfig {
        &self.config
    }

    /// Run the detector on a cleaned, sorted series
    ///
    /// Never fails for a valid configuration: a single observation yields that
    /// observation's covariate.
    pub fn detect(&self, series: &ObservationSeries) -> Result<CusumOutcome> {
        self.config.validate().map_err(DetectionError::InvalidConfig)?;

        let smoothed = centered_moving_average(series.outcomes(), self.config.window);
        let baseline = mean(&smoothed).ok_or(DetectionError::EmptySeries)?;
        let statistic = cusum_statistic(&smoothed, baseline, self.config.drift);

        let index = first_argmax(&statistic).ok_or(DetectionError::EmptySeries)?;
        let peak = statistic[index];
        let threshold = series
            .covariate_at(index)
            .ok_or(DetectionError::EmptySeries)?;

        tracing::debug!(
            index,
            threshold,
            baseline,
            peak,
            "CUSUM statistic peaked"
        );

        Ok(CusumOutcome {
            result: DetectionResult {
                threshold,
                method: DetectionMethod::Cusum,
            },
            index,
            baseline,
            smoothed,
            statistic,
            peak,
            decision_threshold: self.config.decision_threshold,
            exceeded_decision_threshold: peak > self.config.decision_threshold,
        })
    }
}

/// One-sided cumulative sum of `value - target - drift`, floored at zero
pub fn cusum_statistic(values: &[f64], target: f64, drift: f64) -> Vec<f64> {
    let mut statistic = Vec::with_capacity(values.len());
    let mut running = 0.0_f64;
    for value in values {
        running = (running + (value - target) - drift).max(0.0);
        statistic.push(running);
    }
    statistic
}

/// Index of the largest value; the earliest index wins ties
pub fn first_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
