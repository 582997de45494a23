// Bayesian changepoint detector: Metropolis search over split indices
//
// Model: the smoothed outcome series y[0..n) is split at cp into two segments
// with means mu1 = mean(y[..cp]) and mu2 = mean(y[cp..]) and a shared sigma.
// sigma is the population std of the whole smoothed series, computed once and
// held fixed while cp moves.
//
// Search: start at cp = n / 2. Each iteration proposes cp' uniformly from
// [margin, n - margin), accepts it with probability min(1, exp(L(cp') - L(cp)))
// and records the current cp whether or not the move was accepted. There is
// no burn-in and no thinning. The estimate is the most frequently recorded cp.
//
// This is a fixed-length heuristic, not a converged posterior. Re-estimating
// sigma per segment is the usual changepoint model and a candidate change;
// sigma stays fixed here.

use super::config::BayesianConfig;
use super::error::{DetectionError, Result};
use super::{DetectionMethod, DetectionResult};
use crate::observation::ObservationSeries;
use crate::smoothing::{centered_moving_average, mean, population_std};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Iterations between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 64;

/// Relative spread below which the smoothed series counts as constant
///
/// Averaging identical values does not always reproduce them bit for bit, so
/// a flat series can leave a sigma of ~1e-17 instead of exactly zero.
const SIGMA_FLOOR: f64 = 1e-12;

/// Stop condition for a long-running search
///
/// The default never cancels.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    flag: Option<Arc<AtomicBool>>,
}

impl Cancellation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cancel once `flag` is set to true by another thread
    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Full output of a Bayesian changepoint run
#[derive(Debug, Clone, Serialize)]
pub struct BayesianOutcome {
    /// Selected covariate
    pub result: DetectionResult,
    /// Most frequently recorded split index (smallest index on ties)
    pub index: usize,
    /// Shared standard deviation used by the likelihood
    pub sigma: f64,
    /// Smoothed outcome series
    pub smoothed: Vec<f64>,
    /// Split index recorded at every iteration
    pub trace: Vec<usize>,
    /// Fraction of proposals accepted
    pub acceptance_rate: f64,
}

/// Gaussian log-likelihood of splitting `y` at `cp` with a shared `sigma`
///
/// Each segment is scored against its own sample mean. `cp` must satisfy
/// `0 < cp < y.len()`.
pub fn two_segment_log_likelihood(y: &[f64], cp: usize, sigma: f64) -> f64 {
    let (left, right) = y.split_at(cp);
    segment_log_likelihood(left, sigma) + segment_log_likelihood(right, sigma)
}

fn segment_log_likelihood(segment: &[f64], sigma: f64) -> f64 {
    let Some(mu) = mean(segment) else {
        return 0.0;
    };
    let norm = -0.5 * (2.0 * PI).ln() - sigma.ln();
    let two_var = 2.0 * sigma * sigma;
    segment
        .iter()
        .map(|y| norm - (y - mu).powi(2) / two_var)
        .sum()
}

/// Most frequent value in `samples`, each below `bins`; smallest value wins ties
fn mode_of_trace(samples: &[usize], bins: usize) -> Option<usize> {
    let mut counts = vec![0usize; bins];
    for &s in samples {
        counts[s] += 1;
    }
    let mut best: Option<(usize, usize)> = None;
    for (value, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Metropolis changepoint detector
#[derive(Debug, Clone, Default)]
pub struct BayesianDetector {
    config: BayesianConfig,
}

impl BayesianDetector {
    pub fn new(config: BayesianConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BayesianConfig {
        &self.config
    }

    /// Run the search with an RNG seeded from the configuration
    pub fn detect(&self, series: &ObservationSeries) -> Result<BayesianOutcome> {
        self.detect_with_cancellation(series, &Cancellation::none())
    }

    pub fn detect_with_cancellation(
        &self,
        series: &ObservationSeries,
        cancel: &Cancellation,
    ) -> Result<BayesianOutcome> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.detect_with_rng(series, &mut rng, cancel)
    }

    /// Run the search drawing proposals and acceptances from `rng`
    pub fn detect_with_rng<R: Rng + ?Sized>(
        &self,
        series: &ObservationSeries,
        rng: &mut R,
        cancel: &Cancellation,
    ) -> Result<BayesianOutcome> {
        self.config
            .validate()
            .map_err(DetectionError::InvalidConfig)?;

        let n = series.len();
        if n == 0 {
            return Err(DetectionError::EmptySeries);
        }
        let required = self.config.min_series_len();
        if n < required {
            return Err(DetectionError::InsufficientSamples {
                required,
                actual: n,
            });
        }

        let smoothed = centered_moving_average(series.outcomes(), self.config.window);
        let level = mean(&smoothed).ok_or(DetectionError::EmptySeries)?;
        let sigma = population_std(&smoothed).ok_or(DetectionError::EmptySeries)?;
        if !(sigma.is_finite() && sigma > SIGMA_FLOOR * (1.0 + level.abs())) {
            return Err(DetectionError::NumericDegeneracy {
                reason: format!("smoothed series has standard deviation {sigma}"),
            });
        }

        let margin = self.config.edge_margin;
        let requested = self.config.n_samples;

        let mut cp = n / 2;
        let mut log_lik = two_segment_log_likelihood(&smoothed, cp, sigma);
        let mut trace = Vec::with_capacity(requested);
        let mut accepted = 0usize;

        for iteration in 0..requested {
            if iteration % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                tracing::warn!(iteration, requested, "changepoint search cancelled");
                return Err(DetectionError::Cancelled {
                    completed: iteration,
                    requested,
                });
            }

            let proposal = rng.gen_range(margin..n - margin);
            let proposal_log_lik = two_segment_log_likelihood(&smoothed, proposal, sigma);
            if !proposal_log_lik.is_finite() {
                return Err(DetectionError::NumericDegeneracy {
                    reason: format!("log-likelihood at split {proposal} is {proposal_log_lik}"),
                });
            }

            // May exceed 1; a draw from [0, 1) then always accepts
            let alpha = (proposal_log_lik - log_lik).exp();
            if rng.gen::<f64>() < alpha {
                cp = proposal;
                log_lik = proposal_log_lik;
                accepted += 1;
            }

            trace.push(cp);
        }

        let index = mode_of_trace(&trace, n).ok_or(DetectionError::EmptySeries)?;
        let threshold = series
            .covariate_at(index)
            .ok_or(DetectionError::EmptySeries)?;
        let acceptance_rate = accepted as f64 / requested as f64;

        tracing::debug!(
            index,
            threshold,
            sigma,
            acceptance_rate,
            "changepoint search finished"
        );

        Ok(BayesianOutcome {
            result: DetectionResult {
                threshold,
                method: DetectionMethod::Bayesian,
            },
            index,
            sigma,
            smoothed,
            trace,
            acceptance_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_series(n: usize, step: usize) -> ObservationSeries {
        ObservationSeries::from_pairs((0..n).map(|i| {
            let y = if i < step { 0.30 } else { 0.50 };
            (90.0 + i as f64 * 0.1, y)
        }))
        .unwrap()
    }

    #[test]
    fn test_log_likelihood_matches_direct_sum() {
        let y = [0.1, 0.2, 0.9, 1.0];
        let sigma: f64 = 0.5;
        let logpdf = |x: f64, mu: f64| {
            -0.5 * (2.0 * PI).ln() - sigma.ln() - (x - mu).powi(2) / (2.0 * sigma * sigma)
        };
        let expected = logpdf(0.1, 0.15) + logpdf(0.2, 0.15) + logpdf(0.9, 0.95) + logpdf(1.0, 0.95);
        let got = two_segment_log_likelihood(&y, 2, sigma);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_log_likelihood_prefers_true_split() {
        let y = [0.1, 0.1, 0.1, 0.9, 0.9, 0.9];
        let at_step = two_segment_log_likelihood(&y, 3, 0.4);
        assert!(at_step > two_segment_log_likelihood(&y, 2, 0.4));
        assert!(at_step > two_segment_log_likelihood(&y, 4, 0.4));
    }

    #[test]
    fn test_mode_of_trace_smallest_on_tie() {
        assert_eq!(mode_of_trace(&[4, 7, 7, 4, 9], 10), Some(4));
        assert_eq!(mode_of_trace(&[3, 3, 5], 10), Some(3));
        assert_eq!(mode_of_trace(&[], 10), None);
    }

    #[test]
    fn test_length_eight_is_insufficient() {
        let series = step_series(8, 4);
        let err = BayesianDetector::default().detect(&series).unwrap_err();
        assert_eq!(
            err,
            DetectionError::InsufficientSamples {
                required: 11,
                actual: 8
            }
        );
    }

    #[test]
    fn test_boundary_length_is_accepted() {
        // n = 11 leaves a single admissible split at index 5
        let series = step_series(11, 6);
        let outcome = BayesianDetector::new(BayesianConfig::default().with_seed(1))
            .detect(&series)
            .unwrap();
        assert_eq!(outcome.index, 5);
        assert!(outcome.trace.iter().all(|&cp| cp == 5));
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        let series =
            ObservationSeries::from_pairs((0..30).map(|i| (90.0 + i as f64, 0.4))).unwrap();
        let err = BayesianDetector::default().detect(&series).unwrap_err();
        assert!(matches!(err, DetectionError::NumericDegeneracy { .. }));
    }

    #[test]
    fn test_trace_records_every_iteration() {
        let config = BayesianConfig {
            n_samples: 300,
            seed: Some(11),
            ..BayesianConfig::default()
        };
        let outcome = BayesianDetector::new(config).detect(&step_series(60, 30)).unwrap();
        assert_eq!(outcome.trace.len(), 300);
        assert!(outcome.trace.iter().all(|cp| (5..55).contains(cp)));
        assert!((0.0..=1.0).contains(&outcome.acceptance_rate));
    }

    #[test]
    fn test_same_seed_same_result() {
        let series = step_series(80, 50);
        let detector = BayesianDetector::new(BayesianConfig::default().with_seed(2024));
        let a = detector.detect(&series).unwrap();
        let b = detector.detect(&series).unwrap();
        assert_eq!(a.trace, b.trace);
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_preset_flag_cancels_before_first_iteration() {
        let flag = Arc::new(AtomicBool::new(true));
        let cancel = Cancellation::none().with_flag(flag);
        let err = BayesianDetector::new(BayesianConfig::default().with_seed(3))
            .detect_with_cancellation(&step_series(60, 30), &cancel)
            .unwrap_err();
        assert_eq!(
            err,
            DetectionError::Cancelled {
                completed: 0,
                requested: 5000
            }
        );
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let cancel = Cancellation::none().with_deadline(Instant::now());
        let err = BayesianDetector::default()
            .detect_with_cancellation(&step_series(60, 30), &cancel)
            .unwrap_err();
        assert!(matches!(err, DetectionError::Cancelled { .. }));
    }

    #[test]
    fn test_unset_cancellation_never_fires() {
        assert!(!Cancellation::none().is_cancelled());
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!Cancellation::none().with_flag(flag).is_cancelled());
    }
}
