//! Observation types shared by the detectors and the orchestrator
//!
//! A `PitchObservation` is one pitch as handed over by the data layer: the
//! release speed (covariate), the performance metric (outcome), and the tags
//! needed to filter it. An `ObservationSeries` is the cleaned, sorted view that
//! both detectors consume.

use serde::{Deserialize, Serialize};

/// A single pitch as supplied by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchObservation {
    /// Release speed in mph
    pub covariate: f64,
    /// Performance metric (expected wOBA from speed/angle); may be NaN before cleaning
    pub outcome: f64,
    /// Pitch category tag (e.g. "FF" for four-seam fastball)
    pub category: String,
    /// Season the pitch was thrown in, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<i32>,
    /// Run value of the pitch, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_value: Option<f64>,
}

impl PitchObservation {
    pub fn new(covariate: f64, outcome: f64, category: impl Into<String>) -> Self {
        Self {
            covariate,
            outcome,
            category: category.into(),
            season: None,
            run_value: None,
        }
    }

    pub fn with_season(mut self, season: i32) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_run_value(mut self, run_value: f64) -> Self {
        self.run_value = Some(run_value);
        self
    }

    /// Both covariate and outcome are finite numbers
    pub fn is_complete(&self) -> bool {
        self.covariate.is_finite() && self.outcome.is_finite()
    }
}

/// Inclusive range of seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl SeasonRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn single(season: i32) -> Self {
        Self::new(season, season)
    }

    pub fn contains(&self, season: i32) -> bool {
        (self.start..=self.end).contains(&season)
    }
}

impl std::fmt::Display for SeasonRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Smallest and largest covariate in an analysed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CovariateRange {
    pub min: f64,
    pub max: f64,
}

/// Cleaned observation series, sorted ascending by covariate
///
/// Invariants: at least one element, every covariate and outcome finite,
/// covariates non-decreasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    covariates: Vec<f64>,
    outcomes: Vec<f64>,
}

impl ObservationSeries {
    /// Build a series from (covariate, outcome) pairs
    ///
    /// Pairs with a non-finite value are dropped and the rest are sorted by
    /// covariate (stable, so equal speeds keep their input order). Returns
    /// `None` when nothing survives cleaning.
    pub fn from_pairs<I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut pairs: Vec<(f64, f64)> = pairs
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();

        if pairs.is_empty() {
            return None;
        }

        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (covariates, outcomes) = pairs.into_iter().unzip();
        Some(Self {
            covariates,
            outcomes,
        })
    }

    /// Select the observations of one category and clean them
    ///
    /// Applying the same category filter to input that is already filtered is
    /// a no-op.
    pub fn for_category<'a, I>(observations: I, category: &str) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PitchObservation>,
    {
        Self::from_pairs(
            observations
                .into_iter()
                .filter(|obs| obs.category == category)
                .map(|obs| (obs.covariate, obs.outcome)),
        )
    }

    pub fn len(&self) -> usize {
        self.covariates.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.covariates.is_empty()
    }

    pub fn covariates(&self) -> &[f64] {
        &self.covariates
    }

    pub fn outcomes(&self) -> &[f64] {
        &self.outcomes
    }

    /// Covariate at a detector-selected index
    pub fn covariate_at(&self, index: usize) -> Option<f64> {
        self.covariates.get(index).copied()
    }

    pub fn covariate_range(&self) -> CovariateRange {
        // Sorted and non-empty by construction
        CovariateRange {
            min: self.covariates[0],
            max: self.covariates[self.covariates.len() - 1],
        }
    }
}
