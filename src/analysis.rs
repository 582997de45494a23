//! Velocity cliff analysis orchestrator
//!
//! Runs both changepoint detectors on the same cleaned category series and
//! packages the thresholds into one `AnalysisResult`. Either detector failing
//! fails the whole analysis: the average threshold needs both.

use crate::changepoint::{
    AnalysisConfig, BayesianDetector, BayesianOutcome, Cancellation, CusumDetector, CusumOutcome,
    DetectionError, DetectionMethod,
};
use crate::observation::{CovariateRange, ObservationSeries, PitchObservation, SeasonRange};
use crate::observer::{AnalysisEvent, AnalysisObserver, TracingObserver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Supplier of pitch observations for one subject
///
/// Implementations may return observations of every category (`category` is
/// `None`) or only the requested one; the orchestrator filters again either way.
pub trait ObservationSource {
    fn get_series(
        &self,
        subject_id: &str,
        seasons: Option<SeasonRange>,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<PitchObservation>>;
}

/// What to analyse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub subject_id: String,
    /// Pitch category tag, e.g. "FF"
    pub category: String,
    /// Inclusive season filter; `None` keeps every season
    pub seasons: Option<SeasonRange>,
}

impl AnalysisRequest {
    pub fn new(subject_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            category: category.into(),
            seasons: None,
        }
    }

    pub fn with_seasons(mut self, seasons: SeasonRange) -> Self {
        self.seasons = Some(seasons);
        self
    }

    /// Observations without a season only pass when no range is requested
    fn in_seasons(&self, obs: &PitchObservation) -> bool {
        match (self.seasons, obs.season) {
            (Some(range), Some(season)) => range.contains(season),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// Outcome of one analysis; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub subject_id: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<SeasonRange>,
    /// Speeds spanned by the analysed series
    pub covariate_range: CovariateRange,
    /// Observations for the subject in the requested seasons, all categories
    pub total_observations: usize,
    /// Cleaned observations of the requested category that were analysed
    pub category_observations: usize,
    pub cusum_threshold: f64,
    pub bayesian_threshold: f64,
    /// `(cusum_threshold + bayesian_threshold) / 2`
    pub average_threshold: f64,
}

impl AnalysisResult {
    /// Human-readable report
    pub fn to_report_string(&self, label: Option<&str>) -> String {
        let rule = "=".repeat(50);
        let mut report = String::new();
        report.push_str(&format!("{}\n", rule));
        report.push_str("VELOCITY CLIFF ANALYSIS RESULTS\n");
        report.push_str(&format!("{}\n", rule));
        report.push_str(&format!(
            "Player: {}\n",
            label.unwrap_or(self.subject_id.as_str())
        ));
        if let Some(seasons) = self.seasons {
            report.push_str(&format!("Years: {}\n", seasons));
        }
        report.push_str(&format!("Pitch Type: {}\n", self.category));
        report.push_str(&format!(
            "Speed Range: {:.1}-{:.1} mph\n",
            self.covariate_range.min, self.covariate_range.max
        ));
        report.push_str(&format!("Total Pitches: {}\n", self.total_observations));
        report.push_str(&format!(
            "{} Pitches: {}\n",
            self.category, self.category_observations
        ));
        report.push_str(&format!("CUSUM Threshold: {:.1} mph\n", self.cusum_threshold));
        report.push_str(&format!(
            "Bayesian Threshold: {:.1} mph\n",
            self.bayesian_threshold
        ));
        report.push_str(&format!(
            "Average Threshold: {:.1} mph\n",
            self.average_threshold
        ));
        report.push_str(&format!("{}\n", rule));
        report
    }
}

/// Result plus everything the detectors computed along the way
#[derive(Debug, Clone)]
pub struct DetailedAnalysis {
    pub result: AnalysisResult,
    pub series: ObservationSeries,
    pub cusum: CusumOutcome,
    pub bayesian: BayesianOutcome,
}

/// Analysis failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No {category} data found for {subject_id}")]
    NoData {
        subject_id: String,
        category: String,
    },

    #[error("{method} detection failed: {source}")]
    Detection {
        method: DetectionMethod,
        source: DetectionError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Data source failed: {0}")]
    Source(String),
}

impl AnalysisError {
    fn detection(method: DetectionMethod) -> impl FnOnce(DetectionError) -> Self {
        move |source| AnalysisError::Detection { method, source }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Runs both detectors and combines their thresholds
#[derive(Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    observer: Arc<dyn AnalysisObserver>,
    cancellation: Cancellation,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
            cancellation: Cancellation::none(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stop the Bayesian search early when `cancellation` fires
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse a subject's observation history
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        history: &[PitchObservation],
    ) -> Result<AnalysisResult> {
        self.analyze_detailed(request, history)
            .map(|detailed| detailed.result)
    }

    /// Fetch the history from `source`, then analyse it
    pub fn analyze_source(
        &self,
        source: &dyn ObservationSource,
        request: &AnalysisRequest,
    ) -> Result<DetailedAnalysis> {
        let history = source
            .get_series(&request.subject_id, request.seasons, None)
            .map_err(|e| self.fail(request, AnalysisError::Source(format!("{:#}", e))))?;
        self.analyze_detailed(request, &history)
    }

    /// Analyse and keep the detector outcomes
    pub fn analyze_detailed(
        &self,
        request: &AnalysisRequest,
        history: &[PitchObservation],
    ) -> Result<DetailedAnalysis> {
        self.config
            .validate()
            .map_err(|e| self.fail(request, AnalysisError::InvalidConfig(e)))?;

        let series = ObservationSeries::for_category(
            history.iter().filter(|o| request.in_seasons(o)),
            &request.category,
        )
        .ok_or_else(|| {
            self.fail(
                request,
                AnalysisError::NoData {
                    subject_id: request.subject_id.clone(),
                    category: request.category.clone(),
                },
            )
        })?;
        // Counts the cleaned category series, the same pitches both detectors see
        let total_observations = series.len();

        self.observer.on_event(&AnalysisEvent::SeriesPrepared {
            subject_id: request.subject_id.clone(),
            category: request.category.clone(),
            total_observations,
            category_observations: series.len(),
        });

        let cusum = CusumDetector::new(self.config.cusum.clone())
            .detect(&series)
            .map_err(AnalysisError::detection(DetectionMethod::Cusum))
            .map_err(|e| self.fail(request, e))?;
        self.observer.on_event(&AnalysisEvent::DetectorFinished {
            method: DetectionMethod::Cusum,
            index: cusum.index,
            threshold: cusum.result.threshold,
        });

        let bayesian = BayesianDetector::new(self.config.bayesian.clone())
            .detect_with_cancellation(&series, &self.cancellation)
            .map_err(AnalysisError::detection(DetectionMethod::Bayesian))
            .map_err(|e| self.fail(request, e))?;
        self.observer.on_event(&AnalysisEvent::DetectorFinished {
            method: DetectionMethod::Bayesian,
            index: bayesian.index,
            threshold: bayesian.result.threshold,
        });

        let cusum_threshold = cusum.result.threshold;
        let bayesian_threshold = bayesian.result.threshold;
        let result = AnalysisResult {
            subject_id: request.subject_id.clone(),
            category: request.category.clone(),
            seasons: request.seasons,
            covariate_range: series.covariate_range(),
            total_observations,
            category_observations: series.len(),
            cusum_threshold,
            bayesian_threshold,
            average_threshold: (cusum_threshold + bayesian_threshold) / 2.0,
        };

        self.observer.on_event(&AnalysisEvent::AnalysisFinished {
            subject_id: result.subject_id.clone(),
            average_threshold: result.average_threshold,
        });

        Ok(DetailedAnalysis {
            result,
            series,
            cusum,
            bayesian,
        })
    }

    fn fail(&self, request: &AnalysisRequest, err: AnalysisError) -> AnalysisError {
        self.observer.on_event(&AnalysisEvent::AnalysisFailed {
            subject_id: request.subject_id.clone(),
            reason: err.to_string(),
        });
        err
    }
}
