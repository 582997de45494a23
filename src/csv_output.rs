//! CSV export of per-pitch detector traces
//!
//! One row per analysed pitch, in ascending speed order, so the curves behind
//! a threshold (smoothed outcome, CUSUM statistic) can be charted elsewhere.

use crate::analysis::DetailedAnalysis;

/// CSV record for a single analysed pitch
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub covariate: f64,
    pub outcome: f64,
    pub smoothed: f64,
    pub cusum: f64,
}

/// CSV trace formatter
#[derive(Debug, Default)]
pub struct TraceCsv {
    rows: Vec<TraceRow>,
}

impl TraceCsv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build rows from a finished analysis
    pub fn from_analysis(analysis: &DetailedAnalysis) -> Self {
        let series = &analysis.series;
        let rows = series
            .covariates()
            .iter()
            .zip(series.outcomes())
            .zip(&analysis.cusum.smoothed)
            .zip(&analysis.cusum.statistic)
            .map(|(((&covariate, &outcome), &smoothed), &cusum)| TraceRow {
                covariate,
                outcome,
                smoothed,
                cusum,
            })
            .collect();
        Self { rows }
    }

    pub fn add_row(&mut self, row: TraceRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn header() -> &'static str {
        "covariate,outcome,smoothed,cusum"
    }

    fn format_row(row: &TraceRow) -> String {
        format!(
            "{},{},{:.6},{:.6}",
            row.covariate, row.outcome, row.smoothed, row.cusum
        )
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(Self::header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }
}
