//! Per-category pitch summary
//!
//! Groups a subject's pitches by category tag and reports count, speed,
//! outcome and run-value statistics. Standard deviations are sample standard
//! deviations (n - 1) and are absent for fewer than two values. Non-finite
//! values are skipped column by column.

use crate::observation::PitchObservation;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary statistics for one pitch category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    /// Pitches with a recorded release speed
    pub count: usize,
    pub speed_mean: Option<f64>,
    pub speed_std: Option<f64>,
    pub speed_min: Option<f64>,
    pub speed_max: Option<f64>,
    pub outcome_mean: Option<f64>,
    pub outcome_std: Option<f64>,
    pub run_value_mean: Option<f64>,
    pub run_value_std: Option<f64>,
}

#[derive(Default)]
struct Columns {
    speed: Vec<f64>,
    outcome: Vec<f64>,
    run_value: Vec<f64>,
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = finite_mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Summarise pitches by category, sorted by category tag
pub fn summarize_by_category(pitches: &[PitchObservation]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, Columns> = BTreeMap::new();

    for pitch in pitches {
        let columns = groups.entry(pitch.category.as_str()).or_default();
        if pitch.covariate.is_finite() {
            columns.speed.push(pitch.covariate);
        }
        if pitch.outcome.is_finite() {
            columns.outcome.push(pitch.outcome);
        }
        if let Some(rv) = pitch.run_value.filter(|v| v.is_finite()) {
            columns.run_value.push(rv);
        }
    }

    groups
        .into_iter()
        .map(|(category, c)| CategorySummary {
            category: category.to_string(),
            count: c.speed.len(),
            speed_mean: finite_mean(&c.speed),
            speed_std: sample_std(&c.speed),
            speed_min: c.speed.iter().copied().reduce(f64::min),
            speed_max: c.speed.iter().copied().reduce(f64::max),
            outcome_mean: finite_mean(&c.outcome),
            outcome_std: sample_std(&c.outcome),
            run_value_mean: finite_mean(&c.run_value),
            run_value_std: sample_std(&c.run_value),
        })
        .collect()
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

/// Render summaries as a fixed-width table, values rounded to 3 decimals
pub fn to_table_string(summaries: &[CategorySummary]) -> String {
    let mut out = format!(
        "{:<6} {:>6} {:>9} {:>8} {:>8} {:>8} {:>9} {:>8} {:>9} {:>8}\n",
        "type", "count", "speed", "std", "min", "max", "xwoba", "std", "run_exp", "std"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:<6} {:>6} {:>9} {:>8} {:>8} {:>8} {:>9} {:>8} {:>9} {:>8}\n",
            s.category,
            s.count,
            cell(s.speed_mean),
            cell(s.speed_std),
            cell(s.speed_min),
            cell(s.speed_max),
            cell(s.outcome_mean),
            cell(s.outcome_std),
            cell(s.run_value_mean),
            cell(s.run_value_std),
        ));
    }
    out
}
