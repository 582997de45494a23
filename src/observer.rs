//! Observability sink for the analysis orchestrator
//!
//! The orchestrator reports progress through an injected `AnalysisObserver`
//! instead of a process-wide logger. `TracingObserver` forwards events to
//! `tracing`; `RecordingObserver` keeps them for inspection in tests.

use crate::changepoint::DetectionMethod;
use serde::Serialize;
use std::sync::Mutex;

/// Progress event emitted during one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Category series was filtered and cleaned
    SeriesPrepared {
        subject_id: String,
        category: String,
        total_observations: usize,
        category_observations: usize,
    },
    /// One detector selected a threshold
    DetectorFinished {
        method: DetectionMethod,
        index: usize,
        threshold: f64,
    },
    AnalysisFinished {
        subject_id: String,
        average_threshold: f64,
    },
    AnalysisFailed {
        subject_id: String,
        reason: String,
    },
}

/// Receiver for analysis events
pub trait AnalysisObserver: Send + Sync {
    fn on_event(&self, event: &AnalysisEvent);
}

impl<F> AnalysisObserver for F
where
    F: Fn(&AnalysisEvent) + Send + Sync,
{
    fn on_event(&self, event: &AnalysisEvent) {
        self(event)
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_event(&self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::SeriesPrepared {
                subject_id,
                category,
                total_observations,
                category_observations,
            } => tracing::info!(
                subject_id = %subject_id,
                category = %category,
                total_observations,
                category_observations,
                "Prepared {} {} pitches for velocity analysis",
                category_observations,
                category
            ),
            AnalysisEvent::DetectorFinished {
                method,
                index,
                threshold,
            } => tracing::info!(
                method = %method,
                index,
                "{} threshold at {:.1} mph",
                method,
                threshold
            ),
            AnalysisEvent::AnalysisFinished {
                subject_id,
                average_threshold,
            } => tracing::info!(
                subject_id = %subject_id,
                "Analysis complete. Average threshold: {:.1} mph",
                average_threshold
            ),
            AnalysisEvent::AnalysisFailed { subject_id, reason } => {
                tracing::warn!(subject_id = %subject_id, "Analysis failed: {}", reason)
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {
    fn on_event(&self, _event: &AnalysisEvent) {}
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<AnalysisEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<AnalysisEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AnalysisObserver for RecordingObserver {
    fn on_event(&self, event: &AnalysisEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn finished() -> AnalysisEvent {
        AnalysisEvent::AnalysisFinished {
            subject_id: "656427".to_string(),
            average_threshold: 93.35,
        }
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&AnalysisEvent::DetectorFinished {
            method: DetectionMethod::Cusum,
            index: 3,
            threshold: 93.4,
        });
        observer.on_event(&finished());

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], finished());
    }

    #[test]
    fn test_closure_observer() {
        let count = AtomicUsize::new(0);
        let observer = |_: &AnalysisEvent| {
            count.fetch_add(1, Ordering::SeqCst);
        };
        observer.on_event(&finished());
        observer.on_event(&finished());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(finished()).unwrap();
        assert_eq!(json["event"], "analysis_finished");
        assert_eq!(json["subject_id"], "656427");
    }

    #[test]
    fn test_tracing_and_null_observers_accept_all_events() {
        let events = [
            AnalysisEvent::SeriesPrepared {
                subject_id: "1".to_string(),
                category: "FF".to_string(),
                total_observations: 10,
                category_observations: 6,
            },
            finished(),
            AnalysisEvent::AnalysisFailed {
                subject_id: "1".to_string(),
                reason: "no data".to_string(),
            },
        ];
        for event in &events {
            TracingObserver.on_event(event);
            NullObserver.on_event(event);
        }
    }
}
