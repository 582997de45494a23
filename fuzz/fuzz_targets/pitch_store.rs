#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use velocliff::analysis::{AnalysisRequest, Analyzer, ObservationSource};
use velocliff::changepoint::{AnalysisConfig, BayesianConfig};
use velocliff::dataset::PitchStore;
use velocliff::observer::NullObserver;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Loading and analysing arbitrary documents must never panic
        if let Ok(store) = PitchStore::from_json_str(input) {
            let analyzer = Analyzer::new(AnalysisConfig {
                bayesian: BayesianConfig {
                    n_samples: 50,
                    ..BayesianConfig::default().with_seed(0)
                },
                ..AnalysisConfig::default()
            })
            .with_observer(Arc::new(NullObserver));
            for player in store.players().iter().take(4) {
                let id = player.key_mlbam.to_string();
                let _ = store.get_series(&id, None, None);
                let _ = analyzer.analyze_source(&store, &AnalysisRequest::new(id, "FF"));
            }
        }
    }
});
