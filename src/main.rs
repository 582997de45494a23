use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use velocliff::analysis::{AnalysisRequest, Analyzer, ObservationSource};
use velocliff::changepoint::{AnalysisConfig, Cancellation};
use velocliff::cli::{Cli, OutputFormat};
use velocliff::csv_output::TraceCsv;
use velocliff::dataset::PitchStore;
use velocliff::observation::SeasonRange;
use velocliff::summary;

/// Initialize tracing subscriber; `--debug` turns on everything, otherwise RUST_LOG decides
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the config file (if any) with command-line overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(samples) = args.samples {
        config.bayesian.n_samples = samples;
    }
    if let Some(seed) = args.seed {
        config.bayesian.seed = Some(seed);
    }
    if let Some(window) = args.window {
        config.cusum.window = window;
        config.bayesian.window = window;
    }
    if let Some(drift) = args.drift {
        config.cusum.drift = drift;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Resolve --player / --pitcher to (id, display label)
fn resolve_subject(args: &Cli, store: &PitchStore) -> Result<(String, String)> {
    if let Some(id) = &args.pitcher {
        return Ok((id.clone(), id.clone()));
    }

    let name = args
        .player
        .as_deref()
        .context("Either --player or --pitcher is required")?;
    let player = store
        .find_player(name)?
        .with_context(|| format!("Player not found: {}", name))?;
    tracing::info!("Found player {} with ID: {}", name, player.key_mlbam);
    Ok((player.key_mlbam.to_string(), name.to_string()))
}

fn season_range(args: &Cli) -> Option<SeasonRange> {
    match (args.start_year, args.end_year) {
        (Some(start), Some(end)) => Some(SeasonRange::new(start, end)),
        (Some(start), None) => Some(SeasonRange::single(start)),
        (None, Some(end)) => Some(SeasonRange::single(end)),
        (None, None) => None,
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let store = PitchStore::from_file(&args.data)?;
    let (subject_id, label) = resolve_subject(&args, &store)?;

    let mut request = AnalysisRequest::new(subject_id, args.pitch_type.clone());
    if let Some(seasons) = season_range(&args) {
        request = request.with_seasons(seasons);
    }

    if args.summary {
        let history = store.get_series(&request.subject_id, request.seasons, None)?;
        let summaries = summary::summarize_by_category(&history);
        match args.format {
            OutputFormat::Text => println!("{}", summary::to_table_string(&summaries)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        }
    }

    let mut cancellation = Cancellation::none();
    if let Some(ms) = args.timeout_ms {
        cancellation = cancellation.with_deadline(Instant::now() + Duration::from_millis(ms));
    }

    let analyzer = Analyzer::new(config).with_cancellation(cancellation);
    let analysis = analyzer.analyze_source(&store, &request)?;

    if let Some(path) = &args.trace_csv {
        fs::write(path, TraceCsv::from_analysis(&analysis).to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    match args.format {
        OutputFormat::Text => print!("{}", analysis.result.to_report_string(Some(&label))),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis.result)?),
    }

    Ok(())
}
