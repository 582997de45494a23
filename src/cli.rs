//! CLI argument parsing for velocliff

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "velocliff")]
#[command(version)]
#[command(
    about = "Find the release speed where a pitcher's results fall off a cliff",
    long_about = None
)]
#[command(group(ArgGroup::new("subject").required(true).args(["player", "pitcher"])))]
pub struct Cli {
    /// Pitch data file (JSON with "players" and "pitches")
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Player name, e.g. "Jack Flaherty"
    #[arg(long)]
    pub player: Option<String>,

    /// Pitcher id (MLBAM)
    #[arg(long, value_name = "ID")]
    pub pitcher: Option<String>,

    /// First season to include
    #[arg(long = "start-year", value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last season to include (defaults to --start-year)
    #[arg(long = "end-year", value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Pitch type to analyze
    #[arg(long = "pitch-type", default_value = "FF")]
    pub pitch_type: String,

    /// Analysis configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Metropolis iterations for the Bayesian detector
    #[arg(long, value_name = "N")]
    pub samples: Option<usize>,

    /// Seed for the Bayesian detector (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Smoothing window for both detectors
    #[arg(long, value_name = "PITCHES")]
    pub window: Option<usize>,

    /// CUSUM drift allowance k
    #[arg(long, value_name = "K")]
    pub drift: Option<f64>,

    /// Abort the Bayesian search after this many milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print per-pitch-type summary statistics before the analysis
    #[arg(long)]
    pub summary: bool,

    /// Write per-pitch smoothed outcome and CUSUM values to a CSV file
    #[arg(long = "trace-csv", value_name = "FILE")]
    pub trace_csv: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_player() {
        let cli = Cli::parse_from([
            "velocliff",
            "--data",
            "pitches.json",
            "--player",
            "Jack Flaherty",
        ]);
        assert_eq!(cli.player.as_deref(), Some("Jack Flaherty"));
        assert_eq!(cli.pitch_type, "FF");
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.start_year.is_none());
        assert!(!cli.summary);
    }

    #[test]
    fn test_cli_requires_subject() {
        assert!(Cli::try_parse_from(["velocliff", "--data", "pitches.json"]).is_err());
    }

    #[test]
    fn test_cli_player_and_pitcher_conflict() {
        let result = Cli::try_parse_from([
            "velocliff",
            "--data",
            "pitches.json",
            "--player",
            "Jack Flaherty",
            "--pitcher",
            "656427",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "velocliff",
            "-d",
            "pitches.json",
            "--pitcher",
            "656427",
            "--start-year",
            "2022",
            "--end-year",
            "2024",
            "--pitch-type",
            "SI",
            "--samples",
            "20000",
            "--seed",
            "42",
            "--window",
            "8",
            "--drift",
            "0.01",
            "--timeout-ms",
            "500",
            "--format",
            "json",
            "--summary",
            "--trace-csv",
            "trace.csv",
        ]);
        assert_eq!(cli.pitcher.as_deref(), Some("656427"));
        assert_eq!(cli.start_year, Some(2022));
        assert_eq!(cli.end_year, Some(2024));
        assert_eq!(cli.pitch_type, "SI");
        assert_eq!(cli.samples, Some(20000));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.window, Some(8));
        assert_eq!(cli.drift, Some(0.01));
        assert_eq!(cli.timeout_ms, Some(500));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.summary);
        assert_eq!(cli.trace_csv, Some(PathBuf::from("trace.csv")));
    }
}
