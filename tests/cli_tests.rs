//! Integration tests for the velocliff command-line tool

use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FLAHERTY: i64 = 656427;

/// Write a pitch data file with one fastball season and a handful of curveballs
fn write_pitch_file(dir: &Path) -> PathBuf {
    let mut pitches: Vec<serde_json::Value> = (0..329)
        .map(|i| {
            let speed = 88.0 + i as f64 * 9.5 / 328.0;
            let base = if speed < 93.0 { 0.45 } else { 0.30 };
            let wobble = ((i * 7) % 5) as f64 * 0.01 - 0.02;
            json!({
                "pitcher": FLAHERTY,
                "game_year": 2024,
                "pitch_type": "FF",
                "release_speed": speed,
                "estimated_woba_using_speedangle": base + wobble,
                "delta_run_exp": -0.01
            })
        })
        .collect();
    pitches.extend((0..40).map(|i| {
        json!({
            "pitcher": FLAHERTY,
            "game_year": 2024,
            "pitch_type": "KC",
            "release_speed": 77.0 + (i % 10) as f64 * 0.2,
            "estimated_woba_using_speedangle": 0.25,
            "delta_run_exp": null
        })
    }));

    let data = json!({
        "players": [
            {"key_mlbam": FLAHERTY, "name_first": "Jack", "name_last": "Flaherty"}
        ],
        "pitches": pitches
    });

    let path = dir.join("pitches.json");
    fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
    path
}

fn velocliff() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("velocliff")
}

#[test]
fn test_text_report_by_player_name() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--player", "Jack Flaherty", "--start-year", "2024"])
        .args(["--seed", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VELOCITY CLIFF ANALYSIS RESULTS"))
        .stdout(predicate::str::contains("Player: Jack Flaherty"))
        .stdout(predicate::str::contains("Years: 2024-2024"))
        .stdout(predicate::str::contains("Total Pitches: 329"))
        .stdout(predicate::str::contains("FF Pitches: 329"))
        .stdout(predicate::str::contains("CUSUM Threshold:"))
        .stdout(predicate::str::contains("Bayesian Threshold:"))
        .stdout(predicate::str::contains("Average Threshold:"));
}

#[test]
fn test_json_output_parses() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());

    let output = velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--pitcher", "656427", "--format", "json", "--seed", "7"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["subject_id"], "656427");
    assert_eq!(parsed["category"], "FF");
    assert_eq!(parsed["category_observations"], 329);

    let cusum = parsed["cusum_threshold"].as_f64().unwrap();
    let bayesian = parsed["bayesian_threshold"].as_f64().unwrap();
    let average = parsed["average_threshold"].as_f64().unwrap();
    assert!((cusum - 93.0).abs() <= 0.5);
    assert!((bayesian - 93.0).abs() <= 0.5);
    assert_eq!(average, (cusum + bayesian) / 2.0);
}

#[test]
fn test_missing_season_reports_no_data() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--pitcher", "656427", "--start-year", "2019"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No FF data found for 656427"));
}

#[test]
fn test_unknown_player_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--player", "Nolan Ryan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Player not found"));
}

#[test]
fn test_trace_csv_is_written() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());
    let trace = dir.path().join("trace.csv");

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--pitcher", "656427", "--seed", "1"])
        .arg("--trace-csv")
        .arg(&trace)
        .assert()
        .success();

    let csv = fs::read_to_string(&trace).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "covariate,outcome,smoothed,cusum");
    assert_eq!(lines.len(), 330);
}

#[test]
fn test_summary_table() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--pitcher", "656427", "--summary", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("type"))
        .stdout(predicate::str::contains("KC"))
        .stdout(predicate::str::contains("CUSUM Threshold:"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let data = write_pitch_file(dir.path());
    let config = dir.path().join("velocliff.toml");
    fs::write(&config, "[bayesian]\nn_samples = 0\n").unwrap();

    velocliff()
        .arg("--data")
        .arg(&data)
        .args(["--pitcher", "656427"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_requires_subject() {
    velocliff()
        .args(["--data", "pitches.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--player"));
}
