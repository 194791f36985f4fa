//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with `FITPACE_HOME` pointed at a fresh
//! temporary directory and verify outputs.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_fitpace"))
        .args(args)
        .env("FITPACE_HOME", home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout should be JSON")
}

#[test]
fn test_simulate_plain_countdown_completes() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["timer", "simulate", "--duration", "5", "--seconds", "5"],
    );
    assert_eq!(code, 0);
    let snapshot = json(&stdout);
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["elapsed_secs"], 5);
    assert_eq!(snapshot["remaining_secs"], 0);
    assert_eq!(snapshot["progress_ratio"], 1.0);
}

#[test]
fn test_simulate_pause_window_is_not_counted() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &[
            "timer", "simulate", "--duration", "60", "--seconds", "25", "--pause-at", "10",
            "--resume-at", "15",
        ],
    );
    assert_eq!(code, 0);
    let snapshot = json(&stdout);
    assert_eq!(snapshot["status"], "running");
    assert_eq!(snapshot["elapsed_secs"], 20);
}

#[test]
fn test_simulate_breathing_cycle_position() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &[
            "timer",
            "simulate",
            "--duration",
            "3600",
            "--phases",
            "INHALE:4,HOLD:4,EXHALE:4",
            "--seconds",
            "13",
        ],
    );
    assert_eq!(code, 0);
    let snapshot = json(&stdout);
    assert_eq!(snapshot["elapsed_secs"], 13);
    assert_eq!(snapshot["current_phase_index"], 0);
    assert_eq!(snapshot["current_phase_name"], "INHALE");
}

#[test]
fn test_simulate_uses_configured_meditation_length() {
    let home = tempfile::TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.meditation_minutes", "5"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(
        home.path(),
        &["timer", "simulate", "--breathing", "box", "--seconds", "300"],
    );
    assert_eq!(code, 0);
    let snapshot = json(&stdout);
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["total_duration_secs"], 300);
}

#[test]
fn test_simulate_events_flag_prints_json_lines() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["timer", "simulate", "--duration", "2", "--seconds", "2", "--events"],
    );
    assert_eq!(code, 0);
    let types: Vec<String> = stdout
        .lines()
        .take(3)
        .map(|line| json(line)["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, vec!["session_started", "ticked", "session_completed"]);
}

#[test]
fn test_zero_duration_is_rejected() {
    let home = tempfile::TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["timer", "simulate", "--duration", "0", "--seconds", "1"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_invalid_phase_list_is_rejected() {
    let home = tempfile::TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "timer", "simulate", "--duration", "60", "--phases", "inhale:-4", "--seconds", "1",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_presets_filter_by_kind() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["timer", "presets", "--kind", "breathing"]);
    assert_eq!(code, 0);
    let entries = json(&stdout);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e["kind"] == "breathing"));
}

#[test]
fn test_config_get_set() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "timer.fasting_protocol"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "16:8");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.fasting_protocol", "omad"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "timer.fasting_protocol"]);
    assert_eq!(stdout.trim(), "omad");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.fasting_protocol", "12:12"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_live_run_records_history() {
    let home = tempfile::TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.tick_interval_ms", "10"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["timer", "run", "--duration", "3"]);
    assert_eq!(code, 0);
    let last = stdout.lines().last().expect("events printed");
    assert_eq!(json(last)["type"], "session_completed");

    let (stdout, _, code) = run_cli(home.path(), &["history", "list"]);
    assert_eq!(code, 0);
    let rows = json(&stdout);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "custom");
    assert_eq!(rows[0]["outcome"], "completed");
    assert_eq!(rows[0]["elapsed_secs"], 3);

    let (stdout, _, code) = run_cli(home.path(), &["history", "stats"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["completion_pct"], 100);
}

#[test]
fn test_search_records_recent_queries() {
    let home = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["search", "query", "omad"]);
    assert_eq!(code, 0);
    let hits = json(&stdout);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    run_cli(home.path(), &["search", "query", "box", "breathing"]);
    let (stdout, _, code) = run_cli(home.path(), &["search", "recent"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["box breathing", "omad"]);

    let (_, _, code) = run_cli(home.path(), &["search", "clear"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["search", "recent"]);
    assert!(stdout.trim().is_empty());
}
