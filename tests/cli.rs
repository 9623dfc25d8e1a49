// Drives the compiled binary against a throwaway database and config path.
// `play` needs a TTY, so only its refusal without one is covered here.

use assert_cmd::Command;
use chrono::{Duration, TimeZone, Utc};
use recall::games::GameKind;
use recall::result::GameResult;
use recall::store::{ResultStore, SqliteResultStore};
use std::path::Path;
use tempfile::TempDir;

fn recall(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("recall").unwrap();
    cmd.arg("--db")
        .arg(dir.join("results.db"))
        .arg("--config")
        .arg(dir.join("config.json"))
        .env_remove("RUST_LOG");
    cmd
}

fn seed(dir: &Path) {
    let store = SqliteResultStore::open(dir.join("results.db")).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 10, 30, 0).unwrap();
    store
        .record_game_result(&GameResult::new(GameKind::MemoryMatch, 84, 12_000.0, 100.0, 1, at))
        .unwrap();
    store
        .record_game_result(&GameResult::new(GameKind::ReactionTime, 90, 300.0, 100.0, 1, at))
        .unwrap();
}

#[test]
fn summary_on_empty_history() {
    let dir = TempDir::new().unwrap();
    let output = recall(dir.path()).arg("summary").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("No cognitive assessments found"));
}

#[test]
fn summary_json_reports_seeded_results() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = recall(dir.path()).args(["summary", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_assessments"], 2);
    assert!(json["avg_focus_score"].as_f64().is_some());
}

#[test]
fn history_csv_export() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = recall(dir.path()).args(["history", "--csv"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("game_type,score,duration_ms,accuracy_pct,difficulty_level,completed_at")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.starts_with("memory_match,84,")));
    assert!(rows.iter().any(|r| r.starts_with("reaction_test,90,")));
}

#[test]
fn history_filters_by_game() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = recall(dir.path())
        .args(["history", "--game", "reaction", "--csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(!stdout.contains("memory_match"));
}

#[test]
fn history_days_drops_older_results() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let store = SqliteResultStore::open(dir.path().join("results.db")).unwrap();
    store
        .record_game_result(&GameResult::new(
            GameKind::SequenceRecall,
            30,
            500.0,
            100.0,
            3,
            Utc::now() - Duration::days(2),
        ))
        .unwrap();

    let output = recall(dir.path())
        .args(["history", "--days", "7", "--csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("sequence_recall,30,"));
    assert!(!stdout.contains("memory_match"));
}

#[test]
fn trend_needs_more_data() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = recall(dir.path())
        .args(["trend", "--metric", "focus", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metric"], "focus");
    assert_eq!(json["trend"], "insufficient_data");
    assert_eq!(json["points"], 1);
}

#[test]
fn play_refuses_without_tty() {
    let dir = TempDir::new().unwrap();
    recall(dir.path()).args(["play", "memory"]).assert().failure();
}
