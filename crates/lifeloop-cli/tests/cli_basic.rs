//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_lifeloop-cli"))
        .env("LIFELOOP_DATA_DIR", data_dir)
        .env_remove("LIFELOOP_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    stdout
}

fn created_id(stdout: &str) -> String {
    stdout
        .trim()
        .rsplit(' ')
        .next()
        .expect("id in output")
        .to_string()
}

#[test]
fn test_habit_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["habit", "add", "Read"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No authenticated session"), "stderr: {stderr}");
}

#[test]
fn test_habit_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["session", "login", "user-1"]);

    let out = run_ok(dir.path(), &["habit", "add", "Read", "--time", "21:00"]);
    assert!(out.contains("Habit created:"));
    let id = created_id(&out);

    let out = run_ok(dir.path(), &["habit", "toggle", &id]);
    assert!(out.contains("done today"));
    assert!(out.contains("streak 1"));

    let streaks: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["habit", "streaks"])).unwrap();
    assert_eq!(streaks["best"], 1);

    let habits: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["habit", "list"])).unwrap();
    assert_eq!(habits.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_finance_day_summary() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["session", "login", "user-1"]);
    run_ok(dir.path(), &["finance", "add", "income", "200", "salary", "--date", "2024-01-01"]);
    run_ok(dir.path(), &["finance", "add", "expense", "50", "food", "--date", "2024-01-01"]);

    let out = run_ok(dir.path(), &["finance", "day", "--date", "2024-01-01"]);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["income"], 200.0);
    assert_eq!(summary["expenses"], 50.0);
    assert_eq!(summary["balance"], 150.0);
}

#[test]
fn test_food_log_totals() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["food", "log", "Oats", "300", "--date", "2024-01-01"]);
    run_ok(dir.path(), &["food", "log", "Apple", "80", "--date", "Mon Jan 01 2024"]);

    let out = run_ok(dir.path(), &["food", "show", "--date", "2024-01-01"]);
    let shown: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(shown["totals"]["calories"], 380);
    assert_eq!(shown["record"]["calories"], 380);
}

#[test]
fn test_notify_plan_lists_tags() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["session", "login", "user-1"]);
    run_ok(dir.path(), &["habit", "add", "Gym", "--cadence", "weekly", "--days", "Mon,Fri"]);

    let out = run_ok(dir.path(), &["notify", "plan"]);
    let planned: serde_json::Value = serde_json::from_str(&out).unwrap();
    let tags: Vec<&str> = planned
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["tag"].as_str())
        .collect();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().any(|t| t.ends_with(":mon")));
    assert!(tags.iter().any(|t| t.ends_with(":fri")));

    let report: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["notify", "reschedule"])).unwrap();
    assert_eq!(report["registered"], 2);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "reminders.fallback_hour", "7"]);
    let out = run_ok(dir.path(), &["config", "get", "reminders.fallback_hour"]);
    assert_eq!(out.trim(), "7");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}
