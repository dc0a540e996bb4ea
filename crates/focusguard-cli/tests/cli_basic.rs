//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

struct Output {
    stdout: String,
    stderr: String,
    code: i32,
}

impl Output {
    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }
}

/// Run a CLI command against `data_dir`.
fn run_cli(data_dir: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_focusguard"))
        .args(args)
        .env("FOCUSGUARD_DATA_DIR", data_dir)
        .env("FOCUSGUARD_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    Output {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code().unwrap_or(-1),
    }
}

#[test]
fn test_timer_status_starts_idle() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let snapshot = out.json();
    assert_eq!(snapshot["state"], "idle");
    assert_eq!(snapshot["timeRemaining"], 0);
}

#[test]
fn test_timer_lifecycle_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();

    let out = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let event = out.json();
    assert_eq!(event["kind"], "start");
    assert_eq!(event["snapshot"]["type"], "work");
    assert_eq!(event["snapshot"]["timeRemaining"], 25 * 60);

    let out = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(out.json()["snapshot"]["state"], "paused");

    // Already paused: prints the snapshot instead of an event.
    let out = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(out.json()["state"], "paused");

    let out = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(out.json()["snapshot"]["state"], "running");

    let out = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(out.json()["snapshot"]["state"], "idle");

    let out = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(out.json()["state"], "idle");
}

#[test]
fn test_timer_run_ticks() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start", "break"]);
    let out = run_cli(dir.path(), &["timer", "run", "--ticks", "1"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let snapshot = out.json();
    assert_eq!(snapshot["type"], "break");
    // Restoring also counts the wall-clock seconds since `start`.
    let remaining = snapshot["timeRemaining"].as_u64().unwrap();
    assert!((5 * 60 - 10..5 * 60).contains(&remaining), "timeRemaining: {remaining}");
}

#[test]
fn test_blocking_follows_the_work_session() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["block", "add", "facebook.com"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(out.json()["isActive"], true);

    let url = "https://sub.facebook.com/feed";
    assert_eq!(run_cli(dir.path(), &["check", url]).json()["blocked"], false);

    run_cli(dir.path(), &["timer", "start", "work"]);
    let check = run_cli(dir.path(), &["check", url]).json();
    assert_eq!(check["blocked"], true);
    assert_eq!(check["workSessionActive"], true);

    let visit = run_cli(dir.path(), &["visit", url]).json();
    assert_eq!(visit["redirect"], "blocked.html");

    run_cli(dir.path(), &["block", "disable", "facebook.com"]);
    assert_eq!(run_cli(dir.path(), &["check", url]).json()["blocked"], false);

    run_cli(dir.path(), &["block", "enable", "facebook.com"]);
    run_cli(dir.path(), &["timer", "stop"]);
    run_cli(dir.path(), &["timer", "start", "break"]);
    assert_eq!(run_cli(dir.path(), &["check", url]).json()["blocked"], false);
}

#[test]
fn test_block_list_management() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["block", "add", "reddit.com"]);
    let out = run_cli(dir.path(), &["block", "add", "reddit.com"]);
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("already blocked"));

    let list = run_cli(dir.path(), &["block", "list"]).json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    let id = list[0]["id"].as_str().unwrap().to_string();

    assert_eq!(run_cli(dir.path(), &["block", "remove", &id]).code, 0);
    let list = run_cli(dir.path(), &["block", "list"]).json();
    assert!(list.as_array().unwrap().is_empty());

    assert_eq!(run_cli(dir.path(), &["block", "remove", "nope"]).code, 1);
}

#[test]
fn test_settings_set_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["settings", "set", "workDuration", "50"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(run_cli(dir.path(), &["settings", "show"]).json()["workDuration"], 50);

    let out = run_cli(dir.path(), &["settings", "set", "workDuration", "0"]);
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("error: 'workDuration' must be between"), "stderr: {}", out.stderr);
    assert_eq!(run_cli(dir.path(), &["settings", "show"]).json()["workDuration"], 50);

    let event = run_cli(dir.path(), &["timer", "start"]).json();
    assert_eq!(event["snapshot"]["duration"], 50 * 60);
}

#[test]
fn test_visit_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["visit", "https://github.com/", "--title", "GitHub"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let visit = out.json();
    assert_eq!(visit["blocked"], false);
    assert!(visit["recorded"].is_null());

    let summary = run_cli(dir.path(), &["stats"]).json();
    assert_eq!(summary["totalSecs"], 0);
    assert!(run_cli(dir.path(), &["stats", "--by", "url"]).json().as_array().unwrap().is_empty());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["config", "get", "backend.timeout_secs"]);
    assert_eq!(out.stdout.trim(), "10");

    let out = run_cli(dir.path(), &["config", "set", "logging.level", "debug"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(run_cli(dir.path(), &["config", "get", "logging.level"]).stdout.trim(), "debug");

    assert_eq!(run_cli(dir.path(), &["config", "get", "no.such.key"]).code, 1);
    assert_eq!(run_cli(dir.path(), &["config", "set", "defaults.workDuration", "0"]).code, 1);

    run_cli(dir.path(), &["config", "reset"]);
    let list = run_cli(dir.path(), &["config", "list"]).json();
    assert_eq!(list["logging"]["level"], "info");
}
