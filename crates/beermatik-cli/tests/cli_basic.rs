//! Basic CLI E2E tests.
//!
//! Each test runs the compiled binary against its own temporary home
//! directory, so the database and config never touch the real ones.

use std::path::Path;
use std::process::Command;

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_beermatik"))
        .env("HOME", home)
        .args(args)
        .output()
        .expect("failed to execute CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn status_value(home: &Path) -> serde_json::Value {
    let (stdout, _, code) = run_cli(home, &["beer", "status"]);
    assert_eq!(code, 0, "beer status failed");
    serde_json::from_str(&stdout).expect("status is not valid JSON")
}

#[test]
fn add_updates_counters() {
    let home = tempfile::tempdir().unwrap();

    let (_, _, code) = run_cli(home.path(), &["beer", "add"]);
    assert_eq!(code, 0, "beer add failed");
    let (_, _, code) = run_cli(home.path(), &["beer", "add", "--size", "50cl"]);
    assert_eq!(code, 0, "beer add --size failed");

    let status = status_value(home.path());
    assert_eq!(status["beerCount"], 2);
    assert_eq!(status["totalVolumeCl"], 83);
}

#[test]
fn size_selection_sticks() {
    let home = tempfile::tempdir().unwrap();

    let (_, _, code) = run_cli(home.path(), &["beer", "size", "75cl"]);
    assert_eq!(code, 0, "beer size failed");
    assert_eq!(status_value(home.path())["selectedSize"], "75cl");

    // The next plain add uses the selected size.
    run_cli(home.path(), &["beer", "add"]);
    assert_eq!(status_value(home.path())["totalVolumeCl"], 75);
}

#[test]
fn unknown_size_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["beer", "size", "2pints"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("2pints"));
}

#[test]
fn session_new_keeps_preferences() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["beer", "size", "50cl"]);
    run_cli(home.path(), &["beer", "add"]);
    run_cli(home.path(), &["beer", "add"]);

    let (_, _, code) = run_cli(home.path(), &["session", "new"]);
    assert_eq!(code, 0, "session new failed");

    let status = status_value(home.path());
    assert_eq!(status["beerCount"], 0);
    assert_eq!(status["selectedSize"], "50cl");
}

#[test]
fn export_import_roundtrip() {
    let source = tempfile::tempdir().unwrap();
    run_cli(source.path(), &["beer", "add"]);
    run_cli(source.path(), &["beer", "add"]);
    let snapshot_path = source.path().join("backup.json");
    let (_, _, code) = run_cli(
        source.path(),
        &["session", "export", "--out", snapshot_path.to_str().unwrap()],
    );
    assert_eq!(code, 0, "session export failed");

    let target = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        target.path(),
        &["session", "import", snapshot_path.to_str().unwrap()],
    );
    assert_eq!(code, 0, "session import failed");
    assert_eq!(status_value(target.path())["beerCount"], 2);
}

#[test]
fn import_rejects_garbage() {
    let home = tempfile::tempdir().unwrap();
    let bad = home.path().join("bad.json");
    std::fs::write(&bad, "not a snapshot").unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["session", "import", bad.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("import failed"));
}

#[test]
fn clear_wipes_everything() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["beer", "add"]);
    run_cli(home.path(), &["notify", "on"]);

    let (_, _, code) = run_cli(home.path(), &["session", "clear"]);
    assert_eq!(code, 0, "session clear failed");

    let status = status_value(home.path());
    assert_eq!(status["beerCount"], 0);
    assert_eq!(status["notificationsEnabled"], false);
}

#[test]
fn notify_toggle_and_stats() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["notify", "on"]);
    assert_eq!(code, 0, "notify on failed");
    assert!(stdout.contains("true"));

    run_cli(home.path(), &["beer", "add"]);
    run_cli(home.path(), &["beer", "add"]);

    let (stdout, _, code) = run_cli(home.path(), &["notify", "stats"]);
    assert_eq!(code, 0, "notify stats failed");
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["has_scheduled"], true);

    let (_, _, code) = run_cli(home.path(), &["notify", "off"]);
    assert_eq!(code, 0, "notify off failed");
    let (stdout, _, _) = run_cli(home.path(), &["notify", "stats"]);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["has_scheduled"], false);
}

#[test]
fn config_set_then_get() {
    let home = tempfile::tempdir().unwrap();

    let (_, _, code) = run_cli(home.path(), &["config", "set", "reminder.title", "Prost"]);
    assert_eq!(code, 0, "config set failed");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "reminder.title"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "Prost");

    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    assert!(stdout.contains("Prost"));
}

#[test]
fn config_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "get", "reminder.nope"]);
    assert_ne!(code, 0);
}
