//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated data directory and verify
//! outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against `home` and return (stdout, stderr, code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_cleanstreak"))
        .args(args)
        .env("CLEANSTREAK_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed {:?}: {}", args, stderr);
    stdout
}

fn created_id(stdout: &str) -> String {
    stdout
        .trim()
        .strip_prefix("Habit created: ")
        .expect("unexpected add output")
        .to_string()
}

#[test]
fn test_habit_add_and_list_json() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        home.path(),
        &["habit", "add", "Smoking", "--icon", "cigarette", "--since", "2020-01-01"],
    );
    let id = created_id(&out);

    let list = run_cli_success(home.path(), &["habit", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["habit"]["id"], id.as_str());
    assert_eq!(items[0]["habit"]["max_streak_days"], 0);
    assert!(items[0]["streak"]["days"].as_u64().unwrap() > 365);
    assert!(items[0]["next_milestone"].is_null());
}

#[test]
fn test_empty_name_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["habit", "add", "   "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_relapse_keeps_best_streak_and_unlocks() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        home.path(),
        &["habit", "add", "Alcohol", "--icon", "beer", "--since", "2020-01-01"],
    );
    let id = created_id(&out);

    let relapse = run_cli_success(home.path(), &["habit", "relapse", &id[..8], "--note", "party"]);
    assert!(relapse.contains("Relapse recorded"));
    assert!(relapse.contains("Achievement unlocked: Legend"));

    let show = run_cli_success(home.path(), &["habit", "show", &id, "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&show).unwrap();
    assert!(parsed["habit"]["max_streak_days"].as_u64().unwrap() > 365);
    assert!(!parsed["habit"]["last_relapse"].is_null());
    assert_eq!(parsed["streak"]["days"], 0);
    assert_eq!(parsed["relapses"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["relapses"][0]["note"], "party");
    assert_eq!(parsed["achievements"].as_array().unwrap().len(), 5);

    let achievements = run_cli_success(home.path(), &["achievements", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&achievements).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 5);
}

#[test]
fn test_delete_hides_habit() {
    let home = tempfile::tempdir().unwrap();
    let id = created_id(&run_cli_success(home.path(), &["habit", "add", "Gaming"]));
    run_cli_success(home.path(), &["habit", "delete", &id]);

    let list = run_cli_success(home.path(), &["habit", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert!(parsed.as_array().unwrap().is_empty());

    let (_, stderr, code) = run_cli(home.path(), &["habit", "relapse", &id]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_status_reports_new_achievement_once() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(
        home.path(),
        &["habit", "add", "Sugar", "--icon", "candy", "--since", "2020-01-01"],
    );

    let first = run_cli_success(home.path(), &["status", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(parsed["new_achievement"]["achievement_type"], "legend");
    assert_eq!(parsed["dashboard"]["active_habits"], 1);
    assert_eq!(parsed["dashboard"]["achievements"]["unlocked"], 5);

    let second = run_cli_success(home.path(), &["status", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&second).unwrap();
    assert!(parsed["new_achievement"].is_null());
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_cli_success(home.path(), &["config", "get", "user_id"]).trim(), "local");
    run_cli_success(home.path(), &["config", "set", "user_id", "someone"]);
    assert_eq!(run_cli_success(home.path(), &["config", "get", "user_id"]).trim(), "someone");

    let (_, _, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_habits_are_scoped_to_configured_user() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["habit", "add", "Coffee", "--icon", "coffee"]);
    run_cli_success(home.path(), &["config", "set", "user_id", "other"]);

    let list = run_cli_success(home.path(), &["habit", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert!(parsed.as_array().unwrap().is_empty());
}

#[test]
fn test_catalog_and_icons() {
    let home = tempfile::tempdir().unwrap();
    let catalog = run_cli_success(home.path(), &["achievements", "catalog"]);
    assert_eq!(catalog.lines().count(), 5);
    assert!(catalog.contains("first_week"));

    let icons = run_cli_success(home.path(), &["habit", "icons"]);
    assert!(icons.contains("cigarette"));
}

#[test]
fn test_completions_and_icons_write_nothing() {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("data");

    let script = run_cli_success(&data, &["completions", "bash"]);
    assert!(script.contains("cleanstreak"));
    run_cli_success(&data, &["habit", "icons"]);

    assert!(!data.exists());
}
