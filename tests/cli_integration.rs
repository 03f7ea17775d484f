use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cmd(state_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("omc-registry").unwrap();
    cmd.env("OMC_STATE_DIR", state_dir);
    cmd
}

fn register_args<'a>(message_id: &'a str, session_id: &'a str) -> Vec<&'a str> {
    vec![
        "register",
        "--platform",
        "discord-bot",
        "--message-id",
        message_id,
        "--session-id",
        session_id,
        "--pane",
        "%0",
        "--session-name",
        "main",
        "--event",
        "session-start",
    ]
}

#[test]
fn register_then_lookup_round_trips() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    cmd(&state)
        .args(register_args("123", "session-1"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"messageId\":\"123\""));

    cmd(&state)
        .args(["lookup", "discord-bot", "123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sessionId\":\"session-1\""))
        .stdout(predicate::str::contains("\"tmuxPaneId\":\"%0\""));
}

#[test]
fn lookup_miss_fails_with_machine_readable_error() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    cmd(&state)
        .args(["lookup", "telegram", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\":\"mapping_not_found\""));
}

#[test]
fn remove_session_reports_removed_count() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    cmd(&state)
        .args(register_args("1", "doomed"))
        .assert()
        .success();
    cmd(&state)
        .args(register_args("2", "doomed"))
        .assert()
        .success();
    cmd(&state)
        .args(register_args("3", "survivor"))
        .assert()
        .success();

    cmd(&state)
        .args(["remove-session", "doomed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":2"));

    cmd(&state)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("survivor"))
        .stdout(predicate::str::contains("doomed").not());
}

#[test]
fn remove_pane_and_prune_on_empty_registry_remove_nothing() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    cmd(&state)
        .args(["remove-pane", "%9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":0"));

    cmd(&state)
        .args(["prune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":0"));
}

#[test]
fn prune_drops_expired_mappings() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    let mut args = register_args("old", "session-old");
    args.extend(["--created-at", "2020-01-01T00:00:00.000Z"]);
    cmd(&state).args(args).assert().success();
    cmd(&state)
        .args(register_args("fresh", "session-fresh"))
        .assert()
        .success();

    cmd(&state)
        .args(["prune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":1"));

    cmd(&state)
        .args(["lookup", "discord-bot", "fresh"])
        .assert()
        .success();
    cmd(&state)
        .args(["lookup", "discord-bot", "old"])
        .assert()
        .failure();
}

#[test]
fn list_pretty_format_is_human_readable() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");

    cmd(&state)
        .args(register_args("123", "session-1"))
        .assert()
        .success();

    cmd(&state)
        .args(["list", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[discord-bot] message 123"))
        .stdout(predicate::str::contains("pane: %0 in main"));
}
