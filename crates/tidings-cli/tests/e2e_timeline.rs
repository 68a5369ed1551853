//! E2E CLI tests covering:
//! - `td replay` over a recorded history, with and without a live stream
//! - `td show` event-history hydration and its error codes
//! - `td classify` over JSON lines from a file and from stdin
//!
//! Each test runs `td` as a subprocess against fixtures in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn td_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("td"));
    cmd.current_dir(dir);
    cmd.env("TIDINGS_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir);
    cmd.env_remove("FORMAT");
    cmd
}

fn history() -> Value {
    json!({
        "contents": [
            { "content_id": 10, "content_type": "file", "workspace_id": 1, "label": "report.pdf" },
            { "content_id": 20, "content_type": "file", "workspace_id": 1, "label": "notes.txt" }
        ],
        "paths": {
            "10": [
                { "content_id": 4, "label": "Projects" },
                { "content_id": 10, "label": "report.pdf" }
            ]
        },
        "comments": {
            "10": [
                { "content_id": 11, "content_type": "comment", "parent_id": 10, "workspace_id": 1 }
            ]
        },
        "messages": [
            {
                "event_id": 1,
                "event_type": "content.created.file",
                "created": "2021-04-16T10:00:00Z",
                "fields": {
                    "author": { "user_id": 1, "public_name": "Global manager" },
                    "content": { "content_id": 10, "content_type": "file", "workspace_id": 1, "label": "report.pdf" }
                }
            },
            {
                "event_id": 2,
                "event_type": "content.created.file",
                "created": "2021-04-16T10:01:00Z",
                "fields": {
                    "author": { "user_id": 1, "public_name": "Global manager" },
                    "content": { "content_id": 20, "content_type": "file", "workspace_id": 1, "label": "notes.txt" }
                }
            },
            {
                "event_id": 3,
                "event_type": "content.created.comment",
                "created": "2021-04-16T10:02:00Z",
                "fields": {
                    "author": { "user_id": 2, "public_name": "Alice" },
                    "content": {
                        "content_id": 11,
                        "content_type": "comment",
                        "parent_id": 10,
                        "parent_content_type": "file",
                        "workspace_id": 1
                    }
                }
            },
            {
                "event_id": 4,
                "event_type": "workspace_member.created",
                "created": "2021-04-16T10:03:00Z",
                "fields": {
                    "author": { "user_id": 1, "public_name": "Global manager" },
                    "workspace": { "workspace_id": 1, "label": "Recipes" },
                    "user": { "user_id": 2, "public_name": "Alice" }
                }
            }
        ]
    })
}

const LIVE: &str = r#"event: stream-open

: keep-alive

data: {"event_id": 5, "event_type": "content.modified.file", "created": "2021-04-16T10:04:00Z", "fields": {"content": {"content_id": 20, "content_type": "file", "workspace_id": 1, "label": "notes-v2.txt"}}}

"#;

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("history.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&history()).expect("json"),
    )
    .expect("write fixture");
    path
}

fn write_live(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("events.sse");
    std::fs::write(&path, body).expect("write live stream");
    path
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("td should not crash");
    assert!(
        output.status.success(),
        "td failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

fn json_error_code(cmd: &mut Command) -> String {
    let output = cmd.output().expect("td should not crash");
    assert!(!output.status.success());
    let json: Value =
        serde_json::from_slice(&output.stderr).expect("stderr should be a JSON error");
    json["error"]["error_code"]
        .as_str()
        .expect("error_code field")
        .to_string()
}

fn ids(timeline: &Value) -> Vec<String> {
    timeline
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["id"].as_str().expect("id").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

#[test]
fn replay_builds_sorted_timeline() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let timeline = json_stdout(td_cmd(dir.path()).args([
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));

    assert_eq!(
        ids(&timeline),
        ["workspace_member-e4", "content-10", "content-20"]
    );
    let report = &timeline[1];
    assert_eq!(report["newest_event_id"], 3);
    assert_eq!(report["comments"], 1);
    assert_eq!(report["label"], "report.pdf");
    assert_eq!(report["path"], json!(["Projects", "report.pdf"]));
    assert_eq!(timeline[0]["content_available"], false);
}

#[test]
fn replay_applies_live_stream_on_top() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());
    let live = write_live(dir.path(), LIVE);

    let timeline = json_stdout(td_cmd(dir.path()).args([
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--live",
        live.to_str().expect("utf8"),
        "--json",
    ]));

    assert_eq!(
        ids(&timeline),
        ["content-20", "workspace_member-e4", "content-10"]
    );
    assert_eq!(timeline[0]["newest_event_id"], 5);
    assert_eq!(timeline[0]["label"], "notes-v2.txt");
}

#[test]
fn replay_text_output_has_headers() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let header = predicate::str::starts_with("ID  EVENT  TYPE  COMMENTS  LABEL");
    let row = predicate::str::contains("content-10  3  content.created.comment  1  report.pdf");

    td_cmd(dir.path())
        .args(["replay", "--fixture", fixture.to_str().expect("utf8")])
        .assert()
        .success()
        .stdout(header)
        .stdout(row);
}

#[test]
fn replay_reports_stream_error_frame() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());
    let live = write_live(dir.path(), "event: stream-error\ndata: token expired\n\n");

    let code = json_error_code(td_cmd(dir.path()).args([
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--live",
        live.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E3003");
}

#[test]
fn replay_reports_failed_history_page() {
    let dir = TempDir::new().expect("tempdir");
    let mut broken = history();
    broken["status"] = json!({ "messages": 500 });
    let fixture = dir.path().join("broken.json");
    std::fs::write(&fixture, broken.to_string()).expect("write");

    let code = json_error_code(td_cmd(dir.path()).args([
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E3001");
}

#[test]
fn replay_rejects_malformed_fixture() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = dir.path().join("bad.json");
    std::fs::write(&fixture, "{ not json").expect("write");

    let code = json_error_code(td_cmd(dir.path()).args([
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E1002");
}

#[test]
fn config_page_size_is_honored_and_flag_overrides() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());
    let config = dir.path().join("td.toml");
    std::fs::write(&config, "[feed]\npage_size = 1\nmin_activity_count = 1\n").expect("write");

    let timeline = json_stdout(td_cmd(dir.path()).args([
        "--config",
        config.to_str().expect("utf8"),
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(ids(&timeline), ["workspace_member-e4"]);

    let timeline = json_stdout(td_cmd(dir.path()).args([
        "--config",
        config.to_str().expect("utf8"),
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--min",
        "3",
        "--json",
    ]));
    assert_eq!(
        ids(&timeline),
        ["workspace_member-e4", "content-10", "content-20"]
    );
}

#[test]
fn missing_explicit_config_is_a_config_error() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let code = json_error_code(td_cmd(dir.path()).args([
        "--config",
        "nope.toml",
        "replay",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E1001");
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[test]
fn show_hydrates_event_history() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let detail = json_stdout(td_cmd(dir.path()).args([
        "show",
        "content-10",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));

    assert_eq!(detail["id"], "content-10");
    let events: Vec<u64> = detail["event_list"]
        .as_array()
        .expect("event_list")
        .iter()
        .map(|event| event["event_id"].as_u64().expect("event_id"))
        .collect();
    assert_eq!(events, [3, 1]);
    assert_eq!(detail["comment_ids"], json!([11]));
}

#[test]
fn show_leaves_out_excluded_history_events() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());
    let config = dir.path().join("td.toml");
    std::fs::write(
        &config,
        "[feed]\nexclude_event_types = [\"content.created.comment\"]\n",
    )
    .expect("write");

    let detail = json_stdout(td_cmd(dir.path()).args([
        "--config",
        config.to_str().expect("utf8"),
        "show",
        "content-10",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));

    let events: Vec<u64> = detail["event_list"]
        .as_array()
        .expect("event_list")
        .iter()
        .map(|event| event["event_id"].as_u64().expect("event_id"))
        .collect();
    assert_eq!(events, [1]);
    assert_eq!(detail["newest_event_id"], 1);
}

#[test]
fn show_includes_live_events() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());
    let live = write_live(dir.path(), LIVE);

    let detail = json_stdout(td_cmd(dir.path()).args([
        "show",
        "content-20",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--live",
        live.to_str().expect("utf8"),
        "--json",
    ]));

    assert_eq!(detail["event_list"].as_array().expect("events").len(), 2);
    assert_eq!(detail["event_list"][0]["event_id"], 5);
}

#[test]
fn show_unknown_activity_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let code = json_error_code(td_cmd(dir.path()).args([
        "show",
        "content-99",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E2003");
}

#[test]
fn show_rejects_malformed_id() {
    let dir = TempDir::new().expect("tempdir");
    let fixture = write_fixture(dir.path());

    let code = json_error_code(td_cmd(dir.path()).args([
        "show",
        "bogus",
        "--fixture",
        fixture.to_str().expect("utf8"),
        "--json",
    ]));
    assert_eq!(code, "E2002");
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

#[test]
fn classify_reads_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let input = concat!(
        r#"{"event_id": 7, "event_type": "workspace_subscription.created", "created": "2021-04-16T10:00:00Z"}"#,
        "\n",
        r#"{"event_id": 8, "event_type": "user.modified", "created": "2021-04-16T10:00:00Z"}"#,
        "\n",
    );

    let rows = json_stdout(
        td_cmd(dir.path())
            .args(["classify", "--json"])
            .write_stdin(input),
    );

    assert_eq!(rows[0]["activity"], "workspace_subscription-e7");
    assert_eq!(rows[1]["activity"], Value::Null);
}

#[test]
fn classify_reports_bad_line() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("messages.jsonl");
    std::fs::write(&input, "not a message\n").expect("write");

    td_cmd(dir.path())
        .args(["classify", input.to_str().expect("utf8")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn completions_generate_script() {
    let dir = TempDir::new().expect("tempdir");
    td_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("td"));
}
