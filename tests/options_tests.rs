// Integration tests for per-session options records
//
// These tests verify that options.json round-trips, that defaults are
// produced for new sessions, and that updates preserve keys written by
// other tools.

use anyhow::Result;
use serde_json::json;
use smartnotes::session::{update_options, SessionOptions, OPTIONS_FILE};
use tempfile::TempDir;

#[test]
fn test_default_record_for_new_session() {
    let options = SessionOptions::for_session("2026-08-29_10-00-00");

    assert_eq!(options.ws_name, "2026-08-29_10-00-00");
    assert!(!options.transcription, "New session has no transcript");
    assert!(!options.can_generate_notes, "Notes gated until transcribed");
    assert!(options.transcription_path.is_empty());
    assert!(options.note_short_path.is_empty());
    assert!(options.thread_id.is_empty());
}

#[test]
fn test_save_and_load_round_trip() -> Result<()> {
    let dir = TempDir::new()?;

    let mut options = SessionOptions::for_session("session-a");
    options.transcription = true;
    options.transcription_path = "data/session-a/transcription.txt".to_string();
    options.thread_id = "thread_abc123".to_string();
    options.save(dir.path())?;

    let loaded = SessionOptions::load(dir.path())?;
    assert_eq!(loaded, options, "Loaded record should equal saved record");
    Ok(())
}

#[test]
fn test_load_tolerates_missing_fields() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join(OPTIONS_FILE),
        r#"{"ws_name": "old-session"}"#,
    )?;

    let loaded = SessionOptions::load(dir.path())?;
    assert_eq!(loaded.ws_name, "old-session");
    assert!(!loaded.transcription, "Missing fields default");
    assert!(loaded.assistant_name.is_empty());
    Ok(())
}

#[test]
fn test_update_preserves_unknown_keys() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join(OPTIONS_FILE),
        r#"{"ws_name": "s", "transcription": false, "custom_tool_key": 42}"#,
    )?;

    update_options(
        dir.path(),
        &[
            ("transcription", json!(true)),
            ("transcription_path", json!("t.txt")),
        ],
    )?;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(OPTIONS_FILE))?)?;
    assert_eq!(raw["transcription"], json!(true));
    assert_eq!(raw["transcription_path"], json!("t.txt"));
    assert_eq!(
        raw["custom_tool_key"],
        json!(42),
        "Keys from other tools must survive the rewrite"
    );
    Ok(())
}

#[test]
fn test_update_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let result = update_options(dir.path(), &[("transcription", json!(true))]);
    assert!(result.is_err(), "Updating a session without options should fail");
}
