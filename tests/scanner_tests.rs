// Integration tests for the workspace scanner
//
// These tests verify that a scan initializes options for fresh session
// directories, leaves existing records untouched, and survives broken
// sessions.

use anyhow::Result;
use smartnotes::session::{SessionOptions, OPTIONS_FILE};
use smartnotes::workspace::scan_once;
use tempfile::TempDir;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_scan_initializes_all_new_sessions() -> Result<()> {
    let data_dir = TempDir::new()?;
    for name in ["session-a", "session-b", "session-c"] {
        std::fs::create_dir(data_dir.path().join(name))?;
    }

    let (tx, mut rx) = mpsc::channel(16);
    scan_once(data_dir.path(), &tx).await?;
    drop(tx);

    let mut reported = Vec::new();
    while let Some(options) = rx.recv().await {
        reported.push(options);
    }

    assert_eq!(reported.len(), 3, "Every new session gets a record");
    let names: Vec<&str> = reported.iter().map(|o| o.ws_name.as_str()).collect();
    assert_eq!(names, ["session-a", "session-b", "session-c"]);

    for name in ["session-a", "session-b", "session-c"] {
        assert!(
            data_dir.path().join(name).join(OPTIONS_FILE).exists(),
            "Options file should be written for {}",
            name
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_scan_reports_existing_records_unchanged() -> Result<()> {
    let data_dir = TempDir::new()?;
    let session_dir = data_dir.path().join("session-a");
    std::fs::create_dir(&session_dir)?;

    let mut existing = SessionOptions::for_session("session-a");
    existing.transcription = true;
    existing.transcription_path = "x.txt".to_string();
    existing.save(&session_dir)?;

    let (tx, mut rx) = mpsc::channel(16);
    scan_once(data_dir.path(), &tx).await?;
    drop(tx);

    let reported = rx.recv().await.expect("one session reported");
    assert_eq!(reported, existing, "Existing record must not be rewritten");
    Ok(())
}

#[tokio::test]
async fn test_broken_session_does_not_abort_scan() -> Result<()> {
    let data_dir = TempDir::new()?;
    let broken = data_dir.path().join("broken");
    std::fs::create_dir(&broken)?;
    std::fs::write(broken.join(OPTIONS_FILE), "not json at all")?;
    std::fs::create_dir(data_dir.path().join("healthy"))?;

    let (tx, mut rx) = mpsc::channel(16);
    scan_once(data_dir.path(), &tx).await?;
    drop(tx);

    let mut reported = Vec::new();
    while let Some(options) = rx.recv().await {
        reported.push(options.ws_name);
    }
    assert_eq!(
        reported,
        ["healthy"],
        "The broken session is skipped, the rest still scan"
    );
    Ok(())
}

#[tokio::test]
async fn test_scan_ignores_plain_files() -> Result<()> {
    let data_dir = TempDir::new()?;
    std::fs::write(data_dir.path().join("stray.txt"), "not a session")?;
    std::fs::create_dir(data_dir.path().join("session-a"))?;

    let (tx, mut rx) = mpsc::channel(16);
    scan_once(data_dir.path(), &tx).await?;
    drop(tx);

    let mut count = 0;
    while rx.recv().await.is_some() {
        count += 1;
    }
    assert_eq!(count, 1, "Only directories count as sessions");
    Ok(())
}
