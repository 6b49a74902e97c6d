// Integration tests for session recorder idle behavior
//
// These exercise the paths that need no window, device or encoder: a
// recorder that was never started must treat stop as a logged no-op and
// leave every observable surface untouched.

use smartnotes::session::{
    RecorderConfig, RecorderState, SessionRecorder, Stage, StageState, StatusHub,
};
use std::sync::Arc;
use tempfile::TempDir;

fn idle_recorder(hub: &Arc<StatusHub>, data_dir: &TempDir) -> SessionRecorder {
    SessionRecorder::new(
        data_dir.path(),
        RecorderConfig::default(),
        Arc::clone(hub),
    )
}

#[tokio::test]
async fn test_stop_when_idle_is_a_noop() {
    let data_dir = TempDir::new().unwrap();
    let hub = Arc::new(StatusHub::new());
    let recorder = idle_recorder(&hub, &data_dir);

    assert!(recorder.stop().await.is_ok(), "Idle stop must not error");
    assert_eq!(recorder.state().await, RecorderState::Idle);
    assert!(!recorder.is_recording());
    assert_eq!(
        hub.get(Stage::Recording),
        StageState::NotStarted,
        "An idle stop must not advance the recording stage"
    );
    assert!(recorder.elapsed().await.is_none());
    assert!(recorder.last_event().await.is_none());
}

#[tokio::test]
async fn test_repeated_idle_stops_are_safe() {
    let data_dir = TempDir::new().unwrap();
    let hub = Arc::new(StatusHub::new());
    let recorder = idle_recorder(&hub, &data_dir);

    for _ in 0..3 {
        assert!(recorder.stop().await.is_ok());
    }
    assert_eq!(recorder.state().await, RecorderState::Idle);

    // No session directory appeared either.
    assert_eq!(
        std::fs::read_dir(data_dir.path()).unwrap().count(),
        0,
        "Idle stops must not touch the data directory"
    );
}
