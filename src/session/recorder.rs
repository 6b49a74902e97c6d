//! Recording session lifecycle
//!
//! `SessionRecorder` owns the single in-flight recording: it resolves the
//! target window, creates the timestamped session directory, starts the
//! three capture units, watches the window for closure, and on stop joins
//! the units and merges audio into the video file. At most one recording
//! exists at a time; a second start is rejected, and concurrent stops are
//! resolved so exactly one caller performs the teardown.

use crate::capture::{
    AudioCapture, CaptureUnit, ScreenshotCapture, VideoCapture, VideoCaptureConfig,
};
use crate::merge::MediaMerger;
use crate::session::status::{Stage, StageState, StatusHub};
use crate::window::{self, WindowError, WindowRect};
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Merging,
}

#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// The target window disappeared; the recording was stopped on its behalf.
    WindowClosed { window_title: String },
}

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub target_fps: u32,
    pub screenshot_interval: Duration,
    /// How often the liveness monitor re-checks that the window still exists.
    pub monitor_interval: Duration,
    pub ffmpeg: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target_fps: 20,
            screenshot_interval: Duration::from_secs(10),
            monitor_interval: Duration::from_secs(1),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

struct Inner {
    state: RecorderState,
    session_dir: Option<PathBuf>,
    window_title: Option<String>,
    started_at: Option<Instant>,
    units: Vec<Box<dyn CaptureUnit>>,
    /// Incremented on every start; ties a liveness monitor to the session
    /// it was spawned for.
    epoch: u64,
    /// Most recent out-of-band event, kept for pollers after the session
    /// has already returned to idle.
    last_event: Option<RecorderEvent>,
}

pub struct SessionRecorder {
    data_dir: PathBuf,
    config: RecorderConfig,
    status: Arc<StatusHub>,
    events: broadcast::Sender<RecorderEvent>,
    // Fast-path flag the liveness monitor and HTTP handlers poll without
    // taking the inner lock.
    is_recording: Arc<AtomicBool>,
    inner: Mutex<Inner>,
}

impl SessionRecorder {
    pub fn new(data_dir: impl Into<PathBuf>, config: RecorderConfig, status: Arc<StatusHub>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            data_dir: data_dir.into(),
            config,
            status,
            events,
            is_recording: Arc::new(AtomicBool::new(false)),
            inner: Mutex::new(Inner {
                state: RecorderState::Idle,
                session_dir: None,
                window_title: None,
                started_at: None,
                units: Vec::new(),
                epoch: 0,
                last_event: None,
            }),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events.subscribe()
    }

    /// Start recording the window whose title contains `window_title`.
    ///
    /// Returns the created session directory. Fails without side effects
    /// when the window cannot be found or a recording is already running;
    /// a unit that fails to start winds back the units started before it.
    pub async fn start(self: Arc<Self>, window_title: &str) -> Result<PathBuf, RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.state != RecorderState::Idle {
            return Err(RecorderError::AlreadyRecording);
        }

        // Window resolution is fatal for the whole session.
        let rect = window::locate_window(window_title)?;
        info!(
            "Recording window '{}' at ({}, {}) {}x{}",
            window_title, rect.left, rect.top, rect.width, rect.height
        );

        let session_name = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let session_dir = self.data_dir.join(&session_name);
        std::fs::create_dir_all(&session_dir).map_err(|e| {
            RecorderError::Other(anyhow::anyhow!(
                "failed to create session directory {}: {}",
                session_dir.display(),
                e
            ))
        })?;

        let mut units = self.build_units(&session_dir, rect);
        for i in 0..units.len() {
            if let Err(e) = units[i].start().await {
                error!("Failed to start {} capture: {:#}", units[i].name(), e);
                for unit in units[..i].iter_mut().rev() {
                    if let Err(stop_err) = unit.stop().await {
                        error!("Wind-back of {} capture failed: {:#}", unit.name(), stop_err);
                    }
                }
                return Err(RecorderError::Other(e));
            }
        }

        inner.state = RecorderState::Recording;
        inner.session_dir = Some(session_dir.clone());
        inner.window_title = Some(window_title.to_string());
        inner.started_at = Some(Instant::now());
        inner.units = units;
        inner.epoch += 1;
        inner.last_event = None;
        let epoch = inner.epoch;
        self.is_recording.store(true, Ordering::SeqCst);
        drop(inner);

        self.status
            .update(Stage::Recording, StageState::Started, Some(&session_name));
        self.spawn_monitor(window_title.to_string(), epoch);
        info!("Recording session started: {}", session_name);
        Ok(session_dir)
    }

    /// Stop the current recording, join the capture units and merge the
    /// audio into the video file. Exactly one concurrent caller performs
    /// the teardown; the rest observe a no-op.
    pub async fn stop(&self) -> Result<(), RecorderError> {
        self.stop_session(None).await
    }

    /// Teardown, optionally guarded by the session epoch: a liveness
    /// monitor spawned for an earlier session must not stop the one
    /// currently running.
    async fn stop_session(&self, epoch: Option<u64>) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.state != RecorderState::Recording {
            warn!("Stop requested but no recording is in progress");
            return Ok(());
        }
        if let Some(epoch) = epoch {
            if inner.epoch != epoch {
                warn!("Ignoring stop from a monitor of an earlier session");
                return Ok(());
            }
        }

        inner.state = RecorderState::Merging;
        self.is_recording.store(false, Ordering::SeqCst);
        let session_dir = inner.session_dir.take();
        let session_name = session_dir
            .as_deref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let mut units = std::mem::take(&mut inner.units);
        inner.window_title = None;
        inner.started_at = None;

        for unit in units.iter_mut() {
            if let Err(e) = unit.stop().await {
                error!("Failed to stop {} capture: {:#}", unit.name(), e);
            }
        }

        let merge_result = match session_dir {
            Some(ref dir) => {
                MediaMerger::new(dir)
                    .with_command(&self.config.ffmpeg)
                    .merge()
                    .await
            }
            None => Ok(()),
        };

        inner.state = RecorderState::Idle;
        drop(inner);

        match merge_result {
            Ok(()) => {
                self.status.update(
                    Stage::Recording,
                    StageState::Finished,
                    session_name.as_deref(),
                );
                info!("Recording session stopped");
                Ok(())
            }
            Err(e) => {
                self.status.update(
                    Stage::Recording,
                    StageState::Error,
                    session_name.as_deref(),
                );
                error!("Media merge failed: {}", e);
                Err(RecorderError::Other(e.into()))
            }
        }
    }

    /// Time since the current recording started, if one is running.
    pub async fn elapsed(&self) -> Option<Duration> {
        let inner = self.inner.lock().await;
        inner.started_at.map(|t| t.elapsed())
    }

    pub async fn state(&self) -> RecorderState {
        self.inner.lock().await.state
    }

    /// Most recent out-of-band recorder event. Survives the return to idle
    /// so pollers can still see why the last session ended; cleared when a
    /// new recording starts.
    pub async fn last_event(&self) -> Option<RecorderEvent> {
        self.inner.lock().await.last_event.clone()
    }

    async fn session_is_current(&self, epoch: u64) -> bool {
        let inner = self.inner.lock().await;
        inner.state == RecorderState::Recording && inner.epoch == epoch
    }

    async fn note_window_closed(&self, window_title: &str) {
        let event = RecorderEvent::WindowClosed {
            window_title: window_title.to_string(),
        };
        self.inner.lock().await.last_event = Some(event.clone());
        let _ = self.events.send(event);
    }

    fn build_units(&self, session_dir: &PathBuf, rect: WindowRect) -> Vec<Box<dyn CaptureUnit>> {
        let video_config = VideoCaptureConfig {
            target_fps: self.config.target_fps,
            ffmpeg: self.config.ffmpeg.clone(),
        };
        vec![
            Box::new(AudioCapture::new(session_dir.clone())),
            Box::new(VideoCapture::new(session_dir.clone(), rect, video_config)),
            Box::new(ScreenshotCapture::new(
                session_dir.clone(),
                rect,
                self.config.screenshot_interval,
            )),
        ]
    }

    /// Watch for the target window disappearing and stop on its behalf.
    ///
    /// The loop is tied to its session by epoch and exits on its own once
    /// that session is over, so `stop` never has to join this task and a
    /// monitor that outlives its session can never tear down the next one.
    fn spawn_monitor(self: Arc<Self>, window_title: String, epoch: u64) {
        let recorder = self;
        tokio::spawn(async move {
            while recorder.session_is_current(epoch).await {
                tokio::time::sleep(recorder.config.monitor_interval).await;
                if !recorder.session_is_current(epoch).await {
                    break;
                }

                let titles = match tokio::task::spawn_blocking(window::visible_window_titles).await
                {
                    Ok(Ok(titles)) => titles,
                    Ok(Err(e)) => {
                        // Transient enumeration failures do not end the session.
                        warn!("Window enumeration failed during monitoring: {}", e);
                        continue;
                    }
                    Err(e) => {
                        error!("Window monitor task panicked: {}", e);
                        break;
                    }
                };

                if !window::title_is_visible(&window_title, &titles) {
                    warn!(
                        "Target window '{}' is gone; stopping the recording",
                        window_title
                    );
                    recorder.note_window_closed(&window_title).await;
                    if let Err(e) = recorder.stop_session(Some(epoch)).await {
                        error!("Auto-stop after window closure failed: {}", e);
                    }
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_recorder() -> Arc<SessionRecorder> {
        Arc::new(SessionRecorder::new(
            std::env::temp_dir(),
            RecorderConfig::default(),
            Arc::new(StatusHub::new()),
        ))
    }

    async fn force_recording(recorder: &SessionRecorder, epoch: u64) {
        let mut inner = recorder.inner.lock().await;
        inner.state = RecorderState::Recording;
        inner.epoch = epoch;
        recorder.is_recording.store(true, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_stale_epoch_stop_leaves_current_session_running() {
        // A monitor from session 1 waking up after session 2 has started
        // must not tear session 2 down.
        let recorder = test_recorder();
        force_recording(&recorder, 2).await;

        recorder.stop_session(Some(1)).await.unwrap();
        assert_eq!(
            recorder.state().await,
            RecorderState::Recording,
            "A stop guarded by an older epoch must be ignored"
        );
        assert!(recorder.session_is_current(2).await);
        assert!(!recorder.session_is_current(1).await);

        recorder.stop_session(Some(2)).await.unwrap();
        assert_eq!(recorder.state().await, RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_unguarded_stop_still_works() {
        let recorder = test_recorder();
        force_recording(&recorder, 7).await;

        recorder.stop_session(None).await.unwrap();
        assert_eq!(recorder.state().await, RecorderState::Idle);
        assert!(!recorder.is_recording());
    }

    #[tokio::test]
    async fn test_window_closed_event_reaches_pollers_and_subscribers() {
        let recorder = test_recorder();
        let mut rx = recorder.subscribe_events();

        recorder.note_window_closed("Meeting - Zoom").await;

        match recorder.last_event().await {
            Some(RecorderEvent::WindowClosed { window_title }) => {
                assert_eq!(window_title, "Meeting - Zoom")
            }
            None => panic!("last event should be retained for pollers"),
        }
        match rx.recv().await.unwrap() {
            RecorderEvent::WindowClosed { window_title } => {
                assert_eq!(window_title, "Meeting - Zoom")
            }
        }
    }
}
