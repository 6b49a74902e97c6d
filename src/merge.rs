//! Post-recording merge of the session's audio and video tracks
//!
//! The separately-recorded `audio.wav` and `video.mp4` are combined into one
//! playable file: the video stream is copied bit-for-bit and the audio is
//! re-encoded to AAC at 192k. Output goes to a temporary file first and
//! replaces the original video file only on success, so a failed merge never
//! leaves a half-written file claiming to be the final artifact.

use crate::capture::{AUDIO_FILE, VIDEO_FILE};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::info;

pub const TEMP_FILE: &str = "temp.mp4";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("missing source file: {0}")]
    MissingSource(PathBuf),
    #[error("merge tool failed: {0}")]
    Tool(String),
    #[error("merge i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct MediaMerger {
    video_file: PathBuf,
    audio_file: PathBuf,
    temp_file: PathBuf,
    command: String,
}

impl MediaMerger {
    pub fn new(session_dir: impl AsRef<Path>) -> Self {
        let dir = session_dir.as_ref();
        Self {
            video_file: dir.join(VIDEO_FILE),
            audio_file: dir.join(AUDIO_FILE),
            temp_file: dir.join(TEMP_FILE),
            command: "ffmpeg".to_string(),
        }
    }

    /// Override the merge tool command (tests point this at a stub).
    pub fn with_command(mut self, command: &str) -> Self {
        self.command = command.to_string();
        self
    }

    /// Mux the session audio into the video file, replacing it in place.
    ///
    /// Precondition: both source files exist, otherwise `MissingSource` is
    /// returned and nothing on disk is touched.
    pub async fn merge(&self) -> Result<(), MergeError> {
        if !self.video_file.exists() {
            return Err(MergeError::MissingSource(self.video_file.clone()));
        }
        if !self.audio_file.exists() {
            return Err(MergeError::MissingSource(self.audio_file.clone()));
        }

        let output = Command::new(&self.command)
            .arg("-y")
            .arg("-i")
            .arg(&self.video_file)
            .arg("-i")
            .arg(&self.audio_file)
            .args([
                "-map", "0:v:0",
                "-map", "1:a:0",
                "-c:v", "copy",
                "-c:a", "aac",
                "-b:a", "192k",
            ])
            .arg(&self.temp_file)
            .output()
            .await?;

        if !output.status.success() {
            if self.temp_file.exists() {
                let _ = tokio::fs::remove_file(&self.temp_file).await;
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MergeError::Tool(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tokio::fs::rename(&self.temp_file, &self.video_file).await?;
        info!(
            "Audio successfully merged into {}",
            self.video_file.display()
        );
        Ok(())
    }
}
