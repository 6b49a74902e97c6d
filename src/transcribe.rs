//! Local speech-to-text for recorded sessions
//!
//! Transcription runs a local whisper.cpp CLI against the session's audio
//! file. The model file is resolved and checked when the service is built,
//! so a missing model fails loudly before any session work is attempted
//! rather than mid-pipeline.

use std::path::{Path, PathBuf};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

pub const TRANSCRIPTION_FILE: &str = "transcription.txt";

/// Audio container formats the transcriber accepts.
pub const SUPPORTED_FORMATS: &[&str] = &["wav", "mp3", "m4a", "flac"];

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("audio file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("unsupported audio format '{0}' (supported: wav, mp3, m4a, flac)")]
    UnsupportedFormat(String),
    #[error("failed to load transcription model: {0}")]
    ModelLoad(String),
    #[error("transcription tool failed: {0}")]
    Tool(String),
    #[error("transcription i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to update session options: {0}")]
    Options(String),
}

#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    /// whisper.cpp CLI binary.
    pub binary: String,
    pub models_dir: PathBuf,
    /// Model size name, e.g. "small"; resolved to `ggml-<size>.bin`.
    pub model_size: String,
    pub language: String,
}

pub struct TranscriptionService {
    binary: String,
    model_path: PathBuf,
    language: String,
}

impl TranscriptionService {
    /// Build the service, verifying the model file exists and the CLI
    /// binary is resolvable. Both are construction failures, never deferred
    /// to first use.
    pub fn new(config: TranscribeConfig) -> Result<Self, TranscribeError> {
        let model_path = config
            .models_dir
            .join(format!("ggml-{}.bin", config.model_size));
        if !model_path.is_file() {
            return Err(TranscribeError::ModelLoad(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        if !binary_is_resolvable(&config.binary) {
            return Err(TranscribeError::ModelLoad(format!(
                "transcription binary not found: {}",
                config.binary
            )));
        }
        info!("Transcription model loaded: {}", model_path.display());
        Ok(Self {
            binary: config.binary,
            model_path,
            language: config.language,
        })
    }

    /// Transcribe an audio file and return the plain text.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscribeError> {
        if !audio_path.is_file() {
            return Err(TranscribeError::FileNotFound(audio_path.to_path_buf()));
        }
        let extension = audio_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_FORMATS.contains(&extension.as_str()) {
            return Err(TranscribeError::UnsupportedFormat(extension));
        }

        let probe_path = audio_path.to_path_buf();
        match tokio::task::spawn_blocking(move || probe_duration_secs(&probe_path)).await {
            Ok(Some(duration)) => info!(
                "Transcribing {} ({:.1}s of audio)",
                audio_path.display(),
                duration
            ),
            _ => warn!(
                "Could not determine duration of {}; transcribing anyway",
                audio_path.display()
            ),
        }

        let output = Command::new(&self.binary)
            .arg("-m")
            .arg(&self.model_path)
            .args(["-l", &self.language, "-nt", "-f"])
            .arg(audio_path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Tool(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Transcription produced {} characters", text.len());
        Ok(text)
    }

    /// Write the transcript next to the session's media files.
    pub async fn save_transcription(
        &self,
        session_dir: &Path,
        text: &str,
    ) -> Result<PathBuf, TranscribeError> {
        let path = session_dir.join(TRANSCRIPTION_FILE);
        tokio::fs::write(&path, text).await?;
        info!("Transcript saved to {}", path.display());
        Ok(path)
    }
}

fn binary_is_resolvable(binary: &str) -> bool {
    let path = Path::new(binary);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}

/// Decoded duration of an audio file, when the container reports one.
fn probe_duration_secs(path: &Path) -> Option<f64> {
    let file = std::fs::File::open(path).ok()?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;
    let track = probed.format.default_track()?;
    let frames = track.codec_params.n_frames?;
    let rate = track.codec_params.sample_rate?;
    Some(frames as f64 / rate as f64)
}
