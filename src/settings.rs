//! User-editable runtime settings
//!
//! Settings live in a JSON file the user (or a companion UI) edits while the
//! service runs. A watcher task re-reads the file on a fixed cadence and
//! publishes the parsed value; consumers deduplicate, so an unchanged file
//! costs nothing downstream. Updates are validated before they are
//! persisted, never after.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Whisper model sizes the transcription service knows how to load.
pub const MODEL_SIZES: &[&str] = &["tiny", "base", "small", "medium", "large"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown model size '{0}' (expected one of tiny, base, small, medium, large)")]
    ModelSize(String),
    #[error("transcription language must be a two-letter code, got '{0}'")]
    Language(String),
    #[error("max data size must be positive, got {0}")]
    DataSize(f64),
    #[error("data directory must not be empty")]
    DataDirectory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_directory: String,
    pub model_size: String,
    pub transcription_language: String,
    pub max_data_size_gb: f64,
    /// OpenAI API key used by note generation; empty means notes disabled.
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_directory: "data".to_string(),
            model_size: "small".to_string(),
            transcription_language: "en".to_string(),
            max_data_size_gb: 10.0,
            api_key: String::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the settings file, writing defaults first if it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Settings file absent; writing defaults to {}", path.display());
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory: {}", parent.display())
                })?;
            }
            let defaults = Self::default();
            defaults.save(path)?;
            return Ok(defaults);
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to encode settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !MODEL_SIZES.contains(&self.model_size.as_str()) {
            return Err(SettingsError::ModelSize(self.model_size.clone()));
        }
        if self.transcription_language.len() != 2
            || !self
                .transcription_language
                .chars()
                .all(|c| c.is_ascii_lowercase())
        {
            return Err(SettingsError::Language(self.transcription_language.clone()));
        }
        if self.max_data_size_gb <= 0.0 {
            return Err(SettingsError::DataSize(self.max_data_size_gb));
        }
        if self.data_directory.trim().is_empty() {
            return Err(SettingsError::DataDirectory);
        }
        Ok(())
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub data_directory: Option<String>,
    pub model_size: Option<String>,
    pub transcription_language: Option<String>,
    pub max_data_size_gb: Option<f64>,
    pub api_key: Option<String>,
}

/// Apply an update to the settings file, validating before persisting.
///
/// An invalid update leaves the file untouched and returns the validation
/// error; the previous settings remain in force.
pub fn update_settings(path: &Path, update: SettingsUpdate) -> Result<Settings> {
    let mut settings = Settings::load(path)?;
    if let Some(v) = update.data_directory {
        settings.data_directory = v;
    }
    if let Some(v) = update.model_size {
        settings.model_size = v;
    }
    if let Some(v) = update.transcription_language {
        settings.transcription_language = v;
    }
    if let Some(v) = update.max_data_size_gb {
        settings.max_data_size_gb = v;
    }
    if let Some(v) = update.api_key {
        settings.api_key = v;
    }
    settings.validate()?;
    settings.save(path)?;
    Ok(settings)
}

/// Re-read the settings file on a fixed cadence and publish each result.
///
/// Every cycle sends the currently parsed settings; a file that fails to
/// parse is logged and skipped, keeping the last good value in force
/// downstream. The task exits when the receiver is dropped.
pub fn spawn_watcher(
    path: PathBuf,
    interval: Duration,
    tx: mpsc::Sender<Settings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match Settings::load(&path) {
                Ok(settings) => {
                    if tx.send(settings).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Settings reload failed: {:#}", e),
            }
        }
    })
}
