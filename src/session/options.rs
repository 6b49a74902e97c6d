//! Per-session `options.json` record
//!
//! Every session directory carries one `options.json` describing the
//! session's pipeline progress: whether transcription has run, where the
//! transcript and the generated notes live, and the assistant thread the
//! session's note conversation is pinned to. Keys written by other tools are
//! preserved across updates.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const OPTIONS_FILE: &str = "options.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Session (directory) name.
    pub ws_name: String,
    /// Whether transcription has completed for this session.
    pub transcription: bool,
    pub transcription_path: String,
    /// Set once a transcript exists; gates note generation.
    pub can_generate_notes: bool,
    pub note_short_path: String,
    pub note_medium_path: String,
    pub note_long_path: String,
    /// Assistant thread the session's note conversation lives in.
    pub thread_id: String,
    pub assistant_name: String,
}

impl SessionOptions {
    /// Default record for a freshly discovered session directory.
    pub fn for_session(name: &str) -> Self {
        Self {
            ws_name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn load(session_dir: &Path) -> Result<Self> {
        let path = Self::path(session_dir);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))
    }

    pub fn save(&self, session_dir: &Path) -> Result<()> {
        let path = Self::path(session_dir);
        let contents = serde_json::to_string_pretty(self).context("Failed to encode options")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write options file: {}", path.display()))
    }

    pub fn path(session_dir: &Path) -> PathBuf {
        session_dir.join(OPTIONS_FILE)
    }
}

/// Apply key/value updates to a session's `options.json` in place.
///
/// The file is read as a generic JSON object so keys this version of the
/// service does not know about survive the rewrite. Updating a key that is
/// not yet present adds it with a warning.
pub fn update_options(session_dir: &Path, updates: &[(&str, serde_json::Value)]) -> Result<()> {
    let path = SessionOptions::path(session_dir);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read options file: {}", path.display()))?;
    let mut record: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse options file: {}", path.display()))?;

    for (key, value) in updates {
        if !record.contains_key(*key) {
            warn!("Adding previously absent options key '{}'", key);
        }
        record.insert((*key).to_string(), value.clone());
    }

    let contents =
        serde_json::to_string_pretty(&record).context("Failed to encode updated options")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write options file: {}", path.display()))
}
