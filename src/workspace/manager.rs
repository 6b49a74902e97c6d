//! Workspace state and pipeline driver
//!
//! The manager is the single writer of the in-memory workspace view. Scanner
//! reports and settings reloads arrive on channels and are folded in on a
//! fixed tick; an entry is replaced only when it actually differs, so an
//! idle workspace causes no churn. Transcription and note generation run
//! against this view and persist their progress back into each session's
//! options record.

use crate::capture::AUDIO_FILE;
use crate::notes::{AssistantClient, NoteError, NoteLength, NoteTaker, NotesConfig};
use crate::session::{update_options, SessionOptions, Stage, StageState, StatusHub};
use crate::settings::Settings;
use crate::transcribe::{TranscribeConfig, TranscribeError, TranscriptionService};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub struct WorkspaceManager {
    data_dir: PathBuf,
    status: Arc<StatusHub>,
    /// whisper.cpp CLI binary and model directory; model size and language
    /// come from the live settings.
    transcribe_binary: String,
    models_dir: PathBuf,
    notes: NotesConfig,
    view: RwLock<HashMap<String, SessionOptions>>,
    settings: RwLock<Settings>,
}

impl WorkspaceManager {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        status: Arc<StatusHub>,
        transcribe_binary: String,
        models_dir: impl Into<PathBuf>,
        notes: NotesConfig,
        settings: Settings,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            status,
            transcribe_binary,
            models_dir: models_dir.into(),
            notes,
            view: RwLock::new(HashMap::new()),
            settings: RwLock::new(settings),
        }
    }

    /// Consume scanner reports and settings reloads on a fixed tick.
    pub fn spawn(
        self: Arc<Self>,
        mut scan_rx: mpsc::Receiver<SessionOptions>,
        mut settings_rx: mpsc::Receiver<Settings>,
    ) -> JoinHandle<()> {
        let manager = self;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                while let Ok(options) = scan_rx.try_recv() {
                    manager.apply_scan(options).await;
                }
                while let Ok(settings) = settings_rx.try_recv() {
                    manager.apply_settings(settings).await;
                }
            }
        })
    }

    async fn apply_scan(&self, options: SessionOptions) {
        let mut view = self.view.write().await;
        match view.get(&options.ws_name) {
            Some(current) if *current == options => {}
            _ => {
                debug!("Workspace view updated for '{}'", options.ws_name);
                view.insert(options.ws_name.clone(), options);
            }
        }
    }

    async fn apply_settings(&self, settings: Settings) {
        let mut current = self.settings.write().await;
        if *current == settings {
            return;
        }
        if current.api_key != settings.api_key {
            info!("API key changed; note generation will use the new key");
        }
        info!("Settings updated");
        *current = settings;
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// All tracked sessions, sorted by name.
    pub async fn sessions(&self) -> Vec<SessionOptions> {
        let view = self.view.read().await;
        let mut sessions: Vec<SessionOptions> = view.values().cloned().collect();
        sessions.sort_by(|a, b| a.ws_name.cmp(&b.ws_name));
        sessions
    }

    pub async fn session(&self, name: &str) -> Option<SessionOptions> {
        self.view.read().await.get(name).cloned()
    }

    pub fn session_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Transcribe a session's audio and record the result in its options.
    pub async fn transcribe_session(&self, name: &str) -> Result<PathBuf, TranscribeError> {
        self.status
            .update(Stage::Transcription, StageState::Started, Some(name));
        match self.run_transcription(name).await {
            Ok(path) => {
                self.status
                    .update(Stage::Transcription, StageState::Finished, Some(name));
                Ok(path)
            }
            Err(e) => {
                self.status
                    .update(Stage::Transcription, StageState::Error, Some(name));
                error!("Transcription of '{}' failed: {}", name, e);
                Err(e)
            }
        }
    }

    async fn run_transcription(&self, name: &str) -> Result<PathBuf, TranscribeError> {
        let session_dir = self.session_dir(name);
        let settings = self.settings().await;
        let service = TranscriptionService::new(TranscribeConfig {
            binary: self.transcribe_binary.clone(),
            models_dir: self.models_dir.clone(),
            model_size: settings.model_size,
            language: settings.transcription_language,
        })?;

        let text = service.transcribe(&session_dir.join(AUDIO_FILE)).await?;
        let path = service.save_transcription(&session_dir, &text).await?;

        update_options(
            &session_dir,
            &[
                ("transcription", json!(true)),
                ("transcription_path", json!(path.to_string_lossy())),
                ("can_generate_notes", json!(true)),
            ],
        )
        .map_err(|e| TranscribeError::Options(e.to_string()))?;
        Ok(path)
    }

    /// Generate the short, medium and long notes for a transcribed session.
    pub async fn generate_notes(&self, name: &str) -> Result<(), NoteError> {
        self.status
            .update(Stage::Notes, StageState::Started, Some(name));
        match self.run_note_generation(name).await {
            Ok(()) => {
                self.status
                    .update(Stage::Notes, StageState::Finished, Some(name));
                Ok(())
            }
            Err(e) => {
                self.status
                    .update(Stage::Notes, StageState::Error, Some(name));
                error!("Note generation for '{}' failed: {}", name, e);
                Err(e)
            }
        }
    }

    async fn run_note_generation(&self, name: &str) -> Result<(), NoteError> {
        let options = self
            .session(name)
            .await
            .ok_or_else(|| NoteError::Ineligible(format!("unknown session '{}'", name)))?;
        if !options.transcription || options.transcription_path.is_empty() {
            return Err(NoteError::Ineligible(
                "session has no transcript yet".to_string(),
            ));
        }
        if !options.can_generate_notes {
            return Err(NoteError::Ineligible(
                "note generation is disabled for this session".to_string(),
            ));
        }

        let session_dir = self.session_dir(name);
        let transcript = tokio::fs::read_to_string(&options.transcription_path).await?;
        let settings = self.settings().await;
        let client = Arc::new(AssistantClient::new(&settings.api_key, &self.notes.base_url)?);
        let taker = NoteTaker::new(client, self.notes.clone());

        let assistant = taker.ensure_assistant().await?;
        let thread_id = if options.thread_id.is_empty() {
            let thread = taker.create_thread(&transcript).await?;
            update_options(
                &session_dir,
                &[
                    ("thread_id", json!(thread.id)),
                    ("assistant_name", json!(self.notes.assistant_name)),
                ],
            )
            .map_err(|e| NoteError::Options(e.to_string()))?;
            thread.id
        } else {
            info!("Reusing note thread {} for '{}'", options.thread_id, name);
            options.thread_id.clone()
        };

        // Short first; the later, longer notes build on the thread context
        // the earlier runs established.
        for length in NoteLength::ALL {
            let worker = taker.generate(&thread_id, &assistant.id, length);
            let text = worker
                .await
                .map_err(|e| NoteError::Worker(e.to_string()))??;

            let note_path = session_dir.join(length.file_name());
            tokio::fs::write(&note_path, &text).await?;
            update_options(
                &session_dir,
                &[(length.option_key(), json!(note_path.to_string_lossy()))],
            )
            .map_err(|e| NoteError::Options(e.to_string()))?;
            info!("Wrote {} note for '{}'", length, name);
        }
        Ok(())
    }
}
