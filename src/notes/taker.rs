//! Note taker workers
//!
//! `NoteTaker` turns a transcript into short, medium and long notes by
//! driving assistant runs in one session thread. Each note is produced by a
//! spawned worker task whose result is awaited by the caller; the thread
//! accumulates context so the medium and long notes refine what the short
//! one established.

use super::client::{Assistant, AssistantClient, Thread};
use super::NoteError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLength {
    Short,
    Medium,
    Long,
}

impl NoteLength {
    pub const ALL: [NoteLength; 3] = [NoteLength::Short, NoteLength::Medium, NoteLength::Long];

    /// Summarization request sent to the assistant.
    pub fn directive(&self) -> String {
        format!("Create {} summarization of meeting", self.upper())
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            NoteLength::Short => "note_short.txt",
            NoteLength::Medium => "note_medium.txt",
            NoteLength::Long => "note_long.txt",
        }
    }

    /// Key in the session options record holding this note's path.
    pub fn option_key(&self) -> &'static str {
        match self {
            NoteLength::Short => "note_short_path",
            NoteLength::Medium => "note_medium_path",
            NoteLength::Long => "note_long_path",
        }
    }

    fn upper(&self) -> &'static str {
        match self {
            NoteLength::Short => "SHORT",
            NoteLength::Medium => "MEDIUM",
            NoteLength::Long => "LONG",
        }
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteLength::Short => write!(f, "short"),
            NoteLength::Medium => write!(f, "medium"),
            NoteLength::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteFormat {
    #[default]
    Md,
    Html,
    Latex,
    Txt,
}

impl NoteFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md" => Some(NoteFormat::Md),
            "html" => Some(NoteFormat::Html),
            "latex" => Some(NoteFormat::Latex),
            "txt" => Some(NoteFormat::Txt),
            _ => None,
        }
    }

    /// Formatting instruction appended to every summarization request.
    pub fn directive(&self) -> String {
        let name = match self {
            NoteFormat::Md => "MD",
            NoteFormat::Html => "HTML",
            NoteFormat::Latex => "LATEX",
            NoteFormat::Txt => "TXT",
        };
        format!("Respond only with {} formatting", name)
    }
}

#[derive(Debug, Clone)]
pub struct NotesConfig {
    pub base_url: String,
    pub model: String,
    pub assistant_name: String,
    pub instructions: Option<String>,
    pub format: NoteFormat,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            base_url: super::DEFAULT_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            assistant_name: "Note taker".to_string(),
            instructions: None,
            format: NoteFormat::default(),
        }
    }
}

pub struct NoteTaker {
    client: Arc<AssistantClient>,
    config: NotesConfig,
}

impl NoteTaker {
    pub fn new(client: Arc<AssistantClient>, config: NotesConfig) -> Self {
        Self { client, config }
    }

    /// Resolve the configured assistant, creating it on first use.
    pub async fn ensure_assistant(&self) -> Result<Assistant, NoteError> {
        self.client
            .ensure_assistant(
                &self.config.assistant_name,
                &self.config.model,
                self.config.instructions.as_deref(),
            )
            .await
    }

    /// Open a fresh conversation thread seeded with the formatting rule and
    /// the transcript.
    pub async fn create_thread(&self, transcript: &str) -> Result<Thread, NoteError> {
        let thread = self.client.create_thread().await?;
        self.client
            .add_message(&thread.id, &self.config.format.directive())
            .await?;
        self.client.add_message(&thread.id, transcript).await?;
        info!("Opened note thread {}", thread.id);
        Ok(thread)
    }

    /// Request one note in a worker task and hand back its join handle.
    ///
    /// The worker owns its whole run lifecycle; a failure is returned
    /// through the handle and affects no other note.
    pub fn generate(
        &self,
        thread_id: &str,
        assistant_id: &str,
        length: NoteLength,
    ) -> JoinHandle<Result<String, NoteError>> {
        let client = Arc::clone(&self.client);
        let thread_id = thread_id.to_string();
        let assistant_id = assistant_id.to_string();
        let request = format!("{}. {}", length.directive(), self.config.format.directive());
        tokio::spawn(async move {
            info!("Generating {} note in thread {}", length, thread_id);
            run_summarization(&client, &thread_id, &assistant_id, &request).await
        })
    }
}

async fn run_summarization(
    client: &AssistantClient,
    thread_id: &str,
    assistant_id: &str,
    request: &str,
) -> Result<String, NoteError> {
    client.add_message(thread_id, request).await?;
    let run = client.create_run(thread_id, assistant_id).await?;

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let run = client.run_status(thread_id, &run.id).await?;
        match run.status.as_str() {
            "completed" => break,
            "failed" | "cancelled" | "expired" => {
                return Err(NoteError::RunFailed(run.status));
            }
            _ => {}
        }
    }

    client
        .latest_assistant_message(thread_id)
        .await?
        .ok_or(NoteError::EmptyResponse)
}
