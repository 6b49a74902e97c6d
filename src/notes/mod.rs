//! Note generation from session transcripts
//!
//! Notes are produced by an OpenAI assistant: each session gets one
//! conversation thread (persisted in its options record) and three
//! summarizations of increasing length are requested in it, so the later
//! ones build on the context already in the thread. Each summarization runs
//! in an isolated worker task that returns its result; a failing worker
//! fails only its own note.

pub mod client;
pub mod taker;

pub use client::{
    extract_latest_assistant_text, Assistant, AssistantClient, Message, Run, Thread,
    DEFAULT_BASE_URL,
};
pub use taker::{NoteFormat, NoteLength, NoteTaker, NotesConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("no API key configured for note generation")]
    MissingApiKey,
    #[error("assistant API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("assistant run ended as '{0}'")]
    RunFailed(String),
    #[error("assistant produced no response message")]
    EmptyResponse,
    #[error("session is not eligible for note generation: {0}")]
    Ineligible(String),
    #[error("note worker failed: {0}")]
    Worker(String),
    #[error("failed to update session options: {0}")]
    Options(String),
    #[error("note i/o error: {0}")]
    Io(#[from] std::io::Error),
}
