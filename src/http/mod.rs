//! HTTP API server for external control (desktop UI)
//!
//! This module provides a REST API for driving the recording and note
//! pipeline:
//! - POST /recording/start - Start recording a window
//! - POST /recording/stop - Stop the current recording
//! - GET /recording/elapsed - Elapsed time of the current recording
//! - GET /sessions - List tracked sessions
//! - POST /sessions/:name/transcribe - Transcribe a session
//! - POST /sessions/:name/notes - Generate notes for a session
//! - GET /status - Pipeline stage states and how the last recording ended
//! - PUT /settings - Apply a validated settings update
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
