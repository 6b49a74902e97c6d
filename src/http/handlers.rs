use super::state::AppState;
use crate::session::{RecorderError, RecorderEvent, Stage, StageState};
use crate::settings::{self, SettingsUpdate};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    /// Title (or title fragment) of the window to record.
    pub window_title: String,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub session: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ElapsedResponse {
    pub recording: bool,
    pub elapsed_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub session: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub stages: HashMap<Stage, StageState>,
    /// Title of the window whose closure auto-stopped the last recording,
    /// when that is how it ended.
    pub window_closed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
/// Start recording the window matching the given title
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    info!("Starting recording for window: {}", req.window_title);

    match Arc::clone(&state.recorder).start(&req.window_title).await {
        Ok(session_dir) => {
            let session = session_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("Recording started for session: {}", session);
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    session: session.clone(),
                    status: "recording".to_string(),
                    message: format!("Recording started for session {}", session),
                }),
            )
                .into_response()
        }
        Err(RecorderError::AlreadyRecording) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "A recording is already in progress".to_string(),
            }),
        )
            .into_response(),
        Err(e @ RecorderError::Window(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to start recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /recording/stop
/// Stop the current recording and merge its media
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stopping recording");

    match state.recorder.stop().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StopRecordingResponse {
                status: "stopped".to_string(),
                message: "Recording stopped".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to stop recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /recording/elapsed
/// Elapsed time of the current recording, if one is running
pub async fn recording_elapsed(State(state): State<AppState>) -> impl IntoResponse {
    let elapsed = state.recorder.elapsed().await;
    (
        StatusCode::OK,
        Json(ElapsedResponse {
            recording: elapsed.is_some(),
            elapsed_secs: elapsed.map(|d| d.as_secs()),
        }),
    )
}

/// GET /sessions
/// List all tracked sessions and their pipeline progress
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.workspace.sessions().await;
    (StatusCode::OK, Json(sessions))
}

/// POST /sessions/:session_name/transcribe
/// Transcribe a session's audio in the background
pub async fn transcribe_session(
    State(state): State<AppState>,
    Path(session_name): Path<String>,
) -> impl IntoResponse {
    if state.workspace.session(&session_name).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_name),
            }),
        )
            .into_response();
    }

    let workspace = Arc::clone(&state.workspace);
    let name = session_name.clone();
    tokio::spawn(async move {
        // Failure is reflected in the status hub; nothing to do here.
        let _ = workspace.transcribe_session(&name).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            session: session_name,
            status: "transcribing".to_string(),
        }),
    )
        .into_response()
}

/// POST /sessions/:session_name/notes
/// Generate short, medium and long notes for a session in the background
pub async fn generate_notes(
    State(state): State<AppState>,
    Path(session_name): Path<String>,
) -> impl IntoResponse {
    if state.workspace.session(&session_name).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_name),
            }),
        )
            .into_response();
    }

    let workspace = Arc::clone(&state.workspace);
    let name = session_name.clone();
    tokio::spawn(async move {
        let _ = workspace.generate_notes(&name).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            session: session_name,
            status: "generating_notes".to_string(),
        }),
    )
        .into_response()
}

/// GET /status
/// Latest state of each pipeline stage, plus how the last recording ended
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let window_closed = match state.recorder.last_event().await {
        Some(RecorderEvent::WindowClosed { window_title }) => Some(window_title),
        None => None,
    };
    (
        StatusCode::OK,
        Json(StatusResponse {
            stages: state.status.snapshot(),
            window_closed,
        }),
    )
}

/// PUT /settings
/// Apply a partial settings update, validated before it is persisted
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    match settings::update_settings(&state.settings_file, update) {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("{:#}", e),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
