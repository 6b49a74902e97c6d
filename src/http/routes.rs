use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/elapsed", get(handlers::recording_elapsed))
        // Session pipeline
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/sessions/:session_name/transcribe",
            post(handlers::transcribe_session),
        )
        .route(
            "/sessions/:session_name/notes",
            post(handlers::generate_notes),
        )
        // Pipeline status
        .route("/status", get(handlers::get_status))
        // Settings
        .route("/settings", put(handlers::update_settings))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
