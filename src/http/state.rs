use crate::session::{SessionRecorder, StatusHub};
use crate::workspace::WorkspaceManager;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<SessionRecorder>,
    pub workspace: Arc<WorkspaceManager>,
    pub status: Arc<StatusHub>,
    /// Settings file the PUT /settings route writes through; the watcher
    /// picks the change up on its next cycle.
    pub settings_file: PathBuf,
}

impl AppState {
    pub fn new(
        recorder: Arc<SessionRecorder>,
        workspace: Arc<WorkspaceManager>,
        status: Arc<StatusHub>,
        settings_file: PathBuf,
    ) -> Self {
        Self {
            recorder,
            workspace,
            status,
            settings_file,
        }
    }
}
