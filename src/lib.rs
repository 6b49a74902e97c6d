pub mod capture;
pub mod config;
pub mod http;
pub mod merge;
pub mod notes;
pub mod session;
pub mod settings;
pub mod transcribe;
pub mod window;
pub mod workspace;

pub use capture::{
    AudioCapture, CaptureUnit, FrameThrottle, RgbaFrame, ScreenshotCapture, VideoCapture,
    VideoCaptureConfig, AUDIO_FILE, SCREENSHOTS_DIR, VIDEO_FILE,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use merge::{MediaMerger, MergeError};
pub use notes::{NoteError, NoteFormat, NoteLength, NoteTaker, NotesConfig};
pub use session::{
    update_options, RecorderConfig, RecorderError, RecorderEvent, SessionOptions, SessionRecorder,
    Stage, StageState, StatusHub, OPTIONS_FILE,
};
pub use settings::{Settings, SettingsUpdate};
pub use transcribe::{TranscribeConfig, TranscribeError, TranscriptionService, TRANSCRIPTION_FILE};
pub use window::{locate_window, title_is_visible, visible_window_titles, WindowError, WindowRect};
pub use workspace::{WorkspaceManager, WorkspaceScanner};
