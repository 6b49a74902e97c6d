//! Session lifecycle, per-session options and pipeline status.

pub mod options;
pub mod recorder;
pub mod status;

pub use options::{update_options, SessionOptions, OPTIONS_FILE};
pub use recorder::{
    RecorderConfig, RecorderError, RecorderEvent, RecorderState, SessionRecorder,
};
pub use status::{Stage, StageState, StatusEvent, StatusHub};
