//! Workspace discovery and pipeline coordination
//!
//! The scanner walks the data directory on a cadence and reports every
//! session's options record; the manager folds those reports into a shared
//! view and drives the transcription and note pipelines against it.

pub mod manager;
pub mod scanner;

pub use manager::WorkspaceManager;
pub use scanner::{scan_once, WorkspaceScanner};
