//! Periodic session directory scanner
//!
//! Each cycle enumerates the session directories under the data directory
//! and reports every session's `options.json` downstream. A directory with
//! no options record yet gets a default one written first, so a freshly
//! recorded session becomes a tracked workspace on the next scan. A broken
//! session never aborts the cycle; it is logged and skipped.

use crate::session::SessionOptions;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct WorkspaceScanner {
    data_dir: PathBuf,
    interval: Duration,
    tx: mpsc::Sender<SessionOptions>,
}

impl WorkspaceScanner {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        interval: Duration,
        tx: mpsc::Sender<SessionOptions>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            interval,
            tx,
        }
    }

    /// Run the scan loop until the receiving side goes away.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Workspace scanner watching {} every {:?}",
                self.data_dir.display(),
                self.interval
            );
            loop {
                if let Err(e) = scan_once(&self.data_dir, &self.tx).await {
                    warn!("Workspace scan failed: {:#}", e);
                }
                if self.tx.is_closed() {
                    break;
                }
                tokio::time::sleep(self.interval).await;
            }
        })
    }
}

/// One scan cycle over the data directory.
///
/// Sessions are visited in name order. Per-session failures are logged and
/// skipped; only a failure to list the data directory itself is an error.
pub async fn scan_once(data_dir: &Path, tx: &mpsc::Sender<SessionOptions>) -> Result<()> {
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to list data directory: {}", data_dir.display()))?;

    let mut session_dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    session_dirs.sort();

    for session_dir in session_dirs {
        match scan_session(&session_dir) {
            Ok(options) => {
                if tx.send(options).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(
                "Skipping session {}: {:#}",
                session_dir.display(),
                e
            ),
        }
    }
    Ok(())
}

fn scan_session(session_dir: &Path) -> Result<SessionOptions> {
    let name = session_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Session directory has no name")?;

    if SessionOptions::path(session_dir).exists() {
        let options = SessionOptions::load(session_dir)?;
        debug!("Scanned session '{}'", name);
        Ok(options)
    } else {
        let options = SessionOptions::for_session(&name);
        options.save(session_dir)?;
        info!("Initialized options for new session '{}'", name);
        Ok(options)
    }
}
