//! Interval screenshots of the target window
//!
//! Every interval (10s by default) a still of the window rectangle is saved
//! as an individually-timestamped PNG under `screenshots/`. The stop flag is
//! observed between iterations, so an in-flight save always completes and no
//! file is left torn.

use super::CaptureUnit;
use crate::window::WindowRect;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const SCREENSHOTS_DIR: &str = "screenshots";

pub struct ScreenshotCapture {
    screenshots_dir: PathBuf,
    rect: WindowRect,
    interval: Duration,
    run: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<()>>>,
}

impl ScreenshotCapture {
    pub fn new(session_dir: impl Into<PathBuf>, rect: WindowRect, interval: Duration) -> Self {
        Self {
            screenshots_dir: session_dir.into().join(SCREENSHOTS_DIR),
            rect,
            interval,
            run: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureUnit for ScreenshotCapture {
    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Screenshot capture already started");
            return Ok(());
        }

        std::fs::create_dir_all(&self.screenshots_dir).with_context(|| {
            format!(
                "Failed to create screenshots directory: {}",
                self.screenshots_dir.display()
            )
        })?;

        self.run.store(true, Ordering::SeqCst);
        let run = Arc::clone(&self.run);
        let dir = self.screenshots_dir.clone();
        let rect = self.rect;
        let interval = self.interval;
        self.task = Some(tokio::task::spawn_blocking(move || {
            capture_loop(dir, rect, interval, run)
        }));

        info!(
            "Screenshot capture started (every {}s)",
            self.interval.as_secs()
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            warn!("Screenshot capture is not running; nothing to stop");
            return Ok(());
        };

        self.run.store(false, Ordering::SeqCst);
        match task.await {
            Ok(Ok(())) => info!("Screenshot capture stopped"),
            Ok(Err(e)) => error!("Screenshot capture failed: {:#}", e),
            Err(e) => error!("Screenshot capture task panicked: {}", e),
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "screenshot"
    }
}

fn capture_loop(
    dir: PathBuf,
    rect: WindowRect,
    interval: Duration,
    run: Arc<AtomicBool>,
) -> Result<()> {
    let monitor = super::monitor_for_rect(&rect)?;

    while run.load(Ordering::SeqCst) {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("screenshot_{}.png", timestamp));

        let frame = super::grab_rect(&monitor, &rect).context("Screenshot grab failed")?;
        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
            .context("Screenshot buffer has unexpected size")?;
        image
            .save(&path)
            .with_context(|| format!("Failed to save screenshot: {}", path.display()))?;

        // Sleep the interval in slices so a stop request is seen promptly,
        // while the save above has already completed in full.
        let deadline = Instant::now() + interval;
        while run.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(Duration::from_millis(100)));
        }
    }

    Ok(())
}
