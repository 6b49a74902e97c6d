//! Frame-rate-throttled window video capture
//!
//! Frames of the target window rectangle are grabbed in a loop and fed as
//! raw RGB24 to an ffmpeg child process encoding `video.mp4`. Pacing is
//! throttling, not a fixed-rate timer: a frame is written only when the
//! wall-clock time since the last written frame has reached one frame
//! interval, so the observed rate can fall below the target under load but
//! never exceeds it. Frames that arrive early are dropped, never buffered.

use super::CaptureUnit;
use crate::window::WindowRect;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const VIDEO_FILE: &str = "video.mp4";

#[derive(Debug, Clone)]
pub struct VideoCaptureConfig {
    pub target_fps: u32,
    /// Encoder command, normally `ffmpeg`.
    pub ffmpeg: String,
}

impl Default for VideoCaptureConfig {
    fn default() -> Self {
        Self {
            target_fps: 20,
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// Admits frames at most once per frame interval.
#[derive(Debug)]
pub struct FrameThrottle {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            last_frame: None,
        }
    }

    /// Whether a frame observed at `now` may be written. The first frame is
    /// always admitted.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_frame {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_frame = Some(now);
                true
            }
        }
    }
}

pub struct VideoCapture {
    session_dir: PathBuf,
    rect: WindowRect,
    config: VideoCaptureConfig,
    run: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<()>>>,
}

impl VideoCapture {
    pub fn new(session_dir: impl Into<PathBuf>, rect: WindowRect, config: VideoCaptureConfig) -> Self {
        Self {
            session_dir: session_dir.into(),
            rect,
            config,
            run: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.session_dir.join(VIDEO_FILE)
    }
}

#[async_trait::async_trait]
impl CaptureUnit for VideoCapture {
    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Video capture already started");
            return Ok(());
        }

        self.run.store(true, Ordering::SeqCst);
        let run = Arc::clone(&self.run);
        let out_path = self.output_path();
        let rect = self.rect;
        let config = self.config.clone();
        self.task = Some(tokio::task::spawn_blocking(move || {
            capture_loop(out_path, rect, config, run)
        }));

        info!(
            "Video capture started ({}x{} @ {} fps ceiling)",
            self.rect.width, self.rect.height, self.config.target_fps
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            warn!("Video capture is not running; nothing to stop");
            return Ok(());
        };

        self.run.store(false, Ordering::SeqCst);
        match task.await {
            Ok(Ok(())) => info!("Video capture stopped"),
            Ok(Err(e)) => error!("Video capture failed: {:#}", e),
            Err(e) => error!("Video capture task panicked: {}", e),
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "video"
    }
}

fn capture_loop(
    out_path: PathBuf,
    rect: WindowRect,
    config: VideoCaptureConfig,
    run: Arc<AtomicBool>,
) -> Result<()> {
    let monitor = super::monitor_for_rect(&rect)?;

    // yuv420p subsampling requires even dimensions.
    let rect = WindowRect {
        width: rect.width & !1,
        height: rect.height & !1,
        ..rect
    };
    anyhow::ensure!(
        rect.width >= 2 && rect.height >= 2,
        "window rectangle {}x{} is too small to encode",
        rect.width,
        rect.height
    );

    let mut encoder = spawn_encoder(&config, &out_path, rect.width, rect.height)?;
    let mut stdin = encoder
        .stdin
        .take()
        .context("Encoder stdin unavailable")?;

    let mut throttle = FrameThrottle::new(config.target_fps);
    let mut frames_written = 0u64;
    let mut loop_result = Ok(());

    while run.load(Ordering::SeqCst) {
        if !throttle.admit(Instant::now()) {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }
        let frame = match super::grab_rect(&monitor, &rect) {
            Ok(frame) => frame,
            Err(e) => {
                loop_result = Err(e).context("Frame grab failed");
                break;
            }
        };
        if frame.width != rect.width || frame.height != rect.height {
            loop_result = Err(anyhow::anyhow!(
                "window moved off-screen (grabbed {}x{}, expected {}x{})",
                frame.width,
                frame.height,
                rect.width,
                rect.height
            ));
            break;
        }
        if let Err(e) = stdin.write_all(&frame.to_rgb24()) {
            loop_result = Err(e).context("Failed to feed frame to encoder");
            break;
        }
        frames_written += 1;
    }

    // Closing stdin makes ffmpeg flush and write the container trailer.
    drop(stdin);
    let status = encoder.wait().context("Failed to wait for encoder")?;
    loop_result?;
    anyhow::ensure!(status.success(), "encoder exited with {}", status);

    info!("Video capture wrote {} frames", frames_written);
    Ok(())
}

fn spawn_encoder(
    config: &VideoCaptureConfig,
    out_path: &PathBuf,
    width: u32,
    height: u32,
) -> Result<Child> {
    let size = format!("{}x{}", width, height);
    let fps = config.target_fps.to_string();
    Command::new(&config.ffmpeg)
        .args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            size.as_str(),
            "-r",
            fps.as_str(),
            "-i",
            "-",
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn encoder '{}'", config.ffmpeg))
}
