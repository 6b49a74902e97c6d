//! Capture units for a recording session
//!
//! Three independently-timed units write into one session directory:
//! - `AudioCapture` - system-output (loopback) audio to `audio.wav`
//! - `VideoCapture` - frame-rate-throttled window video to `video.mp4`
//! - `ScreenshotCapture` - interval stills to `screenshots/`
//!
//! Each unit owns its output file exclusively and coordinates with the
//! session recorder only through a stop flag and join-on-stop. Stop is
//! idempotent for every unit: stopping twice, or before start, is a logged
//! no-op.

pub mod audio;
pub mod screenshot;
pub mod video;

pub use audio::{AudioCapture, AUDIO_FILE};
pub use screenshot::{ScreenshotCapture, SCREENSHOTS_DIR};
pub use video::{FrameThrottle, VideoCapture, VideoCaptureConfig, VIDEO_FILE};

use crate::window::WindowRect;
use anyhow::Result;
use thiserror::Error;
use xcap::Monitor;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("audio device initialization failed: {0}")]
    DeviceInit(String),
    #[error("no monitor contains the target window rectangle")]
    MonitorNotFound,
    #[error("screen grab failed: {0}")]
    Grab(String),
}

/// One concurrently-running capture unit bound to a session directory.
#[async_trait::async_trait]
pub trait CaptureUnit: Send {
    /// Begin capturing. Fatal resource errors (devices, encoders) surface
    /// here so the recorder can wind back a partially-started session.
    async fn start(&mut self) -> Result<()>;

    /// Signal the capture loop to exit and wait for it to finish. Failures
    /// inside the loop are logged here, not propagated; calling stop when
    /// not running is a no-op that logs a warning.
    async fn stop(&mut self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Unit name for logging.
    fn name(&self) -> &'static str;
}

/// A cropped screen grab as tightly-packed RGBA bytes.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbaFrame {
    /// Convert to the encoder's packed RGB24 layout, dropping alpha.
    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len() / 4 * 3);
        for pixel in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
        }
        rgb
    }
}

/// Find the monitor whose bounds contain the rectangle's origin.
pub(crate) fn monitor_for_rect(rect: &WindowRect) -> Result<Monitor, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::Grab(e.to_string()))?;

    for monitor in monitors {
        let (Ok(x), Ok(y), Ok(width), Ok(height)) =
            (monitor.x(), monitor.y(), monitor.width(), monitor.height())
        else {
            continue;
        };
        if rect.left >= x
            && rect.left < x + width as i32
            && rect.top >= y
            && rect.top < y + height as i32
        {
            return Ok(monitor);
        }
    }

    Err(CaptureError::MonitorNotFound)
}

/// Grab the window rectangle from its monitor. The crop is clamped to the
/// captured bounds, so a window partially off-screen yields a smaller frame.
pub(crate) fn grab_rect(monitor: &Monitor, rect: &WindowRect) -> Result<RgbaFrame, CaptureError> {
    let monitor_x = monitor.x().map_err(|e| CaptureError::Grab(e.to_string()))?;
    let monitor_y = monitor.y().map_err(|e| CaptureError::Grab(e.to_string()))?;

    let image = monitor
        .capture_image()
        .map_err(|e| CaptureError::Grab(e.to_string()))?;
    let (image_width, image_height) = (image.width(), image.height());
    let raw = image.into_raw();

    let x0 = (rect.left - monitor_x).max(0) as u32;
    let y0 = (rect.top - monitor_y).max(0) as u32;
    let width = rect.width.min(image_width.saturating_sub(x0));
    let height = rect.height.min(image_height.saturating_sub(y0));
    if width == 0 || height == 0 {
        return Err(CaptureError::Grab(
            "window rectangle is outside the captured monitor".to_string(),
        ));
    }

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let start = (((y0 + row) * image_width + x0) * 4) as usize;
        data.extend_from_slice(&raw[start..start + (width * 4) as usize]);
    }

    Ok(RgbaFrame {
        data,
        width,
        height,
    })
}
