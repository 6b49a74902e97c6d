// Integration tests for capture plumbing that runs without devices
//
// Frame pacing and pixel conversion are pure; unit stop/start bookkeeping
// needs no audio device or display either.

use smartnotes::capture::{
    AudioCapture, CaptureUnit, FrameThrottle, RgbaFrame, ScreenshotCapture, VideoCapture,
    VideoCaptureConfig,
};
use smartnotes::window::WindowRect;
use std::time::{Duration, Instant};

fn test_rect() -> WindowRect {
    WindowRect {
        left: 0,
        top: 0,
        width: 640,
        height: 480,
    }
}

#[test]
fn test_throttle_admits_first_frame() {
    let mut throttle = FrameThrottle::new(20);
    assert!(throttle.admit(Instant::now()), "First frame always writes");
}

#[test]
fn test_throttle_drops_early_frames() {
    let mut throttle = FrameThrottle::new(20);
    let start = Instant::now();

    assert!(throttle.admit(start));
    assert!(
        !throttle.admit(start + Duration::from_millis(10)),
        "A frame inside the 50ms interval is dropped"
    );
    assert!(
        throttle.admit(start + Duration::from_millis(50)),
        "A frame at the interval boundary is admitted"
    );
}

#[test]
fn test_throttle_never_exceeds_target_rate() {
    // Offer frames every 7ms for a simulated 10 seconds at a 20fps ceiling.
    let mut throttle = FrameThrottle::new(20);
    let start = Instant::now();
    let mut admitted = 0;

    let mut offset = Duration::ZERO;
    while offset < Duration::from_secs(10) {
        if throttle.admit(start + offset) {
            admitted += 1;
        }
        offset += Duration::from_millis(7);
    }

    assert!(
        admitted <= 201,
        "Admitted {} frames in 10s, above the 20fps ceiling",
        admitted
    );
    assert!(admitted >= 140, "Throttle should not starve a steady source");
}

#[test]
fn test_throttle_does_not_buffer_missed_time() {
    // After a long stall only one frame is owed, not a backlog.
    let mut throttle = FrameThrottle::new(20);
    let start = Instant::now();
    assert!(throttle.admit(start));

    let resumed = start + Duration::from_secs(2);
    assert!(throttle.admit(resumed));
    assert!(
        !throttle.admit(resumed + Duration::from_millis(1)),
        "The stall must not be repaid with a burst"
    );
}

#[test]
fn test_rgba_to_rgb24_drops_alpha() {
    let frame = RgbaFrame {
        data: vec![10, 20, 30, 255, 40, 50, 60, 128],
        width: 2,
        height: 1,
    };
    assert_eq!(frame.to_rgb24(), vec![10, 20, 30, 40, 50, 60]);
}

#[tokio::test]
async fn test_stop_before_start_is_a_noop() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut units: Vec<Box<dyn CaptureUnit>> = vec![
        Box::new(AudioCapture::new(dir.path())),
        Box::new(VideoCapture::new(
            dir.path(),
            test_rect(),
            VideoCaptureConfig::default(),
        )),
        Box::new(ScreenshotCapture::new(
            dir.path(),
            test_rect(),
            Duration::from_secs(10),
        )),
    ];

    for unit in units.iter_mut() {
        assert!(
            unit.stop().await.is_ok(),
            "Stopping {} before start must be a no-op",
            unit.name()
        );
        assert!(!unit.is_running());
    }
}
