//! Target-window resolution and visibility checks
//!
//! Window titles are not stable identifiers (browser tabs rename themselves
//! constantly), so every comparison here is a substring check, never exact
//! equality. The liveness monitor in the session recorder relies on the same
//! rule via [`title_is_visible`].

use thiserror::Error;
use xcap::Window;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("no visible window matching title '{0}'")]
    NotFound(String),
    #[error("window enumeration failed: {0}")]
    Enumeration(String),
}

/// Screen rectangle of a window, in global (virtual desktop) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Resolve a window title to its screen rectangle.
///
/// Returns the rectangle of the first visible, non-minimized window whose
/// title contains `title`. No side effects.
pub fn locate_window(title: &str) -> Result<WindowRect, WindowError> {
    let windows = Window::all().map_err(|e| WindowError::Enumeration(e.to_string()))?;

    for window in windows {
        if window.is_minimized().unwrap_or(true) {
            continue;
        }
        let Ok(window_title) = window.title() else {
            continue;
        };
        if window_title.is_empty() || !window_title.contains(title) {
            continue;
        }
        let (Ok(left), Ok(top), Ok(width), Ok(height)) =
            (window.x(), window.y(), window.width(), window.height())
        else {
            continue;
        };
        if width == 0 || height == 0 {
            continue;
        }
        return Ok(WindowRect {
            left,
            top,
            width,
            height,
        });
    }

    Err(WindowError::NotFound(title.to_string()))
}

/// Titles of all currently visible, non-minimized windows, sorted.
pub fn visible_window_titles() -> Result<Vec<String>, WindowError> {
    let windows = Window::all().map_err(|e| WindowError::Enumeration(e.to_string()))?;

    let mut titles: Vec<String> = windows
        .iter()
        .filter(|w| !w.is_minimized().unwrap_or(true))
        .filter_map(|w| w.title().ok())
        .filter(|t| !t.is_empty())
        .collect();
    titles.sort();
    Ok(titles)
}

/// Whether the recorded title is still a substring of any visible title.
pub fn title_is_visible(title: &str, visible_titles: &[String]) -> bool {
    visible_titles.iter().any(|t| t.contains(title))
}
