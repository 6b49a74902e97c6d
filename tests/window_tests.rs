// Tests for window title matching
//
// Title comparison is substring-based everywhere: browser tabs and editors
// rename their windows constantly, so exact matching would report every
// such window as closed.

use smartnotes::window::title_is_visible;

fn titles(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_exact_title_is_visible() {
    let visible = titles(&["Meeting - Zoom", "Terminal"]);
    assert!(title_is_visible("Meeting - Zoom", &visible));
}

#[test]
fn test_fragment_matches_renamed_window() {
    // The window was selected as "Zoom" and later renamed itself.
    let visible = titles(&["Weekly sync - Zoom", "Terminal"]);
    assert!(title_is_visible("Zoom", &visible));
}

#[test]
fn test_missing_title_is_not_visible() {
    let visible = titles(&["Terminal", "Files"]);
    assert!(!title_is_visible("Zoom", &visible));
}

#[test]
fn test_match_is_case_sensitive() {
    let visible = titles(&["meeting - zoom"]);
    assert!(!title_is_visible("Zoom", &visible));
}

#[test]
fn test_empty_visible_list() {
    assert!(!title_is_visible("Zoom", &[]));
}
