// Integration tests for runtime settings
//
// These tests verify defaulting, validation, and that an invalid update
// never reaches the settings file.

use anyhow::Result;
use smartnotes::settings::{update_settings, Settings, SettingsUpdate};
use tempfile::TempDir;

#[test]
fn test_defaults_are_valid() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok(), "Defaults must pass validation");
    assert_eq!(settings.model_size, "small");
    assert_eq!(settings.transcription_language, "en");
}

#[test]
fn test_load_or_init_writes_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");

    let settings = Settings::load_or_init(&path)?;
    assert_eq!(settings, Settings::default());
    assert!(path.exists(), "Missing settings file is created");

    // A second load reads the file it just wrote.
    let reloaded = Settings::load(&path)?;
    assert_eq!(reloaded, settings);
    Ok(())
}

#[test]
fn test_validate_rejects_unknown_model_size() {
    let settings = Settings {
        model_size: "enormous".to_string(),
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_language_code() {
    for bad in ["english", "E", "", "e1"] {
        let settings = Settings {
            transcription_language: bad.to_string(),
            ..Settings::default()
        };
        assert!(
            settings.validate().is_err(),
            "Language '{}' should be rejected",
            bad
        );
    }
}

#[test]
fn test_validate_rejects_nonpositive_data_size() {
    let settings = Settings {
        max_data_size_gb: 0.0,
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn test_valid_update_is_persisted() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    Settings::default().save(&path)?;

    let updated = update_settings(
        &path,
        SettingsUpdate {
            model_size: Some("medium".to_string()),
            api_key: Some("sk-test".to_string()),
            ..SettingsUpdate::default()
        },
    )?;
    assert_eq!(updated.model_size, "medium");
    assert_eq!(updated.api_key, "sk-test");

    let on_disk = Settings::load(&path)?;
    assert_eq!(on_disk, updated);
    Ok(())
}

#[test]
fn test_invalid_update_leaves_file_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    Settings::default().save(&path)?;

    let result = update_settings(
        &path,
        SettingsUpdate {
            model_size: Some("enormous".to_string()),
            ..SettingsUpdate::default()
        },
    );
    assert!(result.is_err(), "Invalid model size must be rejected");

    let on_disk = Settings::load(&path)?;
    assert_eq!(
        on_disk,
        Settings::default(),
        "Rejected update must not be persisted"
    );
    Ok(())
}
