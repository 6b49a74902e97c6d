// Integration tests for the transcription service
//
// These run the validation paths only; no whisper binary is invoked.

use anyhow::Result;
use smartnotes::transcribe::{TranscribeConfig, TranscribeError, TranscriptionService};
use std::path::Path;
use tempfile::TempDir;

fn config_with_models(models_dir: &Path) -> TranscribeConfig {
    TranscribeConfig {
        // `true` resolves on any PATH; no test ever reaches the point of
        // invoking it.
        binary: "true".to_string(),
        models_dir: models_dir.to_path_buf(),
        model_size: "small".to_string(),
        language: "en".to_string(),
    }
}

fn write_fake_model(models_dir: &Path, size: &str) {
    std::fs::write(models_dir.join(format!("ggml-{}.bin", size)), b"model").unwrap();
}

#[test]
fn test_missing_model_fails_at_construction() {
    let models = TempDir::new().unwrap();
    let result = TranscriptionService::new(config_with_models(models.path()));
    assert!(
        matches!(result, Err(TranscribeError::ModelLoad(_))),
        "A missing model file must fail before any session work"
    );
}

#[test]
fn test_unresolvable_binary_fails_at_construction() {
    let models = TempDir::new().unwrap();
    write_fake_model(models.path(), "small");

    let mut config = config_with_models(models.path());
    config.binary = "definitely-not-a-real-binary".to_string();
    assert!(
        matches!(
            TranscriptionService::new(config),
            Err(TranscribeError::ModelLoad(_))
        ),
        "A missing CLI binary must fail construction, not first use"
    );
}

#[test]
fn test_model_resolved_by_size_name() {
    let models = TempDir::new().unwrap();
    write_fake_model(models.path(), "small");

    assert!(TranscriptionService::new(config_with_models(models.path())).is_ok());

    let mut other = config_with_models(models.path());
    other.model_size = "large".to_string();
    assert!(
        TranscriptionService::new(other).is_err(),
        "Only the configured size's model file counts"
    );
}

#[tokio::test]
async fn test_transcribe_missing_audio_file() -> Result<()> {
    let models = TempDir::new()?;
    write_fake_model(models.path(), "small");
    let service = TranscriptionService::new(config_with_models(models.path()))?;

    let result = service.transcribe(Path::new("/nonexistent/audio.wav")).await;
    assert!(matches!(result, Err(TranscribeError::FileNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_transcribe_rejects_unsupported_format() -> Result<()> {
    let models = TempDir::new()?;
    write_fake_model(models.path(), "small");
    let service = TranscriptionService::new(config_with_models(models.path()))?;

    let audio_dir = TempDir::new()?;
    let ogg = audio_dir.path().join("audio.ogg");
    std::fs::write(&ogg, b"OggS")?;

    let result = service.transcribe(&ogg).await;
    match result {
        Err(TranscribeError::UnsupportedFormat(ext)) => assert_eq!(ext, "ogg"),
        other => panic!("Expected UnsupportedFormat, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_save_transcription_writes_file() -> Result<()> {
    let models = TempDir::new()?;
    write_fake_model(models.path(), "small");
    let service = TranscriptionService::new(config_with_models(models.path()))?;

    let session = TempDir::new()?;
    let path = service
        .save_transcription(session.path(), "hello meeting")
        .await?;

    assert_eq!(std::fs::read_to_string(&path)?, "hello meeting");
    assert!(path.ends_with("transcription.txt"));
    Ok(())
}
