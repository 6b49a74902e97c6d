use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub transcribe: TranscribeToolConfig,
    pub notes: NotesApiConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// User-editable settings file; watched while the service runs.
    pub settings_file: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub target_fps: u32,
    pub screenshot_interval_secs: u64,
    pub monitor_interval_secs: u64,
    pub ffmpeg: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeToolConfig {
    pub binary: String,
    pub models_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesApiConfig {
    pub base_url: String,
    pub model: String,
    pub assistant_name: String,
    /// Note markup: md, html, latex or txt.
    pub format: String,
}

impl Config {
    /// Load configuration, falling back to built-in defaults when the file
    /// is absent.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "smartnotes")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8686)?
            .set_default("storage.settings_file", "settings.json")?
            .set_default("capture.target_fps", 20)?
            .set_default("capture.screenshot_interval_secs", 10)?
            .set_default("capture.monitor_interval_secs", 1)?
            .set_default("capture.ffmpeg", "ffmpeg")?
            .set_default("transcribe.binary", "whisper-cli")?
            .set_default("transcribe.models_dir", "models")?
            .set_default("notes.base_url", "https://api.openai.com/v1")?
            .set_default("notes.model", "gpt-3.5-turbo")?
            .set_default("notes.assistant_name", "Note taker")?
            .set_default("notes.format", "md")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
