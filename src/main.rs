use anyhow::{Context, Result};
use clap::Parser;
use smartnotes::notes::{NoteFormat, NotesConfig};
use smartnotes::session::{RecorderConfig, SessionRecorder, StatusHub};
use smartnotes::settings::{self, Settings};
use smartnotes::workspace::{WorkspaceManager, WorkspaceScanner};
use smartnotes::{create_router, AppState, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "smartnotes", about = "Window recording and note-taking service")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/smartnotes")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    info!("{} starting", cfg.service.name);

    let settings_file = PathBuf::from(&cfg.storage.settings_file);
    let settings = Settings::load_or_init(&settings_file)?;
    let data_dir = PathBuf::from(&settings.data_directory);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    info!("Data directory: {}", data_dir.display());

    let status = Arc::new(StatusHub::new());

    let recorder = Arc::new(SessionRecorder::new(
        data_dir.clone(),
        RecorderConfig {
            target_fps: cfg.capture.target_fps,
            screenshot_interval: Duration::from_secs(cfg.capture.screenshot_interval_secs),
            monitor_interval: Duration::from_secs(cfg.capture.monitor_interval_secs),
            ffmpeg: cfg.capture.ffmpeg.clone(),
        },
        Arc::clone(&status),
    ));

    let notes_config = NotesConfig {
        base_url: cfg.notes.base_url.clone(),
        model: cfg.notes.model.clone(),
        assistant_name: cfg.notes.assistant_name.clone(),
        instructions: None,
        format: NoteFormat::parse(&cfg.notes.format).unwrap_or_else(|| {
            warn!("Unknown note format '{}'; using md", cfg.notes.format);
            NoteFormat::Md
        }),
    };

    let workspace = Arc::new(WorkspaceManager::new(
        data_dir.clone(),
        Arc::clone(&status),
        cfg.transcribe.binary.clone(),
        cfg.transcribe.models_dir.clone(),
        notes_config,
        settings,
    ));

    let (scan_tx, scan_rx) = mpsc::channel(100);
    let (settings_tx, settings_rx) = mpsc::channel(100);
    WorkspaceScanner::new(data_dir, Duration::from_secs(2), scan_tx).spawn();
    settings::spawn_watcher(settings_file.clone(), Duration::from_secs(2), settings_tx);
    Arc::clone(&workspace).spawn(scan_rx, settings_rx);

    let state = AppState::new(recorder, Arc::clone(&workspace), status, settings_file);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
