//! Loopback audio capture
//!
//! Records what the default playback device is playing (not the microphone)
//! into `audio.wav`. The WAV container is sized to the loopback device's own
//! channel count and sample rate, never a fixed assumption. Each chunk the
//! stream callback delivers is appended to the file immediately; the session
//! is never buffered whole in memory.

use super::{CaptureError, CaptureUnit};
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SizedSample};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const AUDIO_FILE: &str = "audio.wav";

pub struct AudioCapture {
    session_dir: PathBuf,
    run: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<()>>>,
}

impl AudioCapture {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
            run: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.session_dir.join(AUDIO_FILE)
    }
}

#[async_trait::async_trait]
impl CaptureUnit for AudioCapture {
    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Audio capture already started");
            return Ok(());
        }

        // Resolve the device up front so initialization failures surface at
        // start rather than inside the capture task.
        resolve_loopback_device()?;

        self.run.store(true, Ordering::SeqCst);
        let run = Arc::clone(&self.run);
        let wav_path = self.output_path();
        self.task = Some(tokio::task::spawn_blocking(move || {
            capture_loop(wav_path, run)
        }));

        info!("Audio capture started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            warn!("Audio capture is not running; nothing to stop");
            return Ok(());
        };

        self.run.store(false, Ordering::SeqCst);
        match task.await {
            Ok(Ok(())) => info!("Audio capture stopped"),
            Ok(Err(e)) => error!("Audio capture failed: {:#}", e),
            Err(e) => error!("Audio capture task panicked: {}", e),
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "audio"
    }
}

/// Resolve a loopback-capable device mirroring the default playback device.
///
/// On WASAPI the output endpoint itself accepts an input (loopback) stream.
/// Elsewhere the loopback endpoint is a sibling input device carrying the
/// output device's name (e.g. a PulseAudio monitor source). Fatal when
/// neither exists.
fn resolve_loopback_device() -> Result<(cpal::Device, cpal::SupportedStreamConfig), CaptureError> {
    let host = cpal::default_host();
    let output = host
        .default_output_device()
        .ok_or_else(|| CaptureError::DeviceInit("no default output device".to_string()))?;

    if let Ok(config) = output.default_input_config() {
        return Ok((output, config));
    }

    let output_name = output.name().unwrap_or_default();
    let inputs = host
        .input_devices()
        .map_err(|e| CaptureError::DeviceInit(e.to_string()))?;
    for device in inputs {
        let Ok(name) = device.name() else { continue };
        if output_name.is_empty() || !name.contains(&output_name) {
            continue;
        }
        if let Ok(config) = device.default_input_config() {
            info!("Using loopback sibling device: {}", name);
            return Ok((device, config));
        }
    }

    Err(CaptureError::DeviceInit(format!(
        "no loopback device mirrors output '{}'",
        output_name
    )))
}

fn capture_loop(wav_path: PathBuf, run: Arc<AtomicBool>) -> Result<()> {
    let (device, supported) = resolve_loopback_device()?;
    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav_path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", wav_path.display()))?;

    // std channel: the realtime callback must not touch the async runtime.
    let (tx, rx) = mpsc::channel::<Vec<i16>>();
    let stream = build_stream(&device, &supported, tx)?;
    stream.play().context("Failed to start loopback stream")?;
    info!(
        "Recording loopback audio at {}Hz, {} channels",
        sample_rate, channels
    );

    let mut write_result = Ok(());
    while run.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(samples) => {
                if let Err(e) = write_samples(&mut writer, &samples) {
                    write_result = Err(e);
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Halt the callback before draining the tail and finalizing the header.
    drop(stream);
    while let Ok(samples) = rx.try_recv() {
        if write_result.is_ok() {
            write_result = write_samples(&mut writer, &samples);
        }
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    write_result
}

fn write_samples(
    writer: &mut hound::WavWriter<std::io::BufWriter<std::fs::File>>,
    samples: &[i16],
) -> Result<()> {
    for &sample in samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }
    Ok(())
}

fn build_stream(
    device: &cpal::Device,
    supported: &cpal::SupportedStreamConfig,
    tx: mpsc::Sender<Vec<i16>>,
) -> Result<cpal::Stream> {
    let config = supported.config();
    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, &config, tx)?,
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, &config, tx)?,
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(device, &config, tx)?,
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, &config, tx)?,
        other => anyhow::bail!("unsupported sample format: {:?}", other),
    };
    Ok(stream)
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: mpsc::Sender<Vec<i16>>,
) -> Result<cpal::Stream>
where
    T: SizedSample + Sample + Send + 'static,
    <T as Sample>::Float: Into<f32>,
{
    let data_callback = move |data: &[T], _info: &cpal::InputCallbackInfo| {
        let samples: Vec<i16> = data
            .iter()
            .map(|s| {
                let f: f32 = s.to_float_sample().into();
                (f.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            })
            .collect();
        // Receiver gone means the writer loop already exited; drop the chunk.
        let _ = tx.send(samples);
    };
    let error_callback = |err| error!("Loopback stream error: {}", err);

    let stream = device
        .build_input_stream(config, data_callback, error_callback, None)
        .context("Failed to build loopback input stream")?;
    Ok(stream)
}
