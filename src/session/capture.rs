//! Microphone audio capture.
//!
//! The capture source accumulates raw samples while active and seals them
//! into a single immutable byte buffer when stopped. Stopping always
//! releases the device; acquisition happens fresh on every start, so a
//! reset-then-start cycle never carries a device handle over.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use super::SessionError;

/// The sealed recording: owned bytes plus the container MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Audio capture source for a recording session.
///
/// `start` fails with `PermissionDenied` when the platform refuses the
/// device; the session stays Idle in that case. `stop` seals the capture
/// and must release the device on every exit path.
pub trait AudioCapture {
    fn start(&mut self) -> Result<(), SessionError>;

    fn stop(&mut self) -> Result<AudioArtifact, SessionError>;

    fn is_active(&self) -> bool;
}

/// cpal-backed microphone capture, sealed as 16-bit mono WAV.
pub struct MicCapture {
    sample_rate: u32,
    samples: Arc<Mutex<Vec<f32>>>,
    stream: Option<cpal::Stream>,
    active: bool,
}

impl MicCapture {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            active: false,
        }
    }

    fn seal_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, SessionError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buffer, spec)
                .map_err(|e| SessionError::Capture(format!("failed to start WAV writer: {e}")))?;
            for &sample in samples {
                let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(clamped)
                    .map_err(|e| SessionError::Capture(format!("failed to write sample: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| SessionError::Capture(format!("failed to finalize WAV: {e}")))?;
        }

        Ok(buffer.into_inner())
    }
}

impl AudioCapture for MicCapture {
    fn start(&mut self) -> Result<(), SessionError> {
        if self.active {
            return Err(SessionError::Capture("mic already capturing".to_string()));
        }

        // Acquire the device anew on every start.
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            SessionError::PermissionDenied("no input device available".to_string())
        })?;

        info!(
            "Recording mic capture using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        {
            let mut samples = self.samples.lock().unwrap();
            samples.clear();
            samples.shrink_to_fit();
        }

        let samples_clone = self.samples.clone();
        let err_fn = |err| error!("Mic stream error: {}", err);

        let stream = self
            .device_stream(&device, &config, samples_clone, err_fn)
            .map_err(|e| SessionError::PermissionDenied(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SessionError::PermissionDenied(e.to_string()))?;

        self.stream = Some(stream);
        self.active = true;

        info!("Mic capture started at {} Hz", self.sample_rate);
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioArtifact, SessionError> {
        if !self.active {
            return Err(SessionError::Capture("mic not capturing".to_string()));
        }

        // Dropping the stream stops the callback and releases the device.
        if let Some(stream) = self.stream.take() {
            debug!("Stopping mic stream");
            drop(stream);
        }
        self.active = false;

        let samples = {
            let mut guard = self.samples.lock().unwrap();
            let s = std::mem::take(&mut *guard);
            guard.shrink_to_fit();
            s
        };

        info!("Mic capture stopped, {} samples captured", samples.len());

        let bytes = Self::seal_wav(&samples, self.sample_rate)?;
        Ok(AudioArtifact {
            bytes,
            mime_type: "audio/wav",
        })
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl MicCapture {
    fn device_stream(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        sink: Arc<Mutex<Vec<f32>>>,
        err_fn: fn(cpal::StreamError),
    ) -> Result<cpal::Stream, cpal::BuildStreamError> {
        device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = sink.lock() {
                    samples.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        )
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active MicCapture, cleaning up");
            let _ = self.stop();
        }
    }
}
