use crate::audio::resampler::resample_audio;
use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// Playback queue on the default output device.
///
/// The stream runs for the lifetime of the value and plays silence while the
/// queue is empty. Like [`AudioInput`](super::input::AudioInput) it must stay
/// on the thread that created it.
pub struct AudioOutput {
    config: StreamConfig,
    queue: Arc<Mutex<Vec<f32>>>,
    _stream: Stream,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device: Device = host
            .default_output_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to get output config: {}", e)))?
            .into();

        let channels = config.channels as usize;
        let queue = Arc::new(Mutex::new(Vec::new()));
        let playback = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut queue = playback.lock();
                    let frames = (data.len() / channels).min(queue.len());

                    for (i, sample) in queue.drain(..frames).enumerate() {
                        for c in 0..channels {
                            data[i * channels + c] = sample;
                        }
                    }
                    data[frames * channels..].fill(0.0);
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to start output stream: {}", e)))?;

        Ok(Self {
            config,
            queue,
            _stream: stream,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Queue mono samples recorded at `sample_rate`
    pub fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        let samples = resample_audio(samples, sample_rate, self.sample_rate())?;
        self.queue.lock().extend_from_slice(&samples);
        Ok(())
    }

    /// Drop everything not yet played
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Frames still waiting to be played
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }
}
