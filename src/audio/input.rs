use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use tracing::{debug, error};

/// Microphone on the default input device, feeding mono blocks to the
/// recognizer. The cpal stream is not `Send`, so a capture lives and dies on
/// the recognition thread that opened it.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl AudioInput {
    pub fn open_default() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No input device available".into()))?;

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to get input config: {}", e)))?
            .into();

        debug!(
            device = %device.name().unwrap_or_default(),
            rate = config.sample_rate.0,
            channels = config.channels,
            "Opened microphone"
        );

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }

    /// Whether the host has any input device at all
    pub fn device_present() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Begin sending mono blocks to `blocks`. Blocks are dropped, not
    /// queued, when the recognizer falls behind.
    pub fn start(&mut self, blocks: Sender<Vec<f32>>) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if blocks.try_send(downmix(data, channels)).is_err() {
                        debug!("Microphone block dropped");
                    }
                },
                |err| error!("Microphone stream error: {}", err),
                None,
            )
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to start input stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Close the stream; the callback and its sender go with it
    pub fn stop(&mut self) {
        self.stream = None;
    }
}

/// Average interleaved frames down to one channel
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
