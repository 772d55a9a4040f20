use crate::{ParleyError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames consumed per rubato call
const CHUNK_FRAMES: usize = 1024;

/// Streaming mono resampler
///
/// Samples are fed with [`push`](Self::push) as they arrive from the device;
/// output is produced one fixed-size chunk at a time so the filter state
/// carries across calls. [`flush`](Self::flush) drains the remainder.
pub struct AudioResampler {
    resampler: Option<SincFixedIn<f32>>,
    input_rate: u32,
    output_rate: u32,
    pending: Vec<f32>,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(ParleyError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let resampler = if input_rate == output_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };

            let resampler = SincFixedIn::<f32>::new(
                output_rate as f64 / input_rate as f64,
                2.0,
                params,
                CHUNK_FRAMES,
                1,
            )
            .map_err(|e| {
                ParleyError::AudioProcessingError(format!("Failed to create resampler: {}", e))
            })?;
            Some(resampler)
        };

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            pending: Vec::with_capacity(CHUNK_FRAMES * 2),
        })
    }

    /// Feed samples, returning whatever output is ready
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(input.to_vec());
        };

        self.pending.extend_from_slice(input);

        let mut output = Vec::new();
        while self.pending.len() >= CHUNK_FRAMES {
            let chunk: Vec<f32> = self.pending.drain(..CHUNK_FRAMES).collect();
            let out = resampler.process(&[chunk], None).map_err(|e| {
                ParleyError::AudioProcessingError(format!("Resampling failed: {}", e))
            })?;
            output.extend_from_slice(&out[0]);
        }

        Ok(output)
    }

    /// Resample the buffered remainder, zero-padded to a full chunk
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let frames = self.pending.len();
        let mut chunk = std::mem::take(&mut self.pending);
        chunk.resize(CHUNK_FRAMES, 0.0);

        let out = resampler
            .process(&[chunk], None)
            .map_err(|e| ParleyError::AudioProcessingError(format!("Resampling failed: {}", e)))?;

        // Only the share of output that corresponds to real input
        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let take = ((frames as f64) * ratio).ceil() as usize;
        Ok(out[0][..take.min(out[0].len())].to_vec())
    }
}

/// Resample a complete buffer in one step
pub fn resample_audio(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let mut resampler = AudioResampler::new(input_rate, output_rate)?;
    let mut output = resampler.push(input)?;
    output.extend(resampler.flush()?);
    Ok(output)
}
