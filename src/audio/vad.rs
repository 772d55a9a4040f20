use crate::{ParleyError, Result};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Sample rate the detector runs at
pub const VAD_SAMPLE_RATE: u32 = 16000;

/// Samples per prediction at 16 kHz (32 ms)
pub const VAD_CHUNK: usize = 512;

/// Voice Activity Detection using Silero VAD
pub struct VoiceActivityDetector {
    detector: VadDetector,
    threshold: f32,
}

impl VoiceActivityDetector {
    /// Create a 16 kHz detector with the given speech probability threshold
    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VadDetector::builder()
            .sample_rate(VAD_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK)
            .build()
            .map_err(|e| {
                ParleyError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        info!("Initialized VAD with threshold: {}", threshold);

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Whether a chunk of 16 kHz mono audio contains speech
    pub fn is_speech(&mut self, audio: &[f32]) -> bool {
        self.detector.predict(audio.iter().copied()) >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_not_speech() {
        if let Ok(mut vad) = VoiceActivityDetector::new(0.5) {
            assert!(!vad.is_speech(&[0.0; VAD_CHUNK]));
        }
    }
}
