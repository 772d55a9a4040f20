//! Audio plumbing for the native speech engines

#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod resampler;
pub mod vad;

#[cfg(feature = "audio-io")]
pub use input::AudioInput;
#[cfg(feature = "audio-io")]
pub use output::AudioOutput;
pub use resampler::{resample_audio, AudioResampler};
pub use vad::{VoiceActivityDetector, VAD_CHUNK, VAD_SAMPLE_RATE};
