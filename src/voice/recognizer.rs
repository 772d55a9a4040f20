//! Local speech recognition with Whisper
//!
//! Each session opens the microphone on its own thread, feeds 16 kHz audio
//! through the VAD and stops after a stretch of silence following speech.
//! The captured utterance is then transcribed in one pass.

use super::{
    RecognitionOutcome, RecognitionReporter, RecognitionRequest, RecognitionSession, SpeechInput,
};
use crate::audio::{AudioInput, AudioResampler, VoiceActivityDetector, VAD_CHUNK, VAD_SAMPLE_RATE};
use crate::config::{SttModelConfig, VoiceConfig};
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const CAPTURE_POLL: Duration = Duration::from_millis(50);

/// Error codes reported as [`RecognitionOutcome::Failed`]
pub const NO_SPEECH: &str = "no-speech";
pub const AUDIO_CAPTURE: &str = "audio-capture";

/// When to stop capturing
#[derive(Debug, Clone, Copy)]
struct Endpointing {
    threshold: f32,
    silence_samples: usize,
    max_samples: usize,
}

impl Endpointing {
    fn from_config(voice: &VoiceConfig) -> Self {
        let rate = VAD_SAMPLE_RATE as usize;
        Self {
            threshold: voice.vad_threshold,
            silence_samples: voice.silence_ms as usize * rate / 1000,
            max_samples: voice.max_utterance_secs as usize * rate,
        }
    }
}

/// Tracks speech and trailing silence over 16 kHz chunks
#[derive(Debug, Default)]
struct UtteranceTracker {
    samples: Vec<f32>,
    heard_speech: bool,
    silence: usize,
}

impl UtteranceTracker {
    /// Record a chunk; returns true once the utterance is complete
    fn push(&mut self, chunk: &[f32], is_speech: bool, limits: &Endpointing) -> bool {
        self.samples.extend_from_slice(chunk);

        if is_speech {
            self.heard_speech = true;
            self.silence = 0;
        } else if self.heard_speech {
            self.silence += chunk.len();
        }

        (self.heard_speech && self.silence >= limits.silence_samples)
            || self.samples.len() >= limits.max_samples
    }
}

/// Speech input backed by a Whisper model loaded at startup
pub struct WhisperSpeechInput {
    context: Arc<WhisperContext>,
    n_threads: i32,
    limits: Endpointing,
}

impl WhisperSpeechInput {
    pub fn new(stt: &SttModelConfig, voice: &VoiceConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", stt.model_path);

        if !stt.model_path.exists() {
            return Err(ParleyError::ModelLoadError(format!(
                "Model file not found: {:?}",
                stt.model_path
            )));
        }

        let context = WhisperContext::new_with_params(
            stt.model_path
                .to_str()
                .ok_or_else(|| ParleyError::ModelLoadError("Invalid model path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| ParleyError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e)))?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            context: Arc::new(context),
            n_threads: stt.n_threads,
            limits: Endpointing::from_config(voice),
        })
    }
}

impl SpeechInput for WhisperSpeechInput {
    fn is_available(&self) -> bool {
        AudioInput::device_present()
    }

    fn recognize(&mut self, request: RecognitionRequest) -> Result<RecognitionSession> {
        let (reporter, session) = RecognitionSession::channel();
        let context = Arc::clone(&self.context);
        let n_threads = self.n_threads;
        let limits = self.limits;

        thread::Builder::new()
            .name("parley-stt".into())
            .spawn(move || {
                let outcome = run_session(&context, n_threads, limits, &request, &reporter);
                debug!("Recognition ended: {:?}", outcome);
                reporter.report(outcome);
            })?;

        Ok(session)
    }
}

fn run_session(
    context: &WhisperContext,
    n_threads: i32,
    limits: Endpointing,
    request: &RecognitionRequest,
    reporter: &RecognitionReporter,
) -> RecognitionOutcome {
    let samples = match capture_utterance(limits, reporter) {
        Ok(Some(samples)) => samples,
        Ok(None) => return RecognitionOutcome::Cancelled,
        Err(e) => {
            warn!("Audio capture failed: {}", e);
            return RecognitionOutcome::Failed(AUDIO_CAPTURE.to_string());
        }
    };

    if reporter.is_cancelled() {
        return RecognitionOutcome::Cancelled;
    }

    if samples.is_empty() {
        return RecognitionOutcome::Failed(NO_SPEECH.to_string());
    }

    match transcribe(context, n_threads, whisper_language(&request.language), &samples) {
        Ok(text) if text.is_empty() => RecognitionOutcome::Failed(NO_SPEECH.to_string()),
        Ok(text) => RecognitionOutcome::Transcript(text),
        Err(e) => {
            warn!("Transcription failed: {}", e);
            RecognitionOutcome::Failed(e.to_string())
        }
    }
}

/// Capture one utterance at 16 kHz. `None` means the session was cancelled;
/// an empty buffer means nothing was said before the time limit.
fn capture_utterance(
    limits: Endpointing,
    reporter: &RecognitionReporter,
) -> Result<Option<Vec<f32>>> {
    let mut input = AudioInput::open_default()?;
    let mut resampler = AudioResampler::new(input.sample_rate(), VAD_SAMPLE_RATE)?;
    let mut vad = VoiceActivityDetector::new(limits.threshold)?;

    let (audio_tx, audio_rx) = bounded(64);
    input.start(audio_tx)?;

    let mut tracker = UtteranceTracker::default();
    let mut pending: Vec<f32> = Vec::new();

    loop {
        if reporter.is_cancelled() {
            input.stop();
            return Ok(None);
        }

        let block = match audio_rx.recv_timeout(CAPTURE_POLL) {
            Ok(block) => block,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ParleyError::AudioDeviceError("Input stream closed".into()));
            }
        };

        pending.extend(resampler.push(&block)?);

        let mut done = false;
        let mut consumed = 0;
        for chunk in pending.chunks_exact(VAD_CHUNK) {
            consumed += VAD_CHUNK;
            if tracker.push(chunk, vad.is_speech(chunk), &limits) {
                done = true;
                break;
            }
        }
        pending.drain(..consumed);

        if done {
            break;
        }
    }

    input.stop();

    if tracker.heard_speech {
        Ok(Some(tracker.samples))
    } else {
        Ok(Some(Vec::new()))
    }
}

/// Whisper takes a bare language code, e.g. `en` for `en-US`
fn whisper_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

fn transcribe(
    context: &WhisperContext,
    n_threads: i32,
    language: &str,
    samples: &[f32],
) -> Result<String> {
    debug!(
        "Transcribing {} samples ({:.2}s)",
        samples.len(),
        samples.len() as f32 / VAD_SAMPLE_RATE as f32
    );

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_n_threads(n_threads);
    params.set_language(Some(language));
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    let mut state = context
        .create_state()
        .map_err(|e| ParleyError::RecognitionError(format!("Failed to create state: {:?}", e)))?;

    state
        .full(params, samples)
        .map_err(|e| ParleyError::RecognitionError(format!("Transcription failed: {:?}", e)))?;

    let num_segments = state
        .full_n_segments()
        .map_err(|e| ParleyError::RecognitionError(format!("Failed to get segments: {:?}", e)))?;

    let mut text = String::new();
    for i in 0..num_segments {
        let segment = state.full_get_segment_text(i).map_err(|e| {
            ParleyError::RecognitionError(format!("Failed to get segment text: {:?}", e))
        })?;
        text.push_str(&segment);
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Endpointing {
        Endpointing {
            threshold: 0.5,
            silence_samples: 1024,
            max_samples: 16000,
        }
    }

    #[test]
    fn test_whisper_language() {
        assert_eq!(whisper_language("en-US"), "en");
        assert_eq!(whisper_language("de_DE"), "de");
        assert_eq!(whisper_language("fr"), "fr");
    }

    #[test]
    fn test_endpointing_from_config() {
        let voice = VoiceConfig::default();
        let limits = Endpointing::from_config(&voice);
        assert_eq!(limits.silence_samples, 800 * 16);
        assert_eq!(limits.max_samples, 15 * 16000);
    }

    #[test]
    fn test_silence_before_speech_never_ends() {
        let mut tracker = UtteranceTracker::default();
        let chunk = [0.0; VAD_CHUNK];
        for _ in 0..10 {
            assert!(!tracker.push(&chunk, false, &limits()));
        }
        assert!(!tracker.heard_speech);
    }

    #[test]
    fn test_trailing_silence_ends_utterance() {
        let mut tracker = UtteranceTracker::default();
        let chunk = [0.1; VAD_CHUNK];
        assert!(!tracker.push(&chunk, true, &limits()));
        assert!(!tracker.push(&chunk, false, &limits()));
        assert!(tracker.push(&chunk, false, &limits()));
    }

    #[test]
    fn test_speech_resets_silence() {
        let mut tracker = UtteranceTracker::default();
        let chunk = [0.1; VAD_CHUNK];
        tracker.push(&chunk, true, &limits());
        tracker.push(&chunk, false, &limits());
        tracker.push(&chunk, true, &limits());
        assert_eq!(tracker.silence, 0);
        assert!(!tracker.push(&chunk, false, &limits()));
    }

    #[test]
    fn test_max_length_ends_utterance() {
        let mut tracker = UtteranceTracker::default();
        let chunk = [0.1; VAD_CHUNK];
        let mut ended = false;
        for _ in 0..(16000 / VAD_CHUNK + 1) {
            if tracker.push(&chunk, true, &limits()) {
                ended = true;
                break;
            }
        }
        assert!(ended);
    }

    #[test]
    fn test_missing_model_rejected() {
        let stt = SttModelConfig {
            model_path: "/nonexistent/ggml-base.en.bin".into(),
            n_threads: 1,
        };
        assert!(matches!(
            WhisperSpeechInput::new(&stt, &VoiceConfig::default()),
            Err(ParleyError::ModelLoadError(_))
        ));
    }
}
