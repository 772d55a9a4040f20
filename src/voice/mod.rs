//! Speech output and input
//!
//! Engines sit behind the [`SpeechOutput`] and [`SpeechInput`] traits. Every
//! call that starts audio work hands back a session whose completion arrives
//! on a channel, so callers poll for the outcome instead of registering
//! callbacks. Capability is checked with `is_available()` before use.

pub mod adapter;
pub mod fake;
#[cfg(feature = "audio-io")]
pub mod recognizer;
#[cfg(feature = "audio-io")]
pub mod synth;

use crate::config::VoiceConfig;
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use adapter::{clean_for_speech, select_voice, VoiceAdapter};

/// A voice offered by a speech output engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 language tag, e.g. `en-US`
    pub language: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// Text to speak with its delivery settings
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<VoiceInfo>,
    /// Speaking rate, 1.0 is normal
    pub rate: f32,
    pub pitch: f32,
    /// Output gain, 0.0 to 1.0
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// How an utterance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Finished,
    Cancelled,
    Failed(String),
}

/// Completion signal for one utterance
pub struct SpeechCompletion {
    rx: Receiver<SpeechOutcome>,
}

impl SpeechCompletion {
    /// Create the sender half kept by the engine and the completion handed out
    pub fn channel() -> (Sender<SpeechOutcome>, Self) {
        let (tx, rx) = bounded(1);
        (tx, Self { rx })
    }

    /// The outcome, if the utterance has ended. A dropped engine counts as cancelled.
    pub fn poll(&self) -> Option<SpeechOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(crossbeam_channel::TryRecvError::Empty) => None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => Some(SpeechOutcome::Cancelled),
        }
    }

    pub fn wait(&self, timeout: Duration) -> Option<SpeechOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Text-to-speech engine
pub trait SpeechOutput: Send {
    fn is_available(&self) -> bool;

    fn voices(&self) -> Vec<VoiceInfo>;

    fn speak(&mut self, utterance: Utterance) -> Result<SpeechCompletion>;

    /// Whether an utterance is playing or queued
    fn is_busy(&self) -> bool;

    /// Stop the current utterance and drop queued ones
    fn cancel(&mut self) -> Result<()>;
}

/// Options for one recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub language: String,
    /// Report partial transcripts as they form
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl Default for RecognitionRequest {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// How a recognition session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Transcript(String),
    Failed(String),
    Cancelled,
}

/// Engine-side half of a recognition session
pub struct RecognitionReporter {
    tx: Sender<RecognitionOutcome>,
    cancelled: Arc<AtomicBool>,
}

impl RecognitionReporter {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Deliver the final outcome; the session ends here
    pub fn report(self, outcome: RecognitionOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// Caller-side handle of a single-utterance recognition
pub struct RecognitionSession {
    rx: Receiver<RecognitionOutcome>,
    cancelled: Arc<AtomicBool>,
}

impl RecognitionSession {
    pub fn channel() -> (RecognitionReporter, Self) {
        let (tx, rx) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        (
            RecognitionReporter {
                tx,
                cancelled: Arc::clone(&cancelled),
            },
            Self { rx, cancelled },
        )
    }

    /// The outcome, if the session has ended. A dropped engine counts as cancelled.
    pub fn poll(&self) -> Option<RecognitionOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(crossbeam_channel::TryRecvError::Empty) => None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Some(RecognitionOutcome::Cancelled)
            }
        }
    }

    pub fn wait(&self, timeout: Duration) -> Option<RecognitionOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Ask the engine to stop listening
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Speech-to-text engine
pub trait SpeechInput: Send {
    fn is_available(&self) -> bool;

    fn recognize(&mut self, request: RecognitionRequest) -> Result<RecognitionSession>;
}

/// Stand-in used when no engine is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl SpeechOutput for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: Utterance) -> Result<SpeechCompletion> {
        Err(ParleyError::VoiceUnavailable("Speech output".into()))
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SpeechInput for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn recognize(&mut self, _request: RecognitionRequest) -> Result<RecognitionSession> {
        Err(ParleyError::VoiceUnavailable("Speech recognition".into()))
    }
}

/// Build the adapter from config. Engines that are unconfigured or fail to
/// load are replaced by [`Unavailable`], which the UI reports on use.
pub fn from_config(config: &VoiceConfig) -> VoiceAdapter {
    let output: Box<dyn SpeechOutput> = match &config.tts {
        #[cfg(feature = "audio-io")]
        Some(tts) => match synth::VitsSpeechOutput::new(tts) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                warn!("Speech output disabled: {}", e);
                Box::new(Unavailable)
            }
        },
        #[cfg(not(feature = "audio-io"))]
        Some(_) => {
            warn!("Speech output needs the audio-io feature");
            Box::new(Unavailable)
        }
        None => Box::new(Unavailable),
    };

    let input: Box<dyn SpeechInput> = match &config.stt {
        #[cfg(feature = "audio-io")]
        Some(stt) => match recognizer::WhisperSpeechInput::new(stt, config) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                warn!("Speech recognition disabled: {}", e);
                Box::new(Unavailable)
            }
        },
        #[cfg(not(feature = "audio-io"))]
        Some(_) => {
            warn!("Speech recognition needs the audio-io feature");
            Box::new(Unavailable)
        }
        None => Box::new(Unavailable),
    };

    VoiceAdapter::new(output, input)
        .with_preferences(config.preferences.clone(), config.preferred_language.clone())
}
