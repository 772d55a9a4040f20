//! Scriptable speech engines for tests and machines without audio

use super::{
    RecognitionOutcome, RecognitionReporter, RecognitionRequest, RecognitionSession,
    SpeechCompletion, SpeechInput, SpeechOutcome, SpeechOutput, Utterance, VoiceInfo,
};
use crate::{ParleyError, Result};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct OutputLog {
    spoken: Vec<Utterance>,
    pending: Vec<Sender<SpeechOutcome>>,
    cancels: usize,
}

/// Records utterances instead of playing them. Clones share the log.
#[derive(Clone)]
pub struct FakeSpeechOutput {
    voices: Vec<VoiceInfo>,
    fail_cancel: bool,
    log: Arc<Mutex<OutputLog>>,
}

impl FakeSpeechOutput {
    pub fn new(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            fail_cancel: false,
            log: Arc::new(Mutex::new(OutputLog::default())),
        }
    }

    /// Make `cancel` return an error after recording the call
    pub fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.log.lock().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.log.lock().cancels
    }

    /// Complete every pending utterance
    pub fn finish_all(&self) {
        for tx in self.log.lock().pending.drain(..) {
            let _ = tx.send(SpeechOutcome::Finished);
        }
    }

    /// Drop every pending utterance without an outcome, as a crashed engine would
    pub fn abandon_all(&self) {
        self.log.lock().pending.clear();
    }
}

impl SpeechOutput for FakeSpeechOutput {
    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<SpeechCompletion> {
        let (tx, completion) = SpeechCompletion::channel();
        let mut log = self.log.lock();
        log.spoken.push(utterance);
        log.pending.push(tx);
        Ok(completion)
    }

    fn is_busy(&self) -> bool {
        !self.log.lock().pending.is_empty()
    }

    fn cancel(&mut self) -> Result<()> {
        let mut log = self.log.lock();
        log.cancels += 1;
        if self.fail_cancel {
            return Err(ParleyError::SpeechError("cancel refused".into()));
        }
        for tx in log.pending.drain(..) {
            let _ = tx.send(SpeechOutcome::Cancelled);
        }
        Ok(())
    }
}

#[derive(Default)]
struct InputLog {
    requests: Vec<RecognitionRequest>,
    reporters: Vec<RecognitionReporter>,
}

/// Hands out sessions that tests complete with [`FakeSpeechInput::respond`]
#[derive(Clone)]
pub struct FakeSpeechInput {
    available: bool,
    log: Arc<Mutex<InputLog>>,
}

impl FakeSpeechInput {
    pub fn new() -> Self {
        Self {
            available: true,
            log: Arc::new(Mutex::new(InputLog::default())),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<RecognitionRequest> {
        self.log.lock().requests.clone()
    }

    /// Sessions started and not yet answered
    pub fn open_sessions(&self) -> usize {
        self.log.lock().reporters.len()
    }

    /// Finish the oldest open session. Returns false when none is open.
    pub fn respond(&self, outcome: RecognitionOutcome) -> bool {
        let mut log = self.log.lock();
        if log.reporters.is_empty() {
            return false;
        }
        let reporter = log.reporters.remove(0);
        reporter.report(outcome);
        true
    }
}

impl Default for FakeSpeechInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechInput for FakeSpeechInput {
    fn is_available(&self) -> bool {
        self.available
    }

    fn recognize(&mut self, request: RecognitionRequest) -> Result<RecognitionSession> {
        if !self.available {
            return Err(ParleyError::VoiceUnavailable("Speech recognition".into()));
        }

        let (reporter, session) = RecognitionSession::channel();
        let mut log = self.log.lock();
        log.requests.push(request);
        log.reporters.push(reporter);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_finish_and_cancel() {
        let mut output = FakeSpeechOutput::new(Vec::new());
        let first = output.speak(Utterance::new("one")).unwrap();
        assert!(output.is_busy());

        output.cancel().unwrap();
        assert_eq!(first.poll(), Some(SpeechOutcome::Cancelled));
        assert!(!output.is_busy());

        let second = output.speak(Utterance::new("two")).unwrap();
        output.finish_all();
        assert_eq!(second.poll(), Some(SpeechOutcome::Finished));
    }

    #[test]
    fn test_input_respond() {
        let mut input = FakeSpeechInput::new();
        let session = input.recognize(RecognitionRequest::default()).unwrap();
        assert_eq!(input.open_sessions(), 1);

        assert!(input.respond(RecognitionOutcome::Transcript("hi".into())));
        assert_eq!(
            session.poll(),
            Some(RecognitionOutcome::Transcript("hi".into()))
        );
        assert!(!input.respond(RecognitionOutcome::Cancelled));
    }

    #[test]
    fn test_input_unavailable() {
        let mut input = FakeSpeechInput::unavailable();
        assert!(!input.is_available());
        assert!(input.recognize(RecognitionRequest::default()).is_err());
    }
}
