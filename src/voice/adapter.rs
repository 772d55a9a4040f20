use super::{
    RecognitionRequest, RecognitionSession, SpeechCompletion, SpeechInput, SpeechOutput,
    Unavailable, Utterance, VoiceInfo,
};
use crate::{ParleyError, Result};
use tracing::{debug, warn};

/// Glyphs prefixed to warnings in replies, never read aloud
const WARNING_GLYPHS: [&str; 2] = ["\u{26A0}\u{FE0F}", "\u{26A0}"];

const SPEECH_RATE: f32 = 0.9;
const SPEECH_PITCH: f32 = 1.0;
const SPEECH_VOLUME: f32 = 0.8;

/// Remove warning glyphs and surrounding whitespace
pub fn clean_for_speech(text: &str) -> String {
    let mut cleaned = text.to_string();
    for glyph in WARNING_GLYPHS {
        cleaned = cleaned.replace(glyph, "");
    }
    cleaned.trim().to_string()
}

/// First voice whose name contains a preferred substring or whose language
/// starts with `language`
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    preferences: &[String],
    language: &str,
) -> Option<&'a VoiceInfo> {
    voices.iter().find(|voice| {
        preferences.iter().any(|p| voice.name.contains(p.as_str()))
            || voice.language.starts_with(language)
    })
}

/// Speaks replies and listens for spoken input
pub struct VoiceAdapter {
    output: Box<dyn SpeechOutput>,
    input: Box<dyn SpeechInput>,
    preferences: Vec<String>,
    language: String,
}

impl VoiceAdapter {
    pub fn new(output: Box<dyn SpeechOutput>, input: Box<dyn SpeechInput>) -> Self {
        Self {
            output,
            input,
            preferences: vec!["Google".to_string(), "Microsoft".to_string()],
            language: "en".to_string(),
        }
    }

    /// Adapter with neither capability
    pub fn unavailable() -> Self {
        Self::new(Box::new(Unavailable), Box::new(Unavailable))
    }

    /// Override the voice preference list and fallback language prefix
    pub fn with_preferences(mut self, preferences: Vec<String>, language: impl Into<String>) -> Self {
        self.preferences = preferences;
        self.language = language.into();
        self
    }

    pub fn can_speak(&self) -> bool {
        self.output.is_available()
    }

    pub fn can_listen(&self) -> bool {
        self.input.is_available()
    }

    /// Speak `text`, replacing whatever is playing.
    ///
    /// Returns `None` when there is nothing to say, no engine, or the
    /// engine refused the utterance.
    pub fn speak(&mut self, text: &str) -> Option<SpeechCompletion> {
        let text = clean_for_speech(text);
        if text.is_empty() || !self.output.is_available() {
            return None;
        }

        let voices = self.output.voices();
        let voice = select_voice(&voices, &self.preferences, &self.language).cloned();

        let utterance = Utterance {
            text,
            voice,
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
            volume: SPEECH_VOLUME,
        };

        self.stop();

        match self.output.speak(utterance) {
            Ok(completion) => Some(completion),
            Err(e) => {
                warn!("Speech output failed: {}", e);
                None
            }
        }
    }

    /// Start a single-utterance recognition session
    pub fn listen(&mut self) -> Result<RecognitionSession> {
        if !self.input.is_available() {
            return Err(ParleyError::VoiceUnavailable("Speech recognition".into()));
        }

        self.input.recognize(RecognitionRequest::default())
    }

    /// Cancel playing or pending speech, ignoring engine errors
    pub fn stop(&mut self) {
        if !self.output.is_available() || !self.output.is_busy() {
            return;
        }

        if let Err(e) = self.output.cancel() {
            debug!("Stopping speech failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::fake::{FakeSpeechInput, FakeSpeechOutput};

    #[test]
    fn test_clean_for_speech() {
        assert_eq!(clean_for_speech("⚠️ Error: offline"), "Error: offline");
        assert_eq!(clean_for_speech("\u{26A0} plain"), "plain");
        assert_eq!(clean_for_speech("  ⚠️  "), "");
        assert_eq!(clean_for_speech("Hello"), "Hello");
    }

    #[test]
    fn test_select_voice_by_name() {
        let voices = vec![
            VoiceInfo::new("Alice", "fr-FR"),
            VoiceInfo::new("Microsoft Zira", "de-DE"),
            VoiceInfo::new("Bob", "en-GB"),
        ];
        let prefs = vec!["Google".to_string(), "Microsoft".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "en").unwrap().name, "Microsoft Zira");
    }

    #[test]
    fn test_select_voice_first_match_wins() {
        let voices = vec![
            VoiceInfo::new("Bob", "en-GB"),
            VoiceInfo::new("Google US", "en-US"),
        ];
        let prefs = vec!["Google".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "en").unwrap().name, "Bob");
    }

    #[test]
    fn test_select_voice_none() {
        let voices = vec![VoiceInfo::new("Alice", "fr-FR")];
        assert!(select_voice(&voices, &["Google".to_string()], "en").is_none());
    }

    #[test]
    fn test_speak_uses_preferred_voice_and_settings() {
        let output = FakeSpeechOutput::new(vec![
            VoiceInfo::new("Alice", "fr-FR"),
            VoiceInfo::new("Piper Amy", "en-US"),
        ]);
        let mut adapter = VoiceAdapter::new(Box::new(output.clone()), Box::new(Unavailable));

        assert!(adapter.speak("⚠️ Hello there").is_some());

        let spoken = output.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "Hello there");
        assert_eq!(spoken[0].voice.as_ref().unwrap().name, "Piper Amy");
        assert_eq!(spoken[0].rate, 0.9);
        assert_eq!(spoken[0].volume, 0.8);
    }

    #[test]
    fn test_speak_empty_is_noop() {
        let output = FakeSpeechOutput::new(Vec::new());
        let mut adapter = VoiceAdapter::new(Box::new(output.clone()), Box::new(Unavailable));
        assert!(adapter.speak("  ⚠️ ").is_none());
        assert!(output.spoken().is_empty());
    }

    #[test]
    fn test_speak_cancels_current() {
        let output = FakeSpeechOutput::new(Vec::new());
        let mut adapter = VoiceAdapter::new(Box::new(output.clone()), Box::new(Unavailable));

        adapter.speak("first");
        adapter.speak("second");
        assert_eq!(output.cancels(), 1);
        assert_eq!(output.spoken().len(), 2);
    }

    #[test]
    fn test_speak_without_engine() {
        let mut adapter = VoiceAdapter::unavailable();
        assert!(!adapter.can_speak());
        assert!(adapter.speak("Hello").is_none());
        adapter.stop();
    }

    #[test]
    fn test_stop_swallows_errors() {
        let output = FakeSpeechOutput::new(Vec::new()).failing_cancel();
        let mut adapter = VoiceAdapter::new(Box::new(output.clone()), Box::new(Unavailable));
        adapter.speak("Hello");
        adapter.stop();
        assert_eq!(output.cancels(), 1);
    }

    #[test]
    fn test_listen_unavailable() {
        let mut adapter = VoiceAdapter::unavailable();
        assert!(matches!(
            adapter.listen(),
            Err(ParleyError::VoiceUnavailable(_))
        ));
    }

    #[test]
    fn test_listen_uses_single_final_result() {
        let input = FakeSpeechInput::new();
        let mut adapter = VoiceAdapter::new(Box::new(Unavailable), Box::new(input.clone()));

        let _session = adapter.listen().unwrap();
        let requests = input.requests();
        assert_eq!(requests, vec![RecognitionRequest::default()]);
    }
}
