pub mod audio;
pub mod config;
pub mod conversations;
pub mod dispatch;
pub mod ui;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Speech output error: {0}")]
    SpeechError(String),

    #[error("Speech recognition error: {0}")]
    RecognitionError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("{0} is not available")]
    VoiceUnavailable(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(e: serde_json::Error) -> Self {
        ParleyError::SerializationError(e.to_string())
    }
}

impl ParleyError {
    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::StorageError(_) | ParleyError::SerializationError(_) => {
                "Conversation history could not be saved.".to_string()
            }
            ParleyError::NetworkError(_) => {
                "Could not reach the chat service. Please try again.".to_string()
            }
            ParleyError::RemoteError(reason) => reason.clone(),
            ParleyError::SpeechError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            ParleyError::RecognitionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            ParleyError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            ParleyError::ModelLoadError(_) => {
                "Failed to load speech model. Please verify model files are present.".to_string()
            }
            ParleyError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            ParleyError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ParleyError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            ParleyError::IOError(_) => "File system error occurred.".to_string(),
            ParleyError::VoiceUnavailable(what) => {
                format!("{} not supported on this system", what)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_shows_reason() {
        let err = ParleyError::RemoteError("Service not configured.".into());
        assert_eq!(err.user_message(), "Service not configured.");
    }

    #[test]
    fn test_voice_unavailable_message() {
        let err = ParleyError::VoiceUnavailable("Speech recognition".into());
        assert_eq!(err.user_message(), "Speech recognition not supported on this system");
        assert_eq!(err.to_string(), "Speech recognition is not available");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: ParleyError = serde_json::from_str::<Vec<u32>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ParleyError::SerializationError(_)));
    }
}
