//! Speech-to-text capability
//!
//! A capability starts one recognition session at a time. Each session is a
//! stream of `SpeechSignal`s that always finishes with exactly one `End`.

mod command;

use tokio::sync::mpsc;

pub use command::CommandSpeech;

/// Fixed recognition settings: single utterance, final results only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub lang: String,
    pub interim_results: bool,
    pub max_alternatives: u32,
    pub continuous: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            interim_results: false,
            max_alternatives: 1,
            continuous: false,
        }
    }
}

/// One signal from a running recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechSignal {
    /// Recognized utterance, best alternative first
    Result { alternatives: Vec<String> },
    /// Engine failure; the diagnostic is only logged
    Error { diagnostic: String },
    /// Session finished. Always the last signal.
    End,
}

/// Receiving half of a recognition session
pub type SpeechSession = mpsc::Receiver<SpeechSignal>;

/// Errors raised while starting a session
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to start recognition: {0}")]
    StartFailed(String),
}

/// Platform speech engine
pub trait SpeechCapability: Send + Sync {
    /// Human-readable engine name for logs
    fn name(&self) -> &str;

    /// Start a single recognition session
    fn start(&self, options: &RecognitionOptions) -> Result<SpeechSession, SpeechError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RecognitionOptions::default();
        assert_eq!(options.lang, "en-US");
        assert!(!options.interim_results);
        assert!(!options.continuous);
        assert_eq!(options.max_alternatives, 1);
    }
}
