//! Input acquisition: the reflection text buffer and dictation sessions
//!
//! Typing and dictation both write the same buffer. Last writer wins.

use tracing::{debug, info, warn};

use crate::speech::{RecognitionOptions, SpeechCapability, SpeechSession, SpeechSignal};

use super::error::ReflectionError;
use super::model::DictationStatus;

/// What a speech signal did to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Buffer replaced by the transcript
    Transcript(String),
    /// Engine reported an error; buffer untouched
    Failed(String),
    /// Session over, back to Idle
    Ended,
    /// Signal from a session that is no longer active
    Ignored,
}

/// Owns the reflection text and the dictation lifecycle
#[derive(Debug, Default)]
pub struct InputController {
    text: String,
    dictation: DictationStatus,
    active_session: Option<u64>,
    next_session: u64,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dictation(&self) -> DictationStatus {
        self.dictation
    }

    #[cfg(test)]
    pub fn active_session(&self) -> Option<u64> {
        self.active_session
    }

    /// Replace the buffer. No validation.
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.text = value.into();
    }

    pub fn clear_text(&mut self) {
        self.text.clear();
    }

    /// Start a dictation session
    ///
    /// Returns `Ok(None)` when a session is already listening; the call is
    /// ignored in that case.
    pub fn start_dictation(
        &mut self,
        capability: Option<&dyn SpeechCapability>,
        options: &RecognitionOptions,
    ) -> Result<Option<(u64, SpeechSession)>, ReflectionError> {
        if self.dictation == DictationStatus::Listening {
            debug!(session = ?self.active_session, "dictation already listening, ignoring start");
            return Ok(None);
        }

        let capability = capability.ok_or(ReflectionError::UnsupportedCapability)?;

        let session = capability.start(options).map_err(|e| {
            warn!(engine = capability.name(), error = %e, "speech session failed to start");
            ReflectionError::DictationFailure
        })?;

        self.next_session += 1;
        let id = self.next_session;
        self.active_session = Some(id);
        self.dictation = DictationStatus::Listening;

        info!(session = id, engine = capability.name(), "dictation listening");
        Ok(Some((id, session)))
    }

    /// Fold one signal from session `session` into the controller
    pub fn apply_signal(&mut self, session: u64, signal: SpeechSignal) -> SignalOutcome {
        if self.active_session != Some(session) {
            debug!(session, ?signal, "dropping signal from inactive session");
            return SignalOutcome::Ignored;
        }

        match signal {
            SpeechSignal::Result { alternatives } => match alternatives.into_iter().next() {
                Some(transcript) => {
                    self.text = transcript.clone();
                    SignalOutcome::Transcript(transcript)
                }
                None => SignalOutcome::Ignored,
            },
            SpeechSignal::Error { diagnostic } => SignalOutcome::Failed(diagnostic),
            SpeechSignal::End => {
                self.active_session = None;
                self.dictation = DictationStatus::Idle;
                info!(session, "dictation ended");
                SignalOutcome::Ended
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::testing::ScriptedSpeech;

    fn start(controller: &mut InputController, speech: &ScriptedSpeech) -> u64 {
        let (id, _session) = controller
            .start_dictation(Some(speech), &RecognitionOptions::default())
            .unwrap()
            .unwrap();
        id
    }

    #[test]
    fn test_set_text_replaces() {
        let mut controller = InputController::new();
        controller.set_text("first");
        controller.set_text("second");
        assert_eq!(controller.text(), "second");
    }

    #[test]
    fn test_start_without_capability() {
        let mut controller = InputController::new();
        let err = controller
            .start_dictation(None, &RecognitionOptions::default())
            .unwrap_err();
        assert_eq!(err, ReflectionError::UnsupportedCapability);
        assert_eq!(controller.dictation(), DictationStatus::Idle);
    }

    #[test]
    fn test_start_failure_stays_idle() {
        let speech = ScriptedSpeech {
            fail_start: true,
            ..Default::default()
        };
        let mut controller = InputController::new();
        let err = controller
            .start_dictation(Some(&speech), &RecognitionOptions::default())
            .unwrap_err();
        assert_eq!(err, ReflectionError::DictationFailure);
        assert_eq!(controller.dictation(), DictationStatus::Idle);
    }

    #[test]
    fn test_end_without_result_returns_to_idle() {
        let speech = ScriptedSpeech::default();
        let mut controller = InputController::new();
        let id = start(&mut controller, &speech);
        assert_eq!(controller.dictation(), DictationStatus::Listening);

        assert_eq!(controller.apply_signal(id, SpeechSignal::End), SignalOutcome::Ended);
        assert_eq!(controller.dictation(), DictationStatus::Idle);
    }

    #[test]
    fn test_result_overwrites_typed_text() {
        let speech = ScriptedSpeech::default();
        let mut controller = InputController::new();
        controller.set_text("typed before speaking");
        let id = start(&mut controller, &speech);

        let outcome = controller.apply_signal(
            id,
            SpeechSignal::Result {
                alternatives: vec!["spoken words".to_string(), "spoken birds".to_string()],
            },
        );
        assert_eq!(outcome, SignalOutcome::Transcript("spoken words".to_string()));
        assert_eq!(controller.text(), "spoken words");
        // Result alone never clears Listening
        assert_eq!(controller.dictation(), DictationStatus::Listening);
    }

    #[test]
    fn test_error_leaves_text_alone() {
        let speech = ScriptedSpeech::default();
        let mut controller = InputController::new();
        controller.set_text("keep me");
        let id = start(&mut controller, &speech);

        let outcome = controller.apply_signal(
            id,
            SpeechSignal::Error {
                diagnostic: "no-speech".to_string(),
            },
        );
        assert_eq!(outcome, SignalOutcome::Failed("no-speech".to_string()));
        assert_eq!(controller.text(), "keep me");
        assert_eq!(controller.dictation(), DictationStatus::Listening);
    }

    #[test]
    fn test_second_start_is_ignored() {
        let speech = ScriptedSpeech::default();
        let mut controller = InputController::new();
        let id = start(&mut controller, &speech);

        let second = controller
            .start_dictation(Some(&speech), &RecognitionOptions::default())
            .unwrap();
        assert!(second.is_none());
        assert_eq!(speech.session_count(), 1);
        assert_eq!(controller.active_session(), Some(id));
    }

    #[test]
    fn test_stale_session_signals_dropped() {
        let speech = ScriptedSpeech::default();
        let mut controller = InputController::new();
        let first = start(&mut controller, &speech);
        controller.apply_signal(first, SpeechSignal::End);
        let second = start(&mut controller, &speech);

        let outcome = controller.apply_signal(
            first,
            SpeechSignal::Result {
                alternatives: vec!["late".to_string()],
            },
        );
        assert_eq!(outcome, SignalOutcome::Ignored);
        assert_eq!(controller.apply_signal(first, SpeechSignal::End), SignalOutcome::Ignored);
        assert_eq!(controller.dictation(), DictationStatus::Listening);
        assert_eq!(controller.active_session(), Some(second));
    }
}
