//! Submission lifecycle: Idle -> Analyzing -> settled
//!
//! `begin` validates and enters Analyzing, `settle` folds the
//! classification outcome back in. At most one submission is in flight;
//! `begin` while Analyzing is rejected with `Busy`.

use tracing::{info, warn};

use crate::classify::ClassifyError;

use super::error::ReflectionError;
use super::model::{ClassificationResult, SubmissionStatus};

#[derive(Debug, Default)]
pub struct SubmissionMachine {
    analyzing: bool,
    error: Option<ReflectionError>,
    result: Option<ClassificationResult>,
    history: Vec<ClassificationResult>,
}

impl SubmissionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived status. Local validation failures keep the machine Idle even
    /// though their message is displayed.
    pub fn status(&self) -> SubmissionStatus {
        if self.analyzing {
            SubmissionStatus::Analyzing
        } else if self.error == Some(ReflectionError::ClassificationUnavailable) {
            SubmissionStatus::Error
        } else {
            SubmissionStatus::Idle
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<ReflectionError> {
        self.error
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error.map(|e| e.user_message())
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    /// Successful results, newest first
    pub fn history(&self) -> &[ClassificationResult] {
        &self.history
    }

    /// Validate `text` and enter Analyzing
    ///
    /// Returns the payload to send to the classifier.
    pub fn begin(&mut self, text: &str) -> Result<String, ReflectionError> {
        if self.analyzing {
            warn!("submission rejected, one is already in flight");
            return Err(ReflectionError::Busy);
        }

        if text.trim().is_empty() {
            info!("submission rejected, empty reflection");
            self.error = Some(ReflectionError::EmptyInput);
            return Err(ReflectionError::EmptyInput);
        }

        let from = self.status();
        self.analyzing = true;
        self.error = None;
        self.result = None;

        info!(from = %from, to = %self.status(), chars = text.chars().count(), "submission dispatched");
        Ok(text.to_string())
    }

    /// Fold the classifier outcome into result, error and history
    pub fn settle(
        &mut self,
        outcome: Result<ClassificationResult, ClassifyError>,
    ) -> Result<ClassificationResult, ReflectionError> {
        self.analyzing = false;

        let settled = match outcome {
            Ok(result) => {
                self.error = None;
                self.result = Some(result.clone());
                self.history.insert(0, result.clone());
                info!(
                    emotion = %result.emotion,
                    confidence = result.confidence,
                    history_len = self.history.len(),
                    "submission succeeded"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "classification failed");
                self.error = Some(ReflectionError::ClassificationUnavailable);
                self.result = None;
                Err(ReflectionError::ClassificationUnavailable)
            }
        };

        info!(from = %SubmissionStatus::Analyzing, to = %self.status(), "submission settled");
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn succeed(machine: &mut SubmissionMachine, text: &str, emotion: &str, confidence: f64) {
        machine.begin(text).unwrap();
        machine
            .settle(Ok(ClassificationResult::new(emotion, confidence)))
            .unwrap();
    }

    #[test]
    fn test_blank_input_rejected() {
        for text in ["", "   ", "\n\t "] {
            let mut machine = SubmissionMachine::new();
            assert_eq!(machine.begin(text), Err(ReflectionError::EmptyInput));
            assert_eq!(machine.status(), SubmissionStatus::Idle);
            assert_eq!(machine.error_message(), Some("Please enter your reflection."));
            assert!(machine.history().is_empty());
        }
    }

    #[test]
    fn test_begin_enters_analyzing_and_clears_display() {
        let mut machine = SubmissionMachine::new();
        succeed(&mut machine, "ok", "Neutral", 0.7);
        let _ = machine.begin("   ");
        assert!(machine.error().is_some());

        let payload = machine.begin("I feel great today").unwrap();
        assert_eq!(payload, "I feel great today");
        assert_eq!(machine.status(), SubmissionStatus::Analyzing);
        assert!(machine.error().is_none());
        assert!(machine.result().is_none());
        // History survives entering Analyzing
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn test_payload_is_untrimmed() {
        let mut machine = SubmissionMachine::new();
        assert_eq!(machine.begin("  padded  ").unwrap(), "  padded  ");
    }

    #[test]
    fn test_busy_while_analyzing() {
        let mut machine = SubmissionMachine::new();
        machine.begin("first").unwrap();
        assert_eq!(machine.begin("second"), Err(ReflectionError::Busy));
        assert_eq!(machine.status(), SubmissionStatus::Analyzing);
        assert!(machine.error().is_none());
    }

    #[test]
    fn test_success_sets_result_and_history() {
        let mut machine = SubmissionMachine::new();
        succeed(&mut machine, "I feel great today", "Happy", 0.92);

        assert_eq!(machine.status(), SubmissionStatus::Idle);
        assert_eq!(machine.result(), Some(&ClassificationResult::new("Happy", 0.92)));
        assert_eq!(machine.history(), &[ClassificationResult::new("Happy", 0.92)]);
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut machine = SubmissionMachine::new();
        succeed(&mut machine, "ok", "Neutral", 0.7);
        succeed(&mut machine, "bad day", "Sad", 0.88);
        succeed(&mut machine, "so mad", "Angry", 0.86);

        let emotions: Vec<&str> = machine.history().iter().map(|r| r.emotion.as_str()).collect();
        assert_eq!(emotions, vec!["Angry", "Sad", "Neutral"]);
        assert_eq!(machine.result(), Some(&machine.history()[0]));
    }

    #[test]
    fn test_failure_keeps_history_and_clears_result() {
        let mut machine = SubmissionMachine::new();
        succeed(&mut machine, "ok", "Neutral", 0.7);

        machine.begin("again").unwrap();
        let settled = machine.settle(Err(ClassifyError::Status { status: 500 }));
        assert_eq!(settled, Err(ReflectionError::ClassificationUnavailable));
        assert_eq!(machine.status(), SubmissionStatus::Error);
        assert_eq!(
            machine.error_message(),
            Some("Something went wrong. Please try again.")
        );
        assert!(machine.result().is_none());
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut machine = SubmissionMachine::new();
        machine.begin("x").unwrap();
        let _ = machine.settle(Err(ClassifyError::Network("refused".to_string())));
        assert_eq!(machine.status(), SubmissionStatus::Error);

        succeed(&mut machine, "y", "Happy", 0.92);
        assert_eq!(machine.status(), SubmissionStatus::Idle);
        assert!(machine.error().is_none());
    }
}
