//! Data model shared by the input controller and the submission machine
//!
//! Everything here is plain data. Transitions live in `input`, `submission`
//! and `machine`; readers only ever see a cloned `ReflectionState`.

use serde::{Deserialize, Serialize};

/// Width (logical pixels) below which the layout is compact
pub const COMPACT_WIDTH_THRESHOLD: u32 = 600;

/// Outcome of a successful classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Category label, e.g. "Happy"
    pub emotion: String,
    /// Confidence as reported by the service, nominally in [0, 1]
    pub confidence: f64,
}

#[cfg(test)]
impl ClassificationResult {
    pub fn new(emotion: impl Into<String>, confidence: f64) -> Self {
        Self {
            emotion: emotion.into(),
            confidence,
        }
    }
}

/// Request lifecycle as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Nothing in flight, no error shown
    Idle,
    /// One request is in flight
    Analyzing,
    /// Last attempt failed and its message is still displayed
    Error,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Idle => write!(f, "Idle"),
            SubmissionStatus::Analyzing => write!(f, "Analyzing"),
            SubmissionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Dictation lifecycle, independent of submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictationStatus {
    Idle,
    Listening,
}

impl Default for DictationStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for DictationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictationStatus::Idle => write!(f, "Idle"),
            DictationStatus::Listening => write!(f, "Listening"),
        }
    }
}

/// Presentational width class, recomputed on every resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportClass {
    Compact,
    Wide,
}

impl ViewportClass {
    pub fn from_width(width: u32) -> Self {
        if width < COMPACT_WIDTH_THRESHOLD {
            Self::Compact
        } else {
            Self::Wide
        }
    }

    pub fn is_compact(self) -> bool {
        self == Self::Compact
    }
}

impl Default for ViewportClass {
    fn default() -> Self {
        Self::Wide
    }
}

/// Read-only snapshot of everything the presentation layer may show
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionState {
    /// Pending reflection text
    pub text: String,
    pub submission: SubmissionStatus,
    /// Message for the last failed attempt, if still displayed
    pub error: Option<String>,
    /// Currently displayed result
    pub result: Option<ClassificationResult>,
    /// Successful results, newest first
    pub history: Vec<ClassificationResult>,
    pub dictation: DictationStatus,
    /// Most recent blocking notice raised by dictation
    pub notice: Option<String>,
    pub viewport: ViewportClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_threshold() {
        assert_eq!(ViewportClass::from_width(0), ViewportClass::Compact);
        assert_eq!(ViewportClass::from_width(599), ViewportClass::Compact);
        assert_eq!(ViewportClass::from_width(600), ViewportClass::Wide);
        assert_eq!(ViewportClass::from_width(1440), ViewportClass::Wide);
    }

    #[test]
    fn test_result_deserialization_ignores_extra_fields() {
        let json = r#"{"emotion":"Happy","confidence":0.92,"model":"kw"}"#;
        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result, ClassificationResult::new("Happy", 0.92));
    }

    #[test]
    fn test_default_state() {
        let state = ReflectionState::default();
        assert!(state.text.is_empty());
        assert_eq!(state.submission, SubmissionStatus::Idle);
        assert_eq!(state.dictation, DictationStatus::Idle);
        assert_eq!(state.viewport, ViewportClass::Wide);
        assert!(state.history.is_empty());
    }
}
