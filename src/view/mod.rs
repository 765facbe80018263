//! Presentation projection of the reflection state
//!
//! Pure functions from `ReflectionState` to what a front end draws. Nothing
//! here mutates the core.

use serde::{Deserialize, Serialize};

use crate::state::{
    ClassificationResult, DictationStatus, ReflectionState, SubmissionStatus, ViewportClass,
};

/// Card background when the emotion has no entry in the map
pub const DEFAULT_CARD_COLOR: &str = "#f8f9fa";

/// Background color for a result card
pub fn emotion_color(emotion: &str) -> &'static str {
    match emotion {
        "Happy" => "#d4edda",
        "Sad" => "#d1ecf1",
        "Anxious" => "#fff3cd",
        "Angry" => "#f8d7da",
        "Neutral" => "#f5f5f5",
        _ => DEFAULT_CARD_COLOR,
    }
}

/// Confidence rendered as a whole percentage, e.g. 0.92 -> "92%"
///
/// Halves round up: 0.125 -> "13%".
pub fn confidence_percent(confidence: f64) -> String {
    format!("{}%", (confidence * 100.0).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Column,
    Row,
}

/// One rendered classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCard {
    pub emotion: String,
    pub confidence: String,
    pub color: String,
}

impl From<&ClassificationResult> for ResultCard {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            emotion: result.emotion.clone(),
            confidence: confidence_percent(result.confidence),
            color: emotion_color(&result.emotion).to_string(),
        }
    }
}

/// Everything a front end needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub text: String,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub mic_label: String,
    pub listening: bool,
    pub layout: Layout,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub current: Option<ResultCard>,
    /// History minus the current result; empty unless history has 2+ entries
    pub previous: Vec<ResultCard>,
}

impl ViewModel {
    pub fn from_state(state: &ReflectionState) -> Self {
        let analyzing = state.submission == SubmissionStatus::Analyzing;
        let listening = state.dictation == DictationStatus::Listening;

        let previous = if state.history.len() > 1 {
            state.history[1..].iter().map(ResultCard::from).collect()
        } else {
            Vec::new()
        };

        Self {
            text: state.text.clone(),
            submit_label: if analyzing { "Analyzing..." } else { "Submit" }.to_string(),
            submit_enabled: !analyzing,
            mic_label: if listening { "Listening..." } else { "Speak" }.to_string(),
            listening,
            layout: layout_for(state.viewport),
            error: state.error.clone(),
            notice: state.notice.clone(),
            current: state.result.as_ref().map(ResultCard::from),
            previous,
        }
    }
}

fn layout_for(viewport: ViewportClass) -> Layout {
    if viewport.is_compact() {
        Layout::Column
    } else {
        Layout::Row
    }
}
