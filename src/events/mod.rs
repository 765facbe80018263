//! Events module for state machine transitions
//!
//! Every change the core makes to its state is announced as a
//! `StateEvent` so subscribed presentation layers can redraw.

use serde::{Deserialize, Serialize};

use crate::state::{ReflectionError, ViewportClass};

/// Events emitted by the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Reflection text replaced (typing, dictation, or cleared on settle)
    TextChanged { text: String },

    /// A submission entered Analyzing
    SubmissionStarted,

    /// Classification succeeded and was prepended to history
    SubmissionSucceeded { emotion: String, confidence: f64 },

    /// Submission attempt failed (local validation or service)
    SubmissionFailed {
        kind: ReflectionError,
        message: String,
    },

    /// Dictation session started listening
    DictationStarted,

    /// Dictation session reached its end signal
    DictationEnded,

    /// Blocking notice for the user (dictation problems)
    Notice {
        kind: ReflectionError,
        message: String,
    },

    /// Viewport class changed after a resize
    ViewportChanged { viewport: ViewportClass },
}

impl StateEvent {
    pub fn submission_failed(kind: ReflectionError) -> Self {
        StateEvent::SubmissionFailed {
            kind,
            message: kind.user_message().to_string(),
        }
    }

    pub fn notice(kind: ReflectionError) -> Self {
        StateEvent::Notice {
            kind,
            message: kind.user_message().to_string(),
        }
    }
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::TextChanged { text } => {
                write!(f, "TEXT_CHANGED ({} chars)", text.chars().count())
            }
            StateEvent::SubmissionStarted => write!(f, "SUBMISSION_STARTED"),
            StateEvent::SubmissionSucceeded { emotion, confidence } => {
                write!(f, "SUBMISSION_SUCCEEDED ({} {:.2})", emotion, confidence)
            }
            StateEvent::SubmissionFailed { kind, .. } => {
                write!(f, "SUBMISSION_FAILED ({})", kind.code())
            }
            StateEvent::DictationStarted => write!(f, "DICTATION_STARTED"),
            StateEvent::DictationEnded => write!(f, "DICTATION_ENDED"),
            StateEvent::Notice { kind, .. } => write!(f, "NOTICE ({})", kind.code()),
            StateEvent::ViewportChanged { viewport } => {
                write!(f, "VIEWPORT_CHANGED ({:?})", viewport)
            }
        }
    }
}
