//! User-facing error kinds
//!
//! Every kind is handled where it occurs and turned into a message for
//! display. None of them ends the session.

use serde::{Deserialize, Serialize};

/// Errors surfaced to the user by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionError {
    /// Submitted text was blank after trimming
    #[error("empty input")]
    EmptyInput,

    /// Classification service unreachable, errored or returned garbage
    #[error("classification unavailable")]
    ClassificationUnavailable,

    /// No speech capability in this runtime
    #[error("speech capability unsupported")]
    UnsupportedCapability,

    /// Speech capability reported an error mid-session
    #[error("dictation failure")]
    DictationFailure,

    /// A submission is already in flight
    #[error("submission already in flight")]
    Busy,
}

impl ReflectionError {
    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ReflectionError::EmptyInput => "Please enter your reflection.",
            ReflectionError::ClassificationUnavailable => {
                "Something went wrong. Please try again."
            }
            ReflectionError::UnsupportedCapability => {
                "Speech recognition is not supported on this system."
            }
            ReflectionError::DictationFailure => "Speech recognition error.",
            ReflectionError::Busy => "A reflection is already being analyzed.",
        }
    }

    /// Stable code used on the IPC surface
    pub fn code(&self) -> &'static str {
        match self {
            ReflectionError::EmptyInput => "empty_input",
            ReflectionError::ClassificationUnavailable => "classification_unavailable",
            ReflectionError::UnsupportedCapability => "unsupported_capability",
            ReflectionError::DictationFailure => "dictation_failure",
            ReflectionError::Busy => "busy",
        }
    }
}
