//! State module for the reflection core
//!
//! Two components share one owner:
//! - InputController: reflection text and dictation (Idle, Listening)
//! - SubmissionMachine: request lifecycle (Idle, Analyzing, Error),
//!   displayed result and history
//!
//! `StateMachine` drives both from commands and collaborator completions.

mod error;
mod input;
mod machine;
mod model;
mod submission;

pub use error::ReflectionError;
pub use machine::{Command, StateMachine};
pub use model::{
    ClassificationResult, DictationStatus, ReflectionState, SubmissionStatus, ViewportClass,
};
