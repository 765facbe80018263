//! Emotion classification collaborator
//!
//! The service is a black box: text goes in, an emotion label and a
//! confidence come out. Its answers are trusted as-is.

mod http;

use async_trait::async_trait;

use crate::state::ClassificationResult;

pub use http::HttpClassifier;

/// Why a classification request failed
///
/// Every variant is reported to the user as the same
/// "classification unavailable" message.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("connection failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("service returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError>;
}
