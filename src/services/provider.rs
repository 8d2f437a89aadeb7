use crate::models::Question;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a [`ContentProvider`]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response was not in the expected format: {0}")]
    UnexpectedFormat(String),

    #[error("Response contained no audio data")]
    MissingAudio,
}

/// Source of quiz questions and the spoken welcome greeting.
///
/// Constructed once at startup and passed into each quiz session, so tests can
/// substitute a fake.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Generate an ordered list of questions for `subject`.
    ///
    /// Callers expect at least 30 items; the provider does not enforce it.
    async fn fetch_questions(&self, subject: &str) -> Result<Vec<Question>, ProviderError>;

    /// Synthesize a greeting for `student_name`.
    ///
    /// Returns base64 encoded 16-bit little-endian mono PCM at 24 kHz.
    async fn fetch_welcome_audio(&self, student_name: &str) -> Result<String, ProviderError>;
}
