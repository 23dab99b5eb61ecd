use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI features are disabled")]
    Disabled,
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM returned no content")]
    EmptyResponse,
}

impl AiError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Disabled | Self::EmptyResponse => false,
        }
    }
}

/// A file handed to the summarizer.
#[derive(Debug, Clone, Copy)]
pub struct FileInput<'a> {
    pub data: &'a [u8],
    pub file_name: &'a str,
    pub mime_type: &'a str,
}

/// Language-model capability used on the send path. Implementations are
/// black boxes; callers treat every error as recoverable.
#[async_trait]
pub trait AiProvider: Send + Sync + std::fmt::Debug {
    /// Returns `text` with personally identifiable or otherwise sensitive
    /// information removed.
    ///
    /// # Errors
    /// Returns `AiError` if the model cannot be reached or answers with nothing.
    async fn redact(&self, text: &str) -> Result<String, AiError>;

    /// Returns a short, two-line description of the file for logs and search.
    ///
    /// # Errors
    /// Returns `AiError` if the model cannot be reached or answers with nothing.
    async fn summarize(&self, file: FileInput<'_>) -> Result<String, AiError>;
}
