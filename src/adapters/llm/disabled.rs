use crate::services::ai::{AiError, AiProvider, FileInput};
use async_trait::async_trait;

/// Used when no LLM is configured; every call fails with [`AiError::Disabled`].
#[derive(Debug, Default)]
pub struct DisabledProvider;

#[async_trait]
impl AiProvider for DisabledProvider {
    async fn redact(&self, _text: &str) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }

    async fn summarize(&self, _file: FileInput<'_>) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }
}
