use crate::config::{AiConfig, AiProviderKind};
use crate::services::ai::{AiError, AiProvider};
use std::sync::Arc;

pub mod disabled;
pub mod openai;

pub use disabled::DisabledProvider;
pub use openai::OpenAiProvider;

/// Builds the provider selected in configuration.
///
/// # Errors
/// Returns `AiError` if the selected provider cannot be initialized.
pub fn from_config(config: &AiConfig) -> Result<Arc<dyn AiProvider>, AiError> {
    match config.provider {
        AiProviderKind::Disabled => Ok(Arc::new(DisabledProvider)),
        AiProviderKind::Openai => Ok(Arc::new(OpenAiProvider::new(config)?)),
    }
}
