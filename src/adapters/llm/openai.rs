use crate::config::AiConfig;
use crate::services::ai::{AiError, AiProvider, FileInput};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

const REDACT_PROMPT: &str = "You remove personally identifiable information and other sensitive data \
(names, phone numbers, email and postal addresses, account numbers, credentials) from chat messages \
before they are written to a log. Replace each sensitive span with [REDACTED] and answer with the \
resulting message only.";

const SUMMARIZE_PROMPT: &str = "You describe files for a chat log. Answer with a concise summary or \
context of the file content in at most two lines, with no preamble.";

/// Text files longer than this are truncated before being inlined in the prompt.
const MAX_INLINE_TEXT_CHARS: usize = 20_000;

/// Client for any service speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    retry: ExponentialBuilder,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Builds the provider from configuration.
    ///
    /// # Errors
    /// Returns `AiError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        let retry = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(config.max_retries);

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            retry,
        })
    }

    async fn complete_once(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)
    }

    #[tracing::instrument(err(level = "debug"), skip(self, messages), fields(model = %self.model))]
    async fn complete(&self, messages: Vec<Value>) -> Result<String, AiError> {
        let request = CompletionRequest { model: &self.model, messages };

        (|| async { self.complete_once(&request).await })
            .retry(self.retry)
            .when(AiError::is_transient)
            .notify(|err: &AiError, delay: Duration| {
                tracing::debug!(error = %err, delay_ms = %delay.as_millis(), "Retrying LLM request");
            })
            .await
    }
}

/// The user turn describing a file: inlined text for text files, a data URI
/// otherwise.
fn file_message(file: FileInput<'_>) -> Value {
    let header = format!("File Name: {}", file.file_name);

    if file.mime_type.starts_with("text/") || file.mime_type == "application/json" {
        let text = String::from_utf8_lossy(file.data);
        let inline: String = text.chars().take(MAX_INLINE_TEXT_CHARS).collect();
        return json!({ "role": "user", "content": format!("{header}\nFile Content:\n{inline}") });
    }

    let data_uri = format!("data:{};base64,{}", file.mime_type, STANDARD.encode(file.data));
    let attachment = if file.mime_type.starts_with("image/") {
        json!({ "type": "image_url", "image_url": { "url": data_uri } })
    } else {
        json!({ "type": "file", "file": { "filename": file.file_name, "file_data": data_uri } })
    };

    json!({
        "role": "user",
        "content": [{ "type": "text", "text": header }, attachment],
    })
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn redact(&self, text: &str) -> Result<String, AiError> {
        self.complete(vec![
            json!({ "role": "system", "content": REDACT_PROMPT }),
            json!({ "role": "user", "content": text }),
        ])
        .await
    }

    async fn summarize(&self, file: FileInput<'_>) -> Result<String, AiError> {
        self.complete(vec![json!({ "role": "system", "content": SUMMARIZE_PROMPT }), file_message(file)]).await
    }
}
