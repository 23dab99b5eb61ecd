use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

pub mod provider;

pub use provider::{AiError, AiProvider, FileInput};

/// Stored as `fileContext` when no summary could be produced.
pub const SUMMARY_UNAVAILABLE: &str = "File content summary not available.";

#[derive(Clone, Debug)]
struct Metrics {
    calls_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("localchat-server");
        Self {
            calls_total: meter
                .u64_counter("localchat_ai_calls_total")
                .with_description("LLM calls by operation and outcome")
                .build(),
        }
    }

    fn record(&self, operation: &'static str, ok: bool) {
        self.calls_total.add(
            1,
            &[KeyValue::new("operation", operation), KeyValue::new("status", if ok { "success" } else { "fallback" })],
        );
    }
}

/// Wraps an [`AiProvider`] so that failures degrade instead of propagating.
#[derive(Clone, Debug)]
pub struct AiService {
    provider: Arc<dyn AiProvider>,
    redact_text: bool,
    metrics: Metrics,
}

impl AiService {
    #[must_use]
    pub fn new(provider: Arc<dyn AiProvider>, redact_text: bool) -> Self {
        Self { provider, redact_text, metrics: Metrics::new() }
    }

    /// Redacted copy of `text`, or `None` when redaction is switched off or fails.
    pub async fn redact(&self, text: &str) -> Option<String> {
        if !self.redact_text {
            return None;
        }

        match self.provider.redact(text).await {
            Ok(redacted) => {
                self.metrics.record("redact", true);
                Some(redacted)
            }
            Err(e) => {
                self.metrics.record("redact", false);
                tracing::warn!(error = %e, "Redaction failed, logging without a redacted copy");
                None
            }
        }
    }

    /// Summary of the file, or [`SUMMARY_UNAVAILABLE`] if the provider fails.
    pub async fn summarize(&self, file: FileInput<'_>) -> String {
        match self.provider.summarize(file).await {
            Ok(summary) => {
                self.metrics.record("summarize", true);
                summary
            }
            Err(AiError::Disabled) => SUMMARY_UNAVAILABLE.to_string(),
            Err(e) => {
                self.metrics.record("summarize", false);
                tracing::warn!(error = %e, file_name = %file.file_name, "AI summarization failed");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
