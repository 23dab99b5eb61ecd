use crate::services::chat_service::ChatService;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::time::Duration;
use tokio::time::timeout;

const STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("localchat-server");
        Self {
            status: meter
                .i64_gauge("localchat_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    chat_service: ChatService,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(chat_service: ChatService) -> Self {
        Self { chat_service, metrics: Metrics::new() }
    }

    /// Checks that the log and upload directories are usable.
    ///
    /// # Errors
    /// Returns a string describing the failure if storage is unusable.
    pub async fn check_storage(&self) -> Result<(), String> {
        let result = match timeout(STORAGE_TIMEOUT, self.chat_service.check_storage()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("Storage check failed: {e}")),
            Err(_) => Err("Storage check timed out".to_string()),
        };

        self.metrics.status.record(i64::from(result.is_ok()), &[KeyValue::new("component", "storage")]);
        result
    }
}
