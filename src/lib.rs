#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use crate::adapters::storage::{JsonFileLogStore, LocalFileStore, LogStore};
use crate::config::Config;
use crate::services::ai::AiService;
use crate::services::chat_service::ChatService;
use crate::services::health_service::HealthService;
use std::sync::Arc;
use tokio::sync::watch;

pub mod adapters;
pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

/// Fully wired services, ready to be mounted on routers.
#[derive(Debug, Clone)]
pub struct App {
    pub chat_service: ChatService,
    pub health_service: HealthService,
}

/// Wires storage, the AI provider and services from configuration.
///
/// # Errors
/// Returns an error if the configured AI provider cannot be constructed.
pub fn build(config: &Config) -> anyhow::Result<App> {
    let provider = adapters::llm::from_config(&config.ai)?;
    let ai = AiService::new(provider, config.ai.redact_text);

    let logs: Arc<dyn LogStore> = Arc::new(JsonFileLogStore::new(&config.storage.logs_dir));
    let files = LocalFileStore::new(&config.storage.uploads_dir);

    let chat_service = ChatService::new(logs, files, ai, config.chat.clone(), &config.storage);
    let health_service = HealthService::new(chat_service.clone());

    tracing::info!(
        logs_dir = %config.storage.logs_dir.display(),
        uploads_dir = %config.storage.uploads_dir.display(),
        ai_provider = ?config.ai.provider,
        "Application wired"
    );

    Ok(App { chat_service, health_service })
}

/// Flips `shutdown_tx` to `true` on Ctrl-C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
