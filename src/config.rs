use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub chat: ChatConfig,

    #[command(flatten)]
    pub ai: AiConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "LOCALCHAT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LOCALCHAT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "LOCALCHAT_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for in-flight requests during shutdown
    #[arg(long, env = "LOCALCHAT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 3000, mgmt_port: 9090, shutdown_timeout_secs: 5 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct StorageConfig {
    /// Directory holding one `<chat_id>/log.json` per conversation
    #[arg(long, env = "LOCALCHAT_LOGS_DIR", default_value = "chat_logs")]
    pub logs_dir: PathBuf,

    /// Directory uploaded files are written to, served under /uploads
    #[arg(long, env = "LOCALCHAT_UPLOADS_DIR", default_value = "public/uploads")]
    pub uploads_dir: PathBuf,

    /// Max uploaded file size in bytes (Default: 10MB)
    #[arg(long, env = "LOCALCHAT_MAX_FILE_SIZE_BYTES", default_value_t = 10_485_760)]
    pub max_file_size_bytes: usize,
}

impl StorageConfig {
    /// Multipart framing and the text fields ride on top of the file itself.
    pub const FORM_OVERHEAD_BYTES: usize = 5 * 1024 * 1024;

    #[must_use]
    pub const fn body_limit_bytes(&self) -> usize {
        self.max_file_size_bytes.saturating_add(Self::FORM_OVERHEAD_BYTES)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("chat_logs"),
            uploads_dir: PathBuf::from("public/uploads"),
            max_file_size_bytes: 10_485_760,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct ChatConfig {
    /// Name of the participant using this installation
    #[arg(long, env = "LOCALCHAT_LOCAL_USER", default_value = "You")]
    pub local_user: String,

    /// Name of the simulated counterpart
    #[arg(long, env = "LOCALCHAT_FRIEND", default_value = "Friend")]
    pub friend: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { local_user: "You".to_string(), friend: "Friend".to_string() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AiProviderKind {
    #[default]
    Disabled,
    Openai,
}

#[derive(Clone, Debug, Args)]
pub struct AiConfig {
    /// Which LLM backend to use for redaction and file summaries
    #[arg(long = "ai-provider", env = "LOCALCHAT_AI_PROVIDER", value_enum, default_value_t = AiProviderKind::Disabled)]
    pub provider: AiProviderKind,

    /// Base URL of an OpenAI-compatible API
    #[arg(long = "ai-base-url", env = "LOCALCHAT_AI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub base_url: String,

    /// API key sent as a bearer token
    #[arg(long = "ai-api-key", env = "LOCALCHAT_AI_API_KEY")]
    pub api_key: Option<String>,

    /// Model name passed to the completions endpoint
    #[arg(long = "ai-model", env = "LOCALCHAT_AI_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Per-request timeout for LLM calls
    #[arg(long = "ai-timeout-secs", env = "LOCALCHAT_AI_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retries for transient LLM failures (timeouts, 429, 5xx)
    #[arg(long = "ai-max-retries", env = "LOCALCHAT_AI_MAX_RETRIES", default_value_t = 2)]
    pub max_retries: usize,

    /// Store an LLM-redacted copy of every text message alongside the original
    #[arg(long, env = "LOCALCHAT_REDACT_TEXT", default_value_t = false)]
    pub redact_text: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProviderKind::Disabled,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            redact_text: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "LOCALCHAT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are only exported when set
    #[arg(long, env = "LOCALCHAT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
