#![allow(dead_code)]
use localchat_server::api::{MgmtState, app_router, mgmt_router};
use localchat_server::config::Config;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub fn get_test_config(root: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.mgmt_port = 0;
    config.storage.logs_dir = root.path().join("chat_logs");
    config.storage.uploads_dir = root.path().join("uploads");
    config
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    // Dropped last; removes the chat logs and uploads.
    pub root: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns with the default test config after `tweak` has adjusted it.
    pub async fn spawn_with(tweak: impl FnOnce(&mut Config)) -> Self {
        localchat_server::telemetry::init_test_telemetry();

        let root = TempDir::new().unwrap();
        let mut config = get_test_config(&root);
        tweak(&mut config);

        let app = localchat_server::build(&config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        let router = app_router(config.clone(), app.chat_service);
        let mgmt = mgmt_router(MgmtState { health_service: app.health_service });

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            config,
            root,
        }
    }

    pub fn messages_url(&self, chat_id: &str) -> String {
        format!("{}/v1/chats/{chat_id}/messages", self.server_url)
    }

    pub fn log_url(&self, chat_id: &str) -> String {
        format!("{}/v1/chats/{chat_id}/log", self.server_url)
    }

    pub fn text_form(sender: &str, receiver: &str, message_id: &str, text: &str) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new()
            .text("sender", sender.to_string())
            .text("receiver", receiver.to_string())
            .text("messageId", message_id.to_string())
            .text("textMessage", text.to_string())
    }

    pub fn file_form(sender: &str, message_id: &str, name: &str, mime: &str, data: Vec<u8>) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(data).file_name(name.to_string()).mime_str(mime).unwrap();
        reqwest::multipart::Form::new()
            .text("sender", sender.to_string())
            .text("receiver", "Friend".to_string())
            .text("messageId", message_id.to_string())
            .part("file", part)
    }

    pub async fn post_text(&self, chat_id: &str, message_id: &str, text: &str) -> reqwest::Response {
        self.client
            .post(self.messages_url(chat_id))
            .multipart(Self::text_form("You", "Friend", message_id, text))
            .send()
            .await
            .unwrap()
    }
}
