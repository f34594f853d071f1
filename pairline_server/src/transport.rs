use std::sync::Arc;

use log::*;
use pairline_engine::{
    db_types::{MessagePayload, UserId},
    DeliveryError,
    MessageSink,
};
use reqwest::Client;
use serde_json::json;

use crate::config::TransportConfig;

/// Outbound delivery through the Telegram bot API. One method call, one HTTP request; failures
/// are reported to the caller and never retried, because the engine treats delivery as
/// best-effort.
#[derive(Clone)]
pub struct TelegramTransport {
    config: TransportConfig,
    client: Arc<Client>,
}

impl TelegramTransport {
    pub fn new(config: TransportConfig) -> Result<Self, DeliveryError> {
        let client =
            Client::builder().timeout(config.timeout).build().map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_url, self.config.bot_token.reveal())
    }
}

impl MessageSink for TelegramTransport {
    async fn send(&self, target: UserId, payload: &MessagePayload) -> Result<(), DeliveryError> {
        let (method, body) = match payload {
            MessagePayload::Text(text) => ("sendMessage", json!({ "chat_id": target.value(), "text": text })),
            MessagePayload::Photo(file_ref) => ("sendPhoto", json!({ "chat_id": target.value(), "photo": file_ref })),
        };
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            // the classic "bot was blocked by the user"
            debug!("📨️ {target} is unreachable (HTTP 403)");
            return Err(DeliveryError::Unreachable(target));
        }
        if !status.is_success() {
            return Err(DeliveryError::Transport(format!("transport returned {status}")));
        }
        trace!("📨️ Delivered a {method} to {target}");
        Ok(())
    }
}
