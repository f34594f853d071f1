use thiserror::Error;

use crate::db_types::{MessagePayload, UserId};

/// Outbound message delivery. The engine treats this purely as "deliver or fail"; a failure must
/// never be fatal to session state.
#[allow(async_fn_in_trait)]
pub trait MessageSink: Clone {
    async fn send(&self, target: UserId, payload: &MessagePayload) -> Result<(), DeliveryError>;

    async fn send_text(&self, target: UserId, text: &str) -> Result<(), DeliveryError> {
        self.send(target, &MessagePayload::Text(text.to_string())).await
    }
}

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("The recipient {0} is unreachable (blocked the bot, or never started it)")]
    Unreachable(UserId),
    #[error("Transport error: {0}")]
    Transport(String),
}
