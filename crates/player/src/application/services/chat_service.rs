//! Chat Service - one `POST /api/chat` exchange

use std::sync::Arc;

use serde_json::Value;

use levelup_shared::{ChatReply, ChatRequest};

use crate::ports::outbound::{ApiError, RawApiPort};

const CHAT_PATH: &str = "/api/chat";

#[derive(Clone)]
pub struct ChatService {
    api: Arc<dyn RawApiPort>,
}

impl ChatService {
    pub fn new(api: Arc<dyn RawApiPort>) -> Self {
        Self { api }
    }

    /// Send one exchange. A body flagged `error: true` is a failure even when
    /// the status was a success.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Shape(e.to_string()))?;
        let value = self.api.post_json(CHAT_PATH, &body).await?;

        if value.get("error").and_then(Value::as_bool) == Some(true) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("the exchange was not accepted")
                .to_string();
            return Err(ApiError::Rejected(message));
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::Shape(format!("Invalid chat response: {e}")))
    }
}
