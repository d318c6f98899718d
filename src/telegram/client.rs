// telegram/client.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::{
    transport::{ChatTransport, TransportError},
    updates::Update,
};
use crate::{
    config::Config,
    models::chatmodel::{Keyboard, MessageRef},
};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i32,
}

/// Bot API client. Each call is a single attempt; callers log failures.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!(
                "{}/bot{}",
                config.telegram_api_url.trim_end_matches('/'),
                config.bot_token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;

        let body: ApiResponse<T> = response.json().await?;

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let code = body.error_code.unwrap_or_default();
                let description = body
                    .description
                    .unwrap_or_else(|| format!("{} failed", method));
                if code == 403 {
                    if let Some(chat_id) = payload["chat_id"].as_i64() {
                        return Err(TransportError::Blocked(chat_id));
                    }
                }
                Err(TransportError::Api { code, description })
            }
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    /// Long-polls for the next batch of updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let payload = json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let timeout = Duration::from_secs(self.poll_timeout_secs + 10);
        self.call("getUpdates", payload, timeout).await
    }
}

fn with_keyboard(mut payload: serde_json::Value, keyboard: Option<&Keyboard>) -> serde_json::Value {
    if let Some(keyboard) = keyboard {
        payload["reply_markup"] = json!(keyboard);
    }
    payload
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let payload = with_keyboard(json!({ "chat_id": chat_id, "text": text }), keyboard);
        let sent: SentMessage = self
            .call("sendMessage", payload, self.request_timeout())
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: sent.message_id,
        })
    }

    async fn edit_message(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let payload = with_keyboard(
            json!({
                "chat_id": target.chat_id,
                "message_id": target.message_id,
                "text": text,
            }),
            keyboard,
        );
        // editMessageText answers with the edited message, or `true` for inline messages
        let _: serde_json::Value = self
            .call("editMessageText", payload, self.request_timeout())
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), TransportError> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self
            .call("answerCallbackQuery", payload, self.request_timeout())
            .await?;
        Ok(())
    }
}
