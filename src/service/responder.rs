// service/responder.rs
use std::sync::Arc;

use crate::{
    models::chatmodel::{Keyboard, MessageRef},
    service::error::ServiceError,
    telegram::transport::ChatTransport,
};

/// Talks back to the chat an event came from. When the event was a button
/// press, `origin` is the message carrying the button.
#[derive(Clone)]
pub struct Responder {
    transport: Arc<dyn ChatTransport>,
    chat_id: i64,
    origin: Option<MessageRef>,
}

impl Responder {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: i64, origin: Option<MessageRef>) -> Self {
        Self {
            transport,
            chat_id,
            origin,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Result<MessageRef, ServiceError> {
        Ok(self.transport.send_message(self.chat_id, text, keyboard).await?)
    }

    /// Replaces the origin message in place, or sends a new one when there is
    /// nothing to edit or the edit is refused.
    pub async fn show(&self, text: &str, keyboard: Option<&Keyboard>) -> Result<(), ServiceError> {
        if let Some(target) = self.origin {
            match self.transport.edit_message(target, text, keyboard).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!(
                    "Could not edit message {} in chat {}: {}",
                    target.message_id,
                    target.chat_id,
                    e
                ),
            }
        }
        self.send(text, keyboard).await.map(|_| ())
    }
}
