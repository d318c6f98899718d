// models/chatmodel.rs
use serde::{Deserialize, Serialize};

/// Points at a message that was already delivered, so it can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback_data: impl ToString) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.to_string(),
        }
    }
}

/// Inline keyboard, one inner vec per row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub inline_keyboard: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }

    #[cfg(test)]
    pub fn contains(&self, callback_data: &str) -> bool {
        self.inline_keyboard
            .iter()
            .flatten()
            .any(|b| b.callback_data == callback_data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Private,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ChatKind::Private)
    }
}
