// telegram/updates.rs
use serde::Deserialize;

use crate::models::{
    chatmodel::{ChatKind, MessageRef},
    usermodel::Profile,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<ApiMessage>,
    pub callback_query: Option<ApiCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub message_id: i32,
    pub from: Option<ApiUser>,
    pub chat: ApiChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCallbackQuery {
    pub id: String,
    pub from: ApiUser,
    pub message: Option<ApiMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// `/name args`, with any `@botname` suffix removed from the name.
    /// `raw` is the message exactly as typed.
    Command {
        name: String,
        args: String,
        raw: String,
    },
    Text(String),
    Callback {
        id: String,
        data: String,
        message: Option<MessageRef>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: Profile,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub kind: InboundKind,
}

impl From<&ApiUser> for Profile {
    fn from(user: &ApiUser) -> Self {
        Profile {
            telegram_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Splits `/reply@SupportBot hello there` into `("reply", "hello there")`.
pub fn split_command(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_string()))
}

impl Update {
    /// Events without a human sender or without usable content are dropped.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            if query.from.is_bot {
                return None;
            }
            let data = query.data?;
            let message = query.message.as_ref().map(|m| MessageRef {
                chat_id: m.chat.id,
                message_id: m.message_id,
            });
            let (chat_id, chat_kind) = match &query.message {
                Some(m) => (m.chat.id, ChatKind::from_api(&m.chat.kind)),
                None => (query.from.id, ChatKind::Private),
            };
            return Some(InboundEvent {
                sender: Profile::from(&query.from),
                chat_id,
                chat_kind,
                kind: InboundKind::Callback {
                    id: query.id,
                    data,
                    message,
                },
            });
        }

        let message = self.message?;
        let from = message.from.as_ref().filter(|u| !u.is_bot)?;
        let text = message.text.clone()?;
        let kind = match split_command(&text) {
            Some((name, args)) => InboundKind::Command {
                name,
                args,
                raw: text,
            },
            None => InboundKind::Text(text),
        };
        Some(InboundEvent {
            sender: Profile::from(from),
            chat_id: message.chat.id,
            chat_kind: ChatKind::from_api(&message.chat.kind),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_command_strips_bot_name() {
        assert_eq!(
            split_command("/reply@SupportBot  hello\nthere "),
            Some(("reply".into(), "hello\nthere".into()))
        );
        assert_eq!(split_command("/MyTickets"), Some(("mytickets".into(), "".into())));
        assert_eq!(split_command("hello"), None);
        assert_eq!(split_command("/"), None);
    }

    #[test]
    fn group_command_becomes_event() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": { "id": 42, "is_bot": false, "first_name": "Ann", "username": "ann" },
                "chat": { "id": -1001, "type": "supergroup" },
                "text": "/ticket@SupportBot"
            }
        }))
        .unwrap();

        let event = update.into_event().unwrap();
        assert_eq!(event.sender.telegram_id, 42);
        assert_eq!(event.chat_id, -1001);
        assert_eq!(event.chat_kind, ChatKind::Supergroup);
        assert_eq!(
            event.kind,
            InboundKind::Command {
                name: "ticket".into(),
                args: String::new(),
                raw: "/ticket@SupportBot".into(),
            }
        );
    }

    #[test]
    fn callback_keeps_origin_message() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 11,
            "callback_query": {
                "id": "cb-1",
                "from": { "id": 7, "is_bot": false, "first_name": "Bo" },
                "message": {
                    "message_id": 99,
                    "chat": { "id": -200, "type": "channel" },
                    "text": "NEW TICKET"
                },
                "data": "claim:abc"
            }
        }))
        .unwrap();

        let event = update.into_event().unwrap();
        assert_eq!(
            event.kind,
            InboundKind::Callback {
                id: "cb-1".into(),
                data: "claim:abc".into(),
                message: Some(MessageRef { chat_id: -200, message_id: 99 }),
            }
        );
    }

    #[test]
    fn non_text_messages_are_ignored() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 12,
            "message": {
                "message_id": 1,
                "from": { "id": 1, "is_bot": false, "first_name": "Cy" },
                "chat": { "id": 1, "type": "private" }
            }
        }))
        .unwrap();
        assert!(update.into_event().is_none());
    }
}
