// models/usermodel.rs
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::conversationmodel::TicketFlow;

/// Advisory only. Authorization checks look at `is_staff`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Support,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::User => "user",
            UserRole::Support => "support",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub role: UserRole,
    pub ticket_flow: Json<TicketFlow>,
    /// Ticket a staff member is currently replying to.
    pub active_ticket_ref: Option<Uuid>,
    /// The end user's own open ticket.
    pub active_ticket: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    pub fn new(telegram_id: i64, username: Option<String>, role: UserRole, is_staff: bool) -> Self {
        let now = Utc::now();
        Self {
            telegram_id,
            username,
            first_name: None,
            last_name: None,
            is_staff,
            role,
            ticket_flow: Json(TicketFlow::Idle),
            active_ticket_ref: None,
            active_ticket: None,
            created_at: now,
            last_active: now,
        }
    }

    pub fn flow(&self) -> &TicketFlow {
        &self.ticket_flow.0
    }

    /// Sender label when acting as a ticket owner.
    pub fn display_key(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| format!("user_{}", self.telegram_id))
    }

    /// `@handle` when there is one, the bare id otherwise.
    pub fn mention(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.telegram_id.to_string(),
        }
    }
}

/// Profile fields the transport knows about the sender of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_key_falls_back_to_id() {
        let anon = User::new(55, None, UserRole::User, false);
        assert_eq!(anon.display_key(), "user_55");
        assert_eq!(anon.mention(), "55");

        let named = User::new(55, Some("dave".into()), UserRole::User, false);
        assert_eq!(named.display_key(), "dave");
        assert_eq!(named.mention(), "@dave");
    }
}
