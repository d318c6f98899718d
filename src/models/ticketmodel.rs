// models/ticketmodel.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::{chatmodel::MessageRef, usermodel::User};

pub const SYSTEM_SENDER: &str = "system";
pub const SKIPPED_TRANSACTION_REF: &str = "N/A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn to_str(&self) -> &str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_category", rename_all = "snake_case")]
pub enum TicketCategory {
    General,
    Technical,
    #[serde(rename = "Bridging/IBC")]
    BridgingIbc,
    Staking,
    #[serde(rename = "Viewing Keys")]
    ViewingKeys,
    Other,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 6] = [
        TicketCategory::General,
        TicketCategory::Technical,
        TicketCategory::BridgingIbc,
        TicketCategory::Staking,
        TicketCategory::ViewingKeys,
        TicketCategory::Other,
    ];

    /// Offered on the creation keyboard. Technical stays a valid category but
    /// is not offered here.
    pub const SELECTABLE: [TicketCategory; 5] = [
        TicketCategory::General,
        TicketCategory::BridgingIbc,
        TicketCategory::Staking,
        TicketCategory::ViewingKeys,
        TicketCategory::Other,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketCategory::General => "General",
            TicketCategory::Technical => "Technical",
            TicketCategory::BridgingIbc => "Bridging/IBC",
            TicketCategory::Staking => "Staking",
            TicketCategory::ViewingKeys => "Viewing Keys",
            TicketCategory::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.to_str() == label)
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// How a staff member is named on a ticket: their stored handle, or
/// `agent_<id>` when they have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentKey {
    Username(String),
    Derived(i64),
}

impl AssignmentKey {
    pub fn for_agent(agent: &User) -> Self {
        match &agent.username {
            Some(username) => AssignmentKey::Username(username.clone()),
            None => AssignmentKey::Derived(agent.telegram_id),
        }
    }

    pub fn parse(key: &str) -> Self {
        key.strip_prefix("agent_")
            .and_then(|id| id.parse::<i64>().ok())
            .map(AssignmentKey::Derived)
            .unwrap_or_else(|| AssignmentKey::Username(key.to_string()))
    }

    pub fn matches(&self, user: &User) -> bool {
        match self {
            AssignmentKey::Derived(id) => *id == user.telegram_id,
            AssignmentKey::Username(name) => user.username.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for AssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentKey::Username(name) => f.write_str(name),
            AssignmentKey::Derived(id) => write!(f, "agent_{}", id),
        }
    }
}

/// Structured assignment, resolved once at claim time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignee {
    pub telegram_id: Option<i64>,
    pub key: AssignmentKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketMessage {
    pub seq: i64,
    pub ticket_id: Uuid,
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub label: String,
    pub owner_id: i64,
    pub owner_name: String,
    pub category: TicketCategory,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assignee_id: Option<i64>,
    pub assignee_key: Option<String>,
    pub notification_chat_id: Option<i64>,
    pub notification_message_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub messages: Vec<TicketMessage>,
}

impl Ticket {
    pub fn assignee(&self) -> Option<Assignee> {
        let key = match (&self.assignee_key, self.assignee_id) {
            (Some(key), _) => AssignmentKey::parse(key),
            (None, Some(id)) => AssignmentKey::Derived(id),
            (None, None) => return None,
        };
        Some(Assignee {
            telegram_id: self.assignee_id,
            key,
        })
    }

    pub fn is_assigned(&self) -> bool {
        self.assignee_id.is_some() || self.assignee_key.is_some()
    }

    pub fn is_assigned_to(&self, agent: &User) -> bool {
        match self.assignee() {
            Some(Assignee { telegram_id: Some(id), .. }) => id == agent.telegram_id,
            Some(Assignee { key, .. }) => key.matches(agent),
            None => false,
        }
    }

    pub fn notification_ref(&self) -> Option<MessageRef> {
        match (self.notification_chat_id, self.notification_message_id) {
            (Some(chat_id), Some(message_id)) => Some(MessageRef { chat_id, message_id }),
            _ => None,
        }
    }
}

/// Everything needed to materialize a ticket from a confirmed draft.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub label: String,
    pub owner_id: i64,
    pub owner_name: String,
    pub category: TicketCategory,
    pub description: String,
    pub transaction_ref: Option<String>,
}

impl NewTicket {
    /// Transcript seed: the description, then the transaction references if any.
    pub fn initial_messages(&self) -> Vec<(String, String)> {
        let mut seed = vec![(self.owner_name.clone(), self.description.clone())];
        if let Some(refs) = &self.transaction_ref {
            seed.push((self.owner_name.clone(), format!("TX Hash(es): {}", refs)));
        }
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usermodel::UserRole;

    fn agent(id: i64, username: Option<&str>) -> User {
        User::new(id, username.map(str::to_string), UserRole::Support, true)
    }

    #[test]
    fn assignment_key_round_trips_both_forms() {
        assert_eq!(AssignmentKey::parse("agent_42"), AssignmentKey::Derived(42));
        assert_eq!(
            AssignmentKey::parse("agent_smith"),
            AssignmentKey::Username("agent_smith".into())
        );
        assert_eq!(AssignmentKey::Derived(42).to_string(), "agent_42");
        assert_eq!(AssignmentKey::for_agent(&agent(7, None)), AssignmentKey::Derived(7));
        assert_eq!(
            AssignmentKey::for_agent(&agent(7, Some("carol"))),
            AssignmentKey::Username("carol".into())
        );
    }

    #[test]
    fn legacy_key_without_id_still_resolves() {
        let now = Utc::now();
        let mut ticket = Ticket {
            id: Uuid::new_v4(),
            label: "TKT-1-0001".into(),
            owner_id: 1,
            owner_name: "user_1".into(),
            category: TicketCategory::General,
            description: "help".into(),
            status: TicketStatus::InProgress,
            priority: TicketPriority::Medium,
            assignee_id: None,
            assignee_key: Some("agent_9".into()),
            notification_chat_id: None,
            notification_message_id: None,
            created_at: now,
            updated_at: now,
            messages: vec![],
        };
        assert!(ticket.is_assigned_to(&agent(9, Some("renamed"))));
        assert!(!ticket.is_assigned_to(&agent(10, None)));

        ticket.assignee_key = Some("carol".into());
        assert!(ticket.is_assigned_to(&agent(3, Some("carol"))));
    }

    #[test]
    fn category_labels() {
        assert_eq!(TicketCategory::from_label("Bridging/IBC"), Some(TicketCategory::BridgingIbc));
        assert_eq!(TicketCategory::from_label("Technical"), Some(TicketCategory::Technical));
        assert_eq!(TicketCategory::from_label("Billing"), None);
        assert!(!TicketCategory::SELECTABLE.contains(&TicketCategory::Technical));
    }
}
