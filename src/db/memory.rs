// db/memory.rs
//! In-process store used by the service and router tests.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Error};
use uuid::Uuid;

use super::{ticketdb::TicketExt, userdb::UserExt};
use crate::models::{
    chatmodel::MessageRef,
    conversationmodel::TicketFlow,
    ticketmodel::{NewTicket, Ticket, TicketMessage, TicketPriority, TicketStatus},
    usermodel::{Profile, User, UserRole},
};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    tickets: HashMap<Uuid, Ticket>,
    next_seq: i64,
    fail_notification_refs: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.tables.lock().unwrap().users.insert(user.telegram_id, user);
    }

    pub fn user(&self, telegram_id: i64) -> Option<User> {
        self.tables.lock().unwrap().users.get(&telegram_id).cloned()
    }

    pub fn ticket(&self, ticket_id: Uuid) -> Option<Ticket> {
        self.tables.lock().unwrap().tickets.get(&ticket_id).cloned()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.tables.lock().unwrap().tickets.values().cloned().collect()
    }

    /// Makes every later `set_notification_ref` fail as if the pool timed out.
    pub fn fail_notification_refs(&self) {
        self.tables.lock().unwrap().fail_notification_refs = true;
    }

    fn update_user(&self, telegram_id: i64, apply: impl FnOnce(&mut User)) {
        if let Some(user) = self.tables.lock().unwrap().users.get_mut(&telegram_id) {
            apply(user);
        }
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, Error> {
        Ok(self.user(telegram_id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_or_create_user(&self, profile: &Profile) -> Result<User, Error> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables.users.entry(profile.telegram_id).or_insert_with(|| {
            let mut user = User::new(profile.telegram_id, profile.username.clone(), UserRole::User, false);
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            user
        });
        user.last_active = Utc::now();
        Ok(user.clone())
    }

    async fn save_user(&self, user: &User) -> Result<User, Error> {
        self.insert_user(user.clone());
        Ok(user.clone())
    }

    async fn set_ticket_flow(&self, telegram_id: i64, flow: &TicketFlow) -> Result<(), Error> {
        self.update_user(telegram_id, |u| u.ticket_flow = Json(flow.clone()));
        Ok(())
    }

    async fn set_active_ticket(&self, telegram_id: i64, ticket_id: Option<Uuid>) -> Result<(), Error> {
        self.update_user(telegram_id, |u| u.active_ticket = ticket_id);
        Ok(())
    }

    async fn clear_active_ticket_if(&self, telegram_id: i64, ticket_id: Uuid) -> Result<bool, Error> {
        let mut tables = self.tables.lock().unwrap();
        match tables.users.get_mut(&telegram_id) {
            Some(user) if user.active_ticket == Some(ticket_id) => {
                user.active_ticket = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_active_ticket_ref(&self, telegram_id: i64, ticket_id: Option<Uuid>) -> Result<(), Error> {
        self.update_user(telegram_id, |u| u.active_ticket_ref = ticket_id);
        Ok(())
    }
}

#[async_trait]
impl TicketExt for MemoryStore {
    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut messages = Vec::new();
        for (sender, text) in new_ticket.initial_messages() {
            tables.next_seq += 1;
            messages.push(TicketMessage {
                seq: tables.next_seq,
                ticket_id: id,
                sender,
                text,
                sent_at: now,
            });
        }
        let ticket = Ticket {
            id,
            label: new_ticket.label,
            owner_id: new_ticket.owner_id,
            owner_name: new_ticket.owner_name,
            category: new_ticket.category,
            description: new_ticket.description,
            status: TicketStatus::Open,
            priority: TicketPriority::default(),
            assignee_id: None,
            assignee_key: None,
            notification_chat_id: None,
            notification_message_id: None,
            created_at: now,
            updated_at: now,
            messages,
        };
        tables.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        Ok(self.ticket(ticket_id))
    }

    async fn claim_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: i64,
        assignee_key: &str,
    ) -> Result<Option<Ticket>, Error> {
        let mut tables = self.tables.lock().unwrap();
        match tables.tickets.get_mut(&ticket_id) {
            Some(ticket) if !ticket.is_assigned() && ticket.status == TicketStatus::Open => {
                ticket.assignee_id = Some(assignee_id);
                ticket.assignee_key = Some(assignee_key.to_string());
                ticket.status = TicketStatus::InProgress;
                ticket.updated_at = Utc::now();
                Ok(Some(ticket.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn append_message(&self, ticket_id: Uuid, sender: &str, text: &str) -> Result<TicketMessage, Error> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_seq += 1;
        let seq = tables.next_seq;
        let ticket = tables.tickets.get_mut(&ticket_id).ok_or(Error::RowNotFound)?;
        let message = TicketMessage {
            seq,
            ticket_id,
            sender: sender.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        ticket.messages.push(message.clone());
        ticket.updated_at = message.sent_at;
        Ok(message)
    }

    async fn finish_ticket(&self, ticket_id: Uuid, status: TicketStatus) -> Result<Option<Ticket>, Error> {
        let mut tables = self.tables.lock().unwrap();
        match tables.tickets.get_mut(&ticket_id) {
            Some(ticket) if !ticket.status.is_terminal() => {
                ticket.status = status;
                ticket.updated_at = Utc::now();
                Ok(Some(ticket.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_notification_ref(&self, ticket_id: Uuid, notification: MessageRef) -> Result<(), Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.fail_notification_refs {
            return Err(Error::PoolTimedOut);
        }
        if let Some(ticket) = tables.tickets.get_mut(&ticket_id) {
            ticket.notification_chat_id = Some(notification.chat_id);
            ticket.notification_message_id = Some(notification.message_id);
        }
        Ok(())
    }

    async fn get_assigned_tickets(&self, assignee_id: i64, assignee_key: &str) -> Result<Vec<Ticket>, Error> {
        let tables = self.tables.lock().unwrap();
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| !t.status.is_terminal())
            .filter(|t| match t.assignee_id {
                Some(id) => id == assignee_id,
                None => t.assignee_key.as_deref() == Some(assignee_key),
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }
}
