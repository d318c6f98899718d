// service/ticket_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::Store,
    dtos::ticketdtos::StaffReplyDto,
    error::ErrorMessage,
    models::{
        chatmodel::{Keyboard, MessageRef},
        conversationmodel::TransactionRef,
        ticketmodel::{
            AssignmentKey, NewTicket, Ticket, TicketCategory, TicketStatus, SYSTEM_SENDER,
        },
        usermodel::User,
    },
    service::error::ServiceError,
    telegram::{templates, transport::ChatTransport},
    utils::ticket_label::generate_ticket_label,
};

/// Ticket lifecycle: create, claim, reply, follow-up, resolve and close.
/// Every staff-gated call re-reads the caller from the store.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn Store>,
    transport: Arc<dyn ChatTransport>,
    support_channel_id: Option<i64>,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn ChatTransport>,
        support_channel_id: Option<i64>,
    ) -> Self {
        Self {
            store,
            transport,
            support_channel_id,
        }
    }

    pub async fn require_staff(&self, telegram_id: i64) -> Result<User, ServiceError> {
        let user = self
            .store
            .get_user(telegram_id)
            .await?
            .ok_or(ServiceError::UserNotFound(telegram_id))?;

        if !user.is_staff {
            return Err(ServiceError::Unauthorized(telegram_id));
        }
        Ok(user)
    }

    async fn load_ticket(&self, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        self.store
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))
    }

    /// Ticket must be live and held by `agent`.
    fn ensure_assigned(ticket: &Ticket, agent: &User) -> Result<(), ServiceError> {
        if ticket.status.is_terminal() {
            return Err(ServiceError::TicketClosed(ticket.id));
        }
        if !ticket.is_assigned_to(agent) {
            return Err(ServiceError::NotAssigned {
                ticket_id: ticket.id,
                user_id: agent.telegram_id,
            });
        }
        Ok(())
    }

    /// Chat id of the assigned agent. Tickets claimed before ids were stored
    /// only carry the key, so a username key is looked up.
    async fn assignee_chat(&self, ticket: &Ticket) -> Result<Option<i64>, ServiceError> {
        let Some(assignee) = ticket.assignee() else {
            return Ok(None);
        };
        if let Some(id) = assignee.telegram_id {
            return Ok(Some(id));
        }
        match assignee.key {
            AssignmentKey::Derived(id) => Ok(Some(id)),
            AssignmentKey::Username(name) => Ok(self
                .store
                .get_user_by_username(&name)
                .await?
                .map(|u| u.telegram_id)),
        }
    }

    async fn deliver(&self, chat_id: i64, text: &str, ticket_id: Uuid) {
        if let Err(e) = self.transport.send_message(chat_id, text, None).await {
            tracing::error!(
                "Failed to deliver message for ticket {} to {}: {}",
                ticket_id,
                chat_id,
                e
            );
        }
    }

    /// Edits the stored staff-channel message. Best effort.
    async fn update_notification(&self, ticket: &Ticket, text: &str, keyboard: Option<&Keyboard>) {
        let Some(target) = ticket.notification_ref() else {
            return;
        };
        if let Err(e) = self.transport.edit_message(target, text, keyboard).await {
            tracing::warn!(
                "Failed to update staff notification for ticket {}: {}",
                ticket.id,
                e
            );
        }
    }

    pub async fn create(
        &self,
        owner: &User,
        category: TicketCategory,
        description: &str,
        transaction_ref: &TransactionRef,
    ) -> Result<Ticket, ServiceError> {
        let new_ticket = NewTicket {
            label: generate_ticket_label(Utc::now()),
            owner_id: owner.telegram_id,
            owner_name: owner.display_key(),
            category,
            description: description.to_string(),
            transaction_ref: transaction_ref.provided().map(str::to_string),
        };

        let mut ticket = self.store.create_ticket(new_ticket).await?;

        // The ticket is committed from here on, so later failures are logged
        // and the ticket is still returned.
        if let Err(e) = self
            .store
            .set_active_ticket(owner.telegram_id, Some(ticket.id))
            .await
        {
            tracing::error!(
                "Failed to link ticket {} to owner {}: {}",
                ticket.id,
                owner.telegram_id,
                e
            );
        }

        tracing::info!(
            "Ticket {} ({}) created by {}",
            ticket.id,
            ticket.label,
            owner.telegram_id
        );

        if let Some(channel_id) = self.support_channel_id {
            let (text, keyboard) = templates::new_ticket_notification(&ticket, owner);
            match self.transport.send_message(channel_id, &text, Some(&keyboard)).await {
                Ok(notification) => match self.store.set_notification_ref(ticket.id, notification).await {
                    Ok(()) => {
                        ticket.notification_chat_id = Some(notification.chat_id);
                        ticket.notification_message_id = Some(notification.message_id);
                    }
                    Err(e) => tracing::error!(
                        "Failed to store staff notification for ticket {}: {}",
                        ticket.id,
                        e
                    ),
                },
                Err(e) => tracing::error!(
                    "Failed to notify support channel about ticket {}: {}",
                    ticket.id,
                    e
                ),
            }
        }

        Ok(ticket)
    }

    pub async fn claim(&self, agent_id: i64, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        let agent = self.require_staff(agent_id).await?;
        let ticket = self.load_ticket(ticket_id).await?;

        if ticket.status.is_terminal() {
            return Err(ServiceError::TicketClosed(ticket_id));
        }
        if ticket.is_assigned() {
            return Err(ServiceError::AlreadyAssigned(ticket_id));
        }

        let key = AssignmentKey::for_agent(&agent).to_string();
        let claimed = self
            .store
            .claim_ticket(ticket_id, agent.telegram_id, &key)
            .await?
            .ok_or(ServiceError::AlreadyAssigned(ticket_id))?;

        tracing::info!("Ticket {} claimed by {}", ticket_id, key);

        self.store
            .append_message(ticket_id, SYSTEM_SENDER, &templates::agent_joined(&key))
            .await?;

        let (text, keyboard) = templates::claimed_notification(&claimed, &agent);
        self.update_notification(&claimed, &text, Some(&keyboard)).await;

        self.deliver(
            claimed.owner_id,
            &templates::ticket_claimed_for_user(&agent),
            ticket_id,
        )
        .await;
        self.deliver(agent.telegram_id, &templates::agent_briefing(&claimed), ticket_id)
            .await;

        Ok(claimed)
    }

    /// Records the agent's message on their active ticket and forwards it to
    /// the owner. A failed forward is reported after the message is stored.
    pub async fn reply(&self, agent_id: i64, text: &str) -> Result<Ticket, ServiceError> {
        let reply = StaffReplyDto::new(text);
        if reply.validate().is_err() {
            return Err(ServiceError::Validation(ErrorMessage::ReplyUsage));
        }

        let agent = self.require_staff(agent_id).await?;
        let ticket_id = agent
            .active_ticket_ref
            .ok_or(ServiceError::NoActiveTicket(agent_id))?;
        let ticket = self.load_ticket(ticket_id).await?;
        Self::ensure_assigned(&ticket, &agent)?;

        let key = AssignmentKey::for_agent(&agent).to_string();
        self.store.append_message(ticket_id, &key, &reply.text).await?;

        self.transport
            .send_message(ticket.owner_id, &templates::agent_reply(&key, &reply.text), None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Reply on ticket {} stored but not delivered to {}: {}",
                    ticket_id,
                    ticket.owner_id,
                    e
                );
                ServiceError::Delivery(e)
            })?;

        Ok(ticket)
    }

    /// Free text from an owner with a live ticket.
    pub async fn follow_up(&self, owner: &User, ticket: &Ticket, text: &str) -> Result<(), ServiceError> {
        let sender = owner.display_key();
        self.store.append_message(ticket.id, &sender, text).await?;

        if let Some(agent_chat) = self.assignee_chat(ticket).await? {
            self.deliver(
                agent_chat,
                &templates::follow_up_for_agent(&sender, ticket, text),
                ticket.id,
            )
            .await;
        }
        Ok(())
    }

    /// Resolves the ticket the agent is currently replying to.
    pub async fn resolve(&self, agent_id: i64) -> Result<Ticket, ServiceError> {
        let agent = self.require_staff(agent_id).await?;
        let ticket_id = agent
            .active_ticket_ref
            .ok_or(ServiceError::NoActiveTicket(agent_id))?;
        let ticket = self.load_ticket(ticket_id).await?;
        Self::ensure_assigned(&ticket, &agent)?;

        let resolved = self
            .store
            .finish_ticket(ticket_id, TicketStatus::Resolved)
            .await?
            .ok_or(ServiceError::TicketClosed(ticket_id))?;

        let key = AssignmentKey::for_agent(&agent).to_string();
        self.store
            .append_message(ticket_id, SYSTEM_SENDER, &templates::resolved_by(&key))
            .await?;
        self.store
            .clear_active_ticket_if(resolved.owner_id, ticket_id)
            .await?;
        self.store.set_active_ticket_ref(agent_id, None).await?;

        tracing::info!("Ticket {} resolved by {}", ticket_id, key);

        self.deliver(
            resolved.owner_id,
            &templates::resolved_for_user(&key),
            ticket_id,
        )
        .await;

        let summary = templates::resolved_notification(&resolved, &key, &resolved.updated_at);
        self.update_notification(&resolved, &summary, None).await;

        Ok(resolved)
    }

    /// Resolve pressed on a ticket card: targets that ticket, then resolves.
    /// The card itself is rewritten when it is not the staff-channel message.
    pub async fn resolve_from_card(
        &self,
        agent_id: i64,
        ticket_id: Uuid,
        card: Option<MessageRef>,
    ) -> Result<Ticket, ServiceError> {
        self.set_reply_context(agent_id, ticket_id).await?;
        let resolved = self.resolve(agent_id).await?;

        if let Some(card) = card.filter(|c| Some(*c) != resolved.notification_ref()) {
            let key = resolved.assignee_key.clone().unwrap_or_default();
            let summary = templates::resolved_notification(&resolved, &key, &resolved.updated_at);
            if let Err(e) = self.transport.edit_message(card, &summary, None).await {
                tracing::warn!("Failed to update ticket card for {}: {}", ticket_id, e);
            }
        }
        Ok(resolved)
    }

    pub async fn cancel_by_owner(&self, owner_id: i64, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        let owner = self
            .store
            .get_user(owner_id)
            .await?
            .ok_or(ServiceError::UserNotFound(owner_id))?;
        let ticket = self.load_ticket(ticket_id).await?;

        if ticket.owner_id != owner_id || owner.active_ticket != Some(ticket_id) {
            return Err(ServiceError::NotTicketOwner {
                ticket_id,
                user_id: owner_id,
            });
        }
        if ticket.status.is_terminal() {
            return Err(ServiceError::TicketClosed(ticket_id));
        }

        let closed = self
            .store
            .finish_ticket(ticket_id, TicketStatus::Closed)
            .await?
            .ok_or(ServiceError::TicketClosed(ticket_id))?;

        self.store
            .append_message(ticket_id, SYSTEM_SENDER, &templates::closed_by(&owner))
            .await?;
        self.store.clear_active_ticket_if(owner_id, ticket_id).await?;

        tracing::info!("Ticket {} closed by owner {}", ticket_id, owner_id);

        if let Some(agent_chat) = self.assignee_chat(&closed).await? {
            self.deliver(agent_chat, &templates::closed_for_agent(&closed), ticket_id)
                .await;
        }

        let summary = templates::closed_notification(&closed, &closed.updated_at);
        self.update_notification(&closed, &summary, None).await;

        Ok(closed)
    }

    /// Staff card for a ticket, with reply and resolve buttons.
    pub async fn view(&self, staff_id: i64, ticket_id: Uuid) -> Result<(String, Keyboard), ServiceError> {
        self.require_staff(staff_id).await?;
        let ticket = self.load_ticket(ticket_id).await?;
        Ok((
            templates::ticket_details(&ticket, true),
            templates::staff_ticket_keyboard(&ticket),
        ))
    }

    /// Points the agent's `/reply` at `ticket_id`.
    pub async fn set_reply_context(&self, agent_id: i64, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        let agent = self.require_staff(agent_id).await?;
        let ticket = self.load_ticket(ticket_id).await?;
        Self::ensure_assigned(&ticket, &agent)?;

        self.store
            .set_active_ticket_ref(agent_id, Some(ticket_id))
            .await?;
        Ok(ticket)
    }

    /// The owner's live ticket, clearing a reference to a ticket that no
    /// longer exists.
    pub async fn my_ticket(&self, owner: &User) -> Result<Option<Ticket>, ServiceError> {
        let Some(ticket_id) = owner.active_ticket else {
            return Ok(None);
        };
        match self.store.get_ticket(ticket_id).await? {
            Some(ticket) => Ok(Some(ticket)),
            None => {
                tracing::warn!(
                    "User {} referenced missing ticket {}",
                    owner.telegram_id,
                    ticket_id
                );
                self.store.set_active_ticket(owner.telegram_id, None).await?;
                Ok(None)
            }
        }
    }

    pub async fn assigned_tickets(&self, agent_id: i64) -> Result<Vec<Ticket>, ServiceError> {
        let agent = self.require_staff(agent_id).await?;
        let key = AssignmentKey::for_agent(&agent).to_string();
        Ok(self.store.get_assigned_tickets(agent_id, &key).await?)
    }
}
