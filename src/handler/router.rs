// handler/router.rs
use std::sync::Arc;

use uuid::Uuid;

use super::{callbacks::CallbackAction, commands::Command};
use crate::{
    db::Store,
    error::ErrorMessage,
    models::{
        chatmodel::{ChatKind, Keyboard, MessageRef},
        usermodel::User,
    },
    service::{
        conversation_service::ConversationService,
        error::{ErrorKind, ServiceError},
        responder::Responder,
        ticket_service::TicketService,
    },
    telegram::{
        templates,
        transport::ChatTransport,
        updates::{InboundEvent, InboundKind},
    },
};

/// Entry point for every inbound event. Failures are answered here and never
/// escape to the poller.
#[derive(Clone)]
pub struct UpdateRouter {
    store: Arc<dyn Store>,
    transport: Arc<dyn ChatTransport>,
    tickets: Arc<TicketService>,
    conversations: ConversationService,
}

impl UpdateRouter {
    pub fn new(store: Arc<dyn Store>, transport: Arc<dyn ChatTransport>, support_channel_id: Option<i64>) -> Self {
        let tickets = Arc::new(TicketService::new(
            store.clone(),
            transport.clone(),
            support_channel_id,
        ));
        let conversations = ConversationService::new(store.clone(), transport.clone(), tickets.clone());
        Self {
            store,
            transport,
            tickets,
            conversations,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) {
        let origin = match &event.kind {
            InboundKind::Callback { message, .. } => *message,
            _ => None,
        };
        let out = Responder::new(self.transport.clone(), event.chat_id, origin);

        let user = match self.store.find_or_create_user(&event.sender).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Failed to load user {}: {}", event.sender.telegram_id, e);
                let message = ErrorMessage::ServerError.to_string();
                match &event.kind {
                    InboundKind::Callback { id, .. } => self.answer(id, Some(&message)).await,
                    _ => self.report(&out, &message).await,
                }
                return;
            }
        };

        match event.kind {
            InboundKind::Command { name, args, raw } => {
                let result = match Command::parse(&name, &args) {
                    Some(command) => self.handle_command(&user, command, event.chat_kind, &out).await,
                    None => self.handle_text(&user, &raw, &out).await,
                };
                if let Err(e) = result {
                    self.fail(&user, e, &out).await;
                }
            }
            InboundKind::Text(text) => {
                if let Err(e) = self.handle_text(&user, &text, &out).await {
                    self.fail(&user, e, &out).await;
                }
            }
            InboundKind::Callback { id, data, message } => {
                let toast = match CallbackAction::parse(&data) {
                    Some(action) => match self.handle_callback(&user, action, message, &out).await {
                        Ok(toast) => toast,
                        Err(e) => {
                            Self::log_failure(&user, &e);
                            Some(e.user_message())
                        }
                    },
                    None => {
                        tracing::warn!("Unsupported callback {:?} from {}", data, user.telegram_id);
                        Some(ErrorMessage::UnsupportedAction.to_string())
                    }
                };
                self.answer(&id, toast.as_deref()).await;
            }
        }
    }

    async fn handle_command(
        &self,
        user: &User,
        command: Command,
        chat_kind: ChatKind,
        out: &Responder,
    ) -> Result<(), ServiceError> {
        match command {
            Command::Start => {
                out.send(templates::WELCOME, None).await?;
            }
            Command::Help => {
                let help = if user.is_staff {
                    templates::STAFF_HELP
                } else {
                    templates::USER_HELP
                };
                out.send(help, None).await?;
            }
            Command::Ticket => self.conversations.start(user, chat_kind, out).await?,
            Command::Cancel => self.conversations.cancel(user, out).await?,
            Command::MyTicket => match self.tickets.my_ticket(user).await? {
                Some(ticket) => {
                    let keyboard = templates::owner_ticket_keyboard(&ticket);
                    out.send(&templates::ticket_details(&ticket, false), keyboard.as_ref())
                        .await?;
                }
                None => {
                    out.send(templates::NO_ACTIVE_TICKET, None).await?;
                }
            },
            Command::MyTickets => {
                let tickets = self.tickets.assigned_tickets(user.telegram_id).await?;
                if tickets.is_empty() {
                    out.send(templates::NO_ASSIGNED_TICKETS, None).await?;
                } else {
                    let (text, keyboard) = templates::assigned_tickets(&tickets);
                    out.send(&text, Some(&keyboard)).await?;
                }
            }
            Command::Reply(text) => {
                self.tickets.reply(user.telegram_id, &text).await?;
                out.send(templates::REPLY_DELIVERED, None).await?;
            }
            Command::Resolve => {
                let ticket = self.tickets.resolve(user.telegram_id).await?;
                out.send(&templates::resolved_for_agent(&ticket), None).await?;
            }
        }
        Ok(())
    }

    /// Free text, checked in order: cancel keyword, active creation flow,
    /// owner follow-up, staff reply hint, not understood.
    async fn handle_text(&self, user: &User, text: &str, out: &Responder) -> Result<(), ServiceError> {
        if text.trim().eq_ignore_ascii_case("/cancel") {
            return self.conversations.cancel(user, out).await;
        }

        if !user.flow().is_idle() {
            return self.conversations.handle_text(user, text, out).await;
        }

        if !user.is_staff {
            if let Some(ticket) = self.tickets.my_ticket(user).await? {
                if !ticket.status.is_terminal() {
                    self.tickets.follow_up(user, &ticket, text).await?;
                    out.send(templates::FOLLOW_UP_ACK, None).await?;
                    return Ok(());
                }
            }
        }

        if user.is_staff && user.active_ticket_ref.is_some() {
            out.send(templates::STAFF_REPLY_HINT, None).await?;
            return Ok(());
        }

        out.send(&ErrorMessage::NotUnderstood.to_string(), None).await?;
        Ok(())
    }

    /// Returns the text for the callback answer, if any.
    async fn handle_callback(
        &self,
        user: &User,
        action: CallbackAction,
        message: Option<MessageRef>,
        out: &Responder,
    ) -> Result<Option<String>, ServiceError> {
        match action {
            CallbackAction::Category(category) => {
                self.conversations.select_category(user, category, out).await?;
            }
            CallbackAction::Cancel => self.conversations.cancel(user, out).await?,
            CallbackAction::Back => self.conversations.back(user, out).await?,
            CallbackAction::Skip => self.conversations.skip(user, out).await?,
            CallbackAction::Confirm => self.conversations.confirm(user, out).await?,
            CallbackAction::Claim(ticket_id) => {
                self.tickets.claim(user.telegram_id, ticket_id).await?;
                return Ok(Some("You have claimed this ticket.".to_string()));
            }
            CallbackAction::View(ticket_id) => {
                let (text, keyboard) = self.tickets.view(user.telegram_id, ticket_id).await?;
                self.send_private(user, &text, Some(&keyboard), ticket_id).await?;
            }
            CallbackAction::Reply(ticket_id) => {
                let ticket = self.tickets.set_reply_context(user.telegram_id, ticket_id).await?;
                self.send_private(user, &templates::reply_context_set(&ticket), None, ticket_id)
                    .await?;
            }
            CallbackAction::Resolve(ticket_id) => {
                let ticket = self
                    .tickets
                    .resolve_from_card(user.telegram_id, ticket_id, message)
                    .await?;
                return Ok(Some(templates::resolved_for_agent(&ticket)));
            }
            CallbackAction::CancelTicket(ticket_id) => {
                let ticket = self.tickets.cancel_by_owner(user.telegram_id, ticket_id).await?;
                out.show(&templates::closed_for_owner(&ticket, &ticket.updated_at), None)
                    .await?;
            }
        }
        Ok(None)
    }

    /// Staff cards go to the agent's private chat, not the channel the button
    /// was pressed in.
    async fn send_private(
        &self,
        user: &User,
        text: &str,
        keyboard: Option<&Keyboard>,
        ticket_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.transport
            .send_message(user.telegram_id, text, keyboard)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Could not reach {} privately about ticket {}: {}",
                    user.telegram_id,
                    ticket_id,
                    e
                );
                ServiceError::Validation(ErrorMessage::PrivateChatUnavailable)
            })?;
        Ok(())
    }

    fn log_failure(user: &User, err: &ServiceError) {
        match err.kind() {
            ErrorKind::StoreFailure | ErrorKind::DeliveryFailed => {
                tracing::error!("Request from {} failed: {}", user.telegram_id, err)
            }
            ErrorKind::NotFound | ErrorKind::Unauthorized | ErrorKind::ValidationFailed => {
                tracing::warn!("Request from {} rejected: {}", user.telegram_id, err)
            }
        }
    }

    async fn fail(&self, user: &User, err: ServiceError, out: &Responder) {
        Self::log_failure(user, &err);
        self.report(out, &err.user_message()).await;
    }

    async fn report(&self, out: &Responder, message: &str) {
        if let Err(e) = out.send(message, None).await {
            tracing::error!("Could not report failure to chat {}: {}", out.chat_id(), e);
        }
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(callback_id, text).await {
            tracing::warn!("Failed to answer callback {}: {}", callback_id, e);
        }
    }
}
