// service/conversation_service.rs
use std::sync::Arc;

use crate::{
    db::Store,
    dtos::ticketdtos::TicketDescriptionDto,
    error::ErrorMessage,
    models::{
        chatmodel::ChatKind,
        conversationmodel::{TicketFlow, TransactionRef},
        ticketmodel::{Ticket, TicketCategory},
        usermodel::User,
    },
    service::{error::ServiceError, responder::Responder, ticket_service::TicketService},
    telegram::{templates, transport::ChatTransport},
};

/// Drives the multi-step ticket creation flow. The flow is persisted after
/// every step with a single-column update.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn Store>,
    transport: Arc<dyn ChatTransport>,
    tickets: Arc<TicketService>,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn ChatTransport>,
        tickets: Arc<TicketService>,
    ) -> Self {
        Self {
            store,
            transport,
            tickets,
        }
    }

    async fn save(&self, user: &User, flow: &TicketFlow) -> Result<(), ServiceError> {
        self.store.set_ticket_flow(user.telegram_id, flow).await?;
        Ok(())
    }

    /// The owner's ticket that is still open or in progress, if any.
    async fn live_ticket(&self, user: &User) -> Result<Option<Ticket>, ServiceError> {
        Ok(self
            .tickets
            .my_ticket(user)
            .await?
            .filter(|ticket| !ticket.status.is_terminal()))
    }

    fn invalid_step(user: &User) -> ServiceError {
        ServiceError::InvalidStep(user.flow().step())
    }

    /// `/ticket`. Restarts from the category step even when a draft exists.
    /// From a group, the flow continues in the user's private chat.
    pub async fn start(&self, user: &User, chat_kind: ChatKind, out: &Responder) -> Result<(), ServiceError> {
        if let Some(ticket) = self.live_ticket(user).await? {
            out.send(&templates::active_ticket_exists(&ticket), None).await?;
            return Ok(());
        }

        let keyboard = templates::category_keyboard();

        if chat_kind.is_private() {
            self.save(user, &TicketFlow::start(None)).await?;
            out.send(templates::CATEGORY_PROMPT, Some(&keyboard)).await?;
            tracing::info!("Ticket flow started by {}", user.telegram_id);
            return Ok(());
        }

        self.save(user, &TicketFlow::start(Some(out.chat_id()))).await?;
        match self
            .transport
            .send_message(user.telegram_id, templates::PRIVATE_CATEGORY_PROMPT, Some(&keyboard))
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "Ticket flow started by {} from group {}",
                    user.telegram_id,
                    out.chat_id()
                );
                out.send(templates::GROUP_REDIRECT, None).await?;
            }
            Err(e) => {
                tracing::warn!(
                    "No private chat with {} for ticket flow: {}",
                    user.telegram_id,
                    e
                );
                self.save(user, &TicketFlow::Idle).await?;
                out.send(&ErrorMessage::PrivateChatUnavailable.to_string(), None)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn select_category(
        &self,
        user: &User,
        category: TicketCategory,
        out: &Responder,
    ) -> Result<(), ServiceError> {
        let flow = user
            .flow()
            .clone()
            .select_category(category)
            .ok_or_else(|| Self::invalid_step(user))?;
        self.save(user, &flow).await?;
        out.show(&templates::description_prompt(category), None).await
    }

    /// Free text while a flow is active. Steps that expect a button press
    /// re-prompt without changing state.
    pub async fn handle_text(&self, user: &User, text: &str, out: &Responder) -> Result<(), ServiceError> {
        match user.flow() {
            TicketFlow::Idle => Err(Self::invalid_step(user)),
            TicketFlow::Category { .. } | TicketFlow::Confirmation { .. } => {
                out.send(templates::USE_BUTTONS, None).await?;
                Ok(())
            }
            TicketFlow::Description { category, .. } => {
                let category = *category;
                let description = TicketDescriptionDto::new(text)
                    .into_description()
                    .map_err(ServiceError::Validation)?;
                let flow = user
                    .flow()
                    .clone()
                    .describe(description)
                    .ok_or_else(|| Self::invalid_step(user))?;
                self.save(user, &flow).await?;
                out.send(
                    &templates::transaction_ref_prompt(category, None),
                    Some(&templates::transaction_ref_keyboard()),
                )
                .await?;
                Ok(())
            }
            TicketFlow::TransactionRef { .. } => {
                self.attach_reference(user, TransactionRef::from_input(text), out, false)
                    .await
            }
        }
    }

    pub async fn skip(&self, user: &User, out: &Responder) -> Result<(), ServiceError> {
        self.attach_reference(user, TransactionRef::Skipped, out, true).await
    }

    async fn attach_reference(
        &self,
        user: &User,
        transaction_ref: TransactionRef,
        out: &Responder,
        in_place: bool,
    ) -> Result<(), ServiceError> {
        let flow = user
            .flow()
            .clone()
            .attach_reference(transaction_ref)
            .ok_or_else(|| Self::invalid_step(user))?;
        self.save(user, &flow).await?;

        let TicketFlow::Confirmation {
            category,
            description,
            transaction_ref,
            ..
        } = &flow
        else {
            return Err(Self::invalid_step(user));
        };
        let text = templates::confirmation(*category, description, transaction_ref);
        let keyboard = templates::confirmation_keyboard();
        if in_place {
            out.show(&text, Some(&keyboard)).await
        } else {
            out.send(&text, Some(&keyboard)).await.map(|_| ())
        }
    }

    pub async fn back(&self, user: &User, out: &Responder) -> Result<(), ServiceError> {
        let flow = user
            .flow()
            .clone()
            .back()
            .ok_or_else(|| Self::invalid_step(user))?;
        self.save(user, &flow).await?;

        match &flow {
            TicketFlow::Description { category, .. } => {
                out.show(&templates::description_prompt(*category), None).await
            }
            TicketFlow::TransactionRef {
                category,
                description,
                ..
            } => {
                out.show(
                    &templates::transaction_ref_prompt(*category, Some(description)),
                    Some(&templates::transaction_ref_keyboard()),
                )
                .await
            }
            _ => Err(Self::invalid_step(user)),
        }
    }

    /// Materializes the draft. The flow is cleared as soon as the ticket is
    /// committed, so a repeated confirm cannot open a second one.
    pub async fn confirm(&self, user: &User, out: &Responder) -> Result<(), ServiceError> {
        let TicketFlow::Confirmation {
            category,
            description,
            transaction_ref,
            ..
        } = user.flow()
        else {
            return Err(Self::invalid_step(user));
        };

        if let Some(ticket) = self.live_ticket(user).await? {
            self.save(user, &TicketFlow::Idle).await?;
            return out.show(&templates::active_ticket_exists(&ticket), None).await;
        }

        let ticket = self
            .tickets
            .create(user, *category, description, transaction_ref)
            .await?;
        self.save(user, &TicketFlow::Idle).await?;

        out.show(&templates::ticket_created(&ticket), None).await
    }

    /// Drops the draft. The staff reply target is a separate field and is kept.
    pub async fn cancel(&self, user: &User, out: &Responder) -> Result<(), ServiceError> {
        let was_active = !user.flow().is_idle();
        self.save(user, &TicketFlow::Idle).await?;

        if was_active {
            tracing::info!(
                "Ticket flow cancelled by {} at step {}",
                user.telegram_id,
                user.flow().step().to_str()
            );
            out.show(templates::FLOW_CANCELLED, None).await
        } else {
            out.show(templates::OPERATION_CANCELLED, None).await
        }
    }
}
