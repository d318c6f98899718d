// db/ticketdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::DBClient;
use crate::models::{
    chatmodel::MessageRef,
    ticketmodel::{NewTicket, Ticket, TicketMessage, TicketPriority, TicketStatus},
};

#[async_trait]
pub trait TicketExt {
    /// Inserts the ticket together with its seed transcript.
    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, Error>;

    /// Loads the ticket with its transcript in insertion order.
    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;

    /// Assigns an open, unassigned ticket and moves it to in-progress.
    /// Returns `None` when the ticket is already assigned or no longer open.
    async fn claim_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: i64,
        assignee_key: &str,
    ) -> Result<Option<Ticket>, Error>;

    async fn append_message(
        &self,
        ticket_id: Uuid,
        sender: &str,
        text: &str,
    ) -> Result<TicketMessage, Error>;

    /// Moves a non-terminal ticket to `status`. Returns `None` when the ticket
    /// is already resolved or closed.
    async fn finish_ticket(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, Error>;

    async fn set_notification_ref(&self, ticket_id: Uuid, notification: MessageRef) -> Result<(), Error>;

    /// Open and in-progress tickets assigned to the agent, newest first.
    async fn get_assigned_tickets(
        &self,
        assignee_id: i64,
        assignee_key: &str,
    ) -> Result<Vec<Ticket>, Error>;
}

impl DBClient {
    async fn load_messages(&self, ticket_id: Uuid) -> Result<Vec<TicketMessage>, Error> {
        sqlx::query_as::<_, TicketMessage>(
            r#"
            SELECT * FROM ticket_messages
            WHERE ticket_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn with_messages(&self, ticket: Option<Ticket>) -> Result<Option<Ticket>, Error> {
        match ticket {
            Some(mut ticket) => {
                ticket.messages = self.load_messages(ticket.id).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TicketExt for DBClient {
    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, Error> {
        let mut tx = self.pool.begin().await?;

        let mut ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (label, owner_id, owner_name, category, description, status, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new_ticket.label)
        .bind(new_ticket.owner_id)
        .bind(&new_ticket.owner_name)
        .bind(new_ticket.category)
        .bind(&new_ticket.description)
        .bind(TicketStatus::Open)
        .bind(TicketPriority::default())
        .fetch_one(&mut *tx)
        .await?;

        for (sender, text) in new_ticket.initial_messages() {
            let message = sqlx::query_as::<_, TicketMessage>(
                r#"
                INSERT INTO ticket_messages (ticket_id, sender, text)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(ticket.id)
            .bind(sender)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;
            ticket.messages.push(message);
        }

        tx.commit().await?;
        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_messages(ticket).await
    }

    async fn claim_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: i64,
        assignee_key: &str,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET assignee_id = $2,
                assignee_key = $3,
                status = 'in_progress',
                updated_at = NOW()
            WHERE id = $1
              AND assignee_id IS NULL
              AND assignee_key IS NULL
              AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(assignee_id)
        .bind(assignee_key)
        .fetch_optional(&self.pool)
        .await?;

        self.with_messages(ticket).await
    }

    async fn append_message(
        &self,
        ticket_id: Uuid,
        sender: &str,
        text: &str,
    ) -> Result<TicketMessage, Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender, text)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(sender)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE tickets
            SET updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    async fn finish_ticket(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET status = $2, updated_at = NOW()
            WHERE id = $1
              AND status IN ('open', 'in_progress')
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        self.with_messages(ticket).await
    }

    async fn set_notification_ref(&self, ticket_id: Uuid, notification: MessageRef) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET notification_chat_id = $2, notification_message_id = $3
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .bind(notification.chat_id)
        .bind(notification.message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_assigned_tickets(
        &self,
        assignee_id: i64,
        assignee_key: &str,
    ) -> Result<Vec<Ticket>, Error> {
        sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM tickets
            WHERE (assignee_id = $1 OR (assignee_id IS NULL AND assignee_key = $2))
              AND status IN ('open', 'in_progress')
            ORDER BY created_at DESC
            "#,
        )
        .bind(assignee_id)
        .bind(assignee_key)
        .fetch_all(&self.pool)
        .await
    }
}
