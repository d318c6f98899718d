// db/userdb.rs
use async_trait::async_trait;
use sqlx::{types::Json, Error};
use uuid::Uuid;

use super::DBClient;
use crate::models::{
    conversationmodel::TicketFlow,
    usermodel::{Profile, User},
};

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, Error>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Returns the stored user, creating it from the profile on first contact.
    /// Bumps `last_active` either way.
    async fn find_or_create_user(&self, profile: &Profile) -> Result<User, Error>;

    /// Upsert of the whole entity.
    async fn save_user(&self, user: &User) -> Result<User, Error>;

    async fn set_ticket_flow(&self, telegram_id: i64, flow: &TicketFlow) -> Result<(), Error>;

    async fn set_active_ticket(
        &self,
        telegram_id: i64,
        ticket_id: Option<Uuid>,
    ) -> Result<(), Error>;

    /// Clears the owner back-reference only while it still points at `ticket_id`.
    async fn clear_active_ticket_if(&self, telegram_id: i64, ticket_id: Uuid) -> Result<bool, Error>;

    async fn set_active_ticket_ref(
        &self,
        telegram_id: i64,
        ticket_id: Option<Uuid>,
    ) -> Result<(), Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE username = $1
            ORDER BY last_active DESC
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_or_create_user(&self, profile: &Profile) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (telegram_id) DO UPDATE SET last_active = NOW()
            RETURNING *
            "#,
        )
        .bind(profile.telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_user(&self, user: &User) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                telegram_id, username, first_name, last_name, is_staff, role,
                ticket_flow, active_ticket_ref, active_ticket, created_at, last_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (telegram_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                is_staff = EXCLUDED.is_staff,
                role = EXCLUDED.role,
                ticket_flow = EXCLUDED.ticket_flow,
                active_ticket_ref = EXCLUDED.active_ticket_ref,
                active_ticket = EXCLUDED.active_ticket,
                last_active = EXCLUDED.last_active
            RETURNING *
            "#,
        )
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_staff)
        .bind(user.role)
        .bind(&user.ticket_flow)
        .bind(user.active_ticket_ref)
        .bind(user.active_ticket)
        .bind(user.created_at)
        .bind(user.last_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_ticket_flow(&self, telegram_id: i64, flow: &TicketFlow) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET ticket_flow = $2
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .bind(Json(flow))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_active_ticket(
        &self,
        telegram_id: i64,
        ticket_id: Option<Uuid>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET active_ticket = $2
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .bind(ticket_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_active_ticket_if(&self, telegram_id: i64, ticket_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET active_ticket = NULL
            WHERE telegram_id = $1 AND active_ticket = $2
            "#,
        )
        .bind(telegram_id)
        .bind(ticket_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active_ticket_ref(
        &self,
        telegram_id: i64,
        ticket_id: Option<Uuid>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET active_ticket_ref = $2
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .bind(ticket_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
