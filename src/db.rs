// db.rs
pub mod ticketdb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

use sqlx::{Pool, Postgres};

use self::{ticketdb::TicketExt, userdb::UserExt};

#[derive(Debug, Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the services need from persistence.
pub trait Store: UserExt + TicketExt + Send + Sync {}

impl<T: UserExt + TicketExt + Send + Sync> Store for T {}
