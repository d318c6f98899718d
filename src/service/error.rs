// service/error.rs
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::ErrorMessage,
    models::conversationmodel::TicketStep,
    telegram::transport::TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    ValidationFailed,
    DeliveryFailed,
    StoreFailure,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("User {0} is not support staff")]
    Unauthorized(i64),

    #[error("Ticket {ticket_id} is not assigned to user {user_id}")]
    NotAssigned { ticket_id: Uuid, user_id: i64 },

    #[error("Ticket {0} is already assigned")]
    AlreadyAssigned(Uuid),

    #[error("Ticket {0} is already resolved or closed")]
    TicketClosed(Uuid),

    #[error("User {0} has no active ticket selected")]
    NoActiveTicket(i64),

    #[error("User {user_id} does not own active ticket {ticket_id}")]
    NotTicketOwner { ticket_id: Uuid, user_id: i64 },

    #[error("Action not valid at step {0:?}")]
    InvalidStep(TicketStep),

    #[error("Validation error: {0}")]
    Validation(ErrorMessage),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] TransportError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::UserNotFound(_)
            | ServiceError::TicketNotFound(_)
            | ServiceError::NoActiveTicket(_) => ErrorKind::NotFound,

            ServiceError::Unauthorized(_)
            | ServiceError::NotAssigned { .. }
            | ServiceError::NotTicketOwner { .. } => ErrorKind::Unauthorized,

            ServiceError::AlreadyAssigned(_)
            | ServiceError::TicketClosed(_)
            | ServiceError::InvalidStep(_)
            | ServiceError::Validation(_) => ErrorKind::ValidationFailed,

            ServiceError::Delivery(_) => ErrorKind::DeliveryFailed,

            ServiceError::Database(_) | ServiceError::Other(_) => ErrorKind::StoreFailure,
        }
    }

    /// What the participant who triggered the failure is told.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::UserNotFound(_) => ErrorMessage::UserNotFound.to_string(),
            ServiceError::TicketNotFound(_) => ErrorMessage::TicketNotFound.to_string(),
            ServiceError::Unauthorized(_) => {
                "You are not authorized to perform this action.".to_string()
            }
            ServiceError::NotAssigned { .. } => {
                "You are not assigned to this ticket.".to_string()
            }
            ServiceError::AlreadyAssigned(_) => ErrorMessage::AlreadyAssigned.to_string(),
            ServiceError::TicketClosed(_) => ErrorMessage::TicketAlreadyFinished.to_string(),
            ServiceError::NoActiveTicket(_) => ErrorMessage::NoActiveTicket.to_string(),
            ServiceError::NotTicketOwner { .. } => ErrorMessage::NotYourTicket.to_string(),
            ServiceError::InvalidStep(_) => ErrorMessage::InvalidAction.to_string(),
            ServiceError::Validation(message) => message.to_string(),
            ServiceError::Delivery(_) => ErrorMessage::DeliveryFailed.to_string(),
            ServiceError::Database(_) | ServiceError::Other(_) => {
                ErrorMessage::ServerError.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_stay_generic() {
        let err = ServiceError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(err.user_message(), ErrorMessage::ServerError.to_string());
    }

    #[test]
    fn validation_carries_its_prompt() {
        let err = ServiceError::Validation(ErrorMessage::DescriptionTooLong);
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(err.user_message().contains("under 500 characters"));
    }
}
