// dtos/ticketdtos.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ErrorMessage;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct TicketDescriptionDto {
    #[validate(length(min = 1, max = 500, message = "Description must be between 1-500 characters"))]
    pub description: String,
}

impl TicketDescriptionDto {
    pub fn new(text: &str) -> Self {
        Self {
            description: text.trim().to_string(),
        }
    }

    /// Checks the draft description and returns it, or the prompt to show
    /// the user on rejection.
    pub fn into_description(self) -> Result<String, ErrorMessage> {
        match self.validate() {
            Ok(()) => Ok(self.description),
            Err(_) if self.description.is_empty() => Err(ErrorMessage::DescriptionEmpty),
            Err(_) => Err(ErrorMessage::DescriptionTooLong),
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct StaffReplyDto {
    #[validate(length(min = 1, message = "Reply text is required"))]
    pub text: String,
}

impl StaffReplyDto {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_bounds_count_characters() {
        let exact = "ü".repeat(500);
        assert_eq!(TicketDescriptionDto::new(&exact).into_description(), Ok(exact.clone()));

        let over = "a".repeat(501);
        assert_eq!(
            TicketDescriptionDto::new(&over).into_description(),
            Err(ErrorMessage::DescriptionTooLong)
        );
        assert_eq!(
            TicketDescriptionDto::new("   ").into_description(),
            Err(ErrorMessage::DescriptionEmpty)
        );
    }

    #[test]
    fn blank_reply_is_invalid() {
        assert!(StaffReplyDto::new("  ").validate().is_err());
        assert!(StaffReplyDto::new("on it").validate().is_ok());
    }
}
