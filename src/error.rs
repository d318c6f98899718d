// error.rs
use std::fmt;

/// Fixed replies sent back to the participant who triggered a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessage {
    UserNotFound,
    TicketNotFound,
    AlreadyAssigned,
    TicketAlreadyFinished,
    NoActiveTicket,
    NotYourTicket,
    InvalidAction,
    UnsupportedAction,
    DescriptionTooLong,
    DescriptionEmpty,
    ReplyUsage,
    DeliveryFailed,
    PrivateChatUnavailable,
    ServerError,
    NotUnderstood,
}

impl ErrorMessage {
    fn to_str(&self) -> &'static str {
        match self {
            ErrorMessage::UserNotFound => "User not found. Please start a conversation with /start first.",
            ErrorMessage::TicketNotFound => "Ticket not found.",
            ErrorMessage::AlreadyAssigned => "This ticket is already assigned.",
            ErrorMessage::TicketAlreadyFinished => "This ticket is already closed or resolved.",
            ErrorMessage::NoActiveTicket => "No active ticket selected. Use /mytickets to select a ticket.",
            ErrorMessage::NotYourTicket => "This is not your active ticket.",
            ErrorMessage::InvalidAction => "Invalid action.",
            ErrorMessage::UnsupportedAction => "This action is not currently supported.",
            ErrorMessage::DescriptionTooLong => "Your description is too long. Please keep it under 500 characters. Try again:",
            ErrorMessage::DescriptionEmpty => "Please describe your issue in a few words. Try again:",
            ErrorMessage::ReplyUsage => "Please provide a message to reply with. Format: /reply Your message here",
            ErrorMessage::DeliveryFailed => "Your reply was saved but couldn't be delivered to the user. They may have blocked the bot.",
            ErrorMessage::PrivateChatUnavailable => "I couldn't send you a private message. Please open a private chat with me, press START, and try /ticket again.",
            ErrorMessage::ServerError => "Sorry, an error occurred. Please try again later.",
            ErrorMessage::NotUnderstood => "I don't understand that command. Type /help to see available commands.",
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}
