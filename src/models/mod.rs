pub mod chatmodel;
pub mod conversationmodel;
pub mod ticketmodel;
pub mod usermodel;
