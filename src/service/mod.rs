pub mod conversation_service;
pub mod error;
pub mod poller;
pub mod responder;
pub mod staff_service;
pub mod ticket_service;
