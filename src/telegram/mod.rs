pub mod client;
pub mod templates;
pub mod transport;
pub mod updates;
