pub mod callbacks;
pub mod commands;
pub mod router;
