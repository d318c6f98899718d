pub mod ticket_label;
