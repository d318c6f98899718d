// telegram/templates.rs
use chrono::{DateTime, Utc};

use crate::{
    handler::callbacks::CallbackAction,
    models::{
        chatmodel::{Button, Keyboard},
        conversationmodel::TransactionRef,
        ticketmodel::{Ticket, TicketCategory, TicketStatus},
        usermodel::User,
    },
};

pub const WELCOME: &str = "Welcome to the Support Bot! Type /help to see available commands.";

pub const USER_HELP: &str = "Available commands:\n\
/start - Start the bot\n\
/ticket - Create a new support ticket\n\
/myticket - View your active ticket\n\
/cancel - Cancel current operation";

pub const STAFF_HELP: &str = "Support Staff Commands:\n\
/ticket - Create a new support ticket\n\
/mytickets - View tickets assigned to you\n\
/reply [message] - Reply to a user ticket\n\
/resolve - Mark a ticket as resolved\n\
/cancel - Cancel current operation";

pub const CATEGORY_PROMPT: &str = "Please select the category that best describes your issue:";
pub const PRIVATE_CATEGORY_PROMPT: &str =
    "Let's create your support ticket. Please select the category that best describes your issue:";
pub const GROUP_REDIRECT: &str =
    "I'll help you create a support ticket. Please check your private messages to continue.";
pub const USE_BUTTONS: &str = "Please use the buttons above to continue, or /cancel to stop.";
pub const FLOW_CANCELLED: &str = "Ticket creation cancelled. Use /ticket to start again.";
pub const OPERATION_CANCELLED: &str = "Current operation cancelled.";
pub const FOLLOW_UP_ACK: &str = "Your message has been added to your ticket. An agent will respond soon.";
pub const REPLY_DELIVERED: &str = "Message sent to user successfully.";
pub const NO_ASSIGNED_TICKETS: &str = "You don't have any active tickets assigned to you.";
pub const NO_ACTIVE_TICKET: &str = "You don't have any active tickets. Use /ticket to create a new one.";
pub const STAFF_REPLY_HINT: &str = "It seems like you're trying to respond to a ticket.\n\
Please use the /reply command followed by your message.\n\n\
Example: /reply Hello, I'll be helping you with your issue.";

/// Cuts `text` to at most `max` characters, ending in "..." when shortened.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn category_keyboard() -> Keyboard {
    let keyboard = TicketCategory::SELECTABLE
        .iter()
        .fold(Keyboard::new(), |kb, category| {
            kb.row(vec![Button::new(
                category.to_str(),
                CallbackAction::Category(*category),
            )])
        });
    keyboard.row(vec![Button::new("Cancel", CallbackAction::Cancel)])
}

pub fn transaction_ref_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![Button::new("Skip", CallbackAction::Skip)])
        .row(vec![
            Button::new("« Back", CallbackAction::Back),
            Button::new("Cancel", CallbackAction::Cancel),
        ])
}

pub fn confirmation_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("Confirm", CallbackAction::Confirm),
            Button::new("Cancel", CallbackAction::Cancel),
        ])
        .row(vec![Button::new("« Edit Details", CallbackAction::Back)])
}

pub fn description_prompt(category: TicketCategory) -> String {
    format!(
        "Category: {}\n\nPlease provide a detailed description of your issue (up to 500 characters):\n\n\
         You can type /cancel at any time to cancel ticket creation.",
        category
    )
}

pub fn transaction_ref_prompt(category: TicketCategory, description: Option<&str>) -> String {
    let mut text = format!("Category: {}\n", category);
    if let Some(description) = description {
        text.push_str(&format!("Description: {}\n", description));
    }
    text.push_str(
        "\nPlease provide any TX hashes related to your issue (one per line). \
         You can provide multiple TX hashes if needed:",
    );
    text
}

pub fn confirmation(category: TicketCategory, description: &str, transaction_ref: &TransactionRef) -> String {
    format!(
        "Please confirm your ticket details:\n\n\
         Category: {}\n\
         Description: {}\n\
         TX Hash(es): {}\n\n\
         Press \"Confirm\" to submit or \"Edit Details\" to make changes.",
        category,
        description,
        transaction_ref.display()
    )
}

pub fn ticket_created(ticket: &Ticket) -> String {
    format!(
        "✅ Ticket created successfully!\n\n\
         Ticket ID: {}\n\
         Status: Open\n\n\
         We'll notify you when a support agent responds to your ticket. Thank you for your patience.",
        ticket.label
    )
}

pub fn active_ticket_exists(ticket: &Ticket) -> String {
    format!(
        "You already have an active ticket ({}, {}).\n\
         Use /myticket to view it. A new ticket can be opened once it is resolved or closed.",
        ticket.label,
        ticket.status.to_str()
    )
}

pub fn new_ticket_notification(ticket: &Ticket, owner: &User) -> (String, Keyboard) {
    let text = format!(
        "🎫 NEW TICKET #{}\n\n\
         From: {}\n\
         Category: {}\n\
         Description: {}\n\n\
         This ticket is awaiting assignment.",
        ticket.id,
        owner.mention(),
        ticket.category,
        preview(&ticket.description, 100)
    );
    let keyboard = Keyboard::new().row(vec![Button::new(
        "👨‍💻 Claim Ticket",
        CallbackAction::Claim(ticket.id),
    )]);
    (text, keyboard)
}

pub fn claimed_notification(ticket: &Ticket, agent: &User) -> (String, Keyboard) {
    let text = format!(
        "🎫 TICKET #{} [IN PROGRESS]\n\n\
         From: {}\n\
         Category: {}\n\
         Description: {}\n\n\
         Assigned to: {}",
        ticket.id,
        ticket.owner_name,
        ticket.category,
        preview(&ticket.description, 100),
        agent.mention()
    );
    let keyboard = Keyboard::new().row(vec![Button::new(
        "💬 View Conversation",
        CallbackAction::View(ticket.id),
    )]);
    (text, keyboard)
}

pub fn resolved_notification(ticket: &Ticket, agent_key: &str, at: &DateTime<Utc>) -> String {
    format!(
        "🎫 Ticket #{} [RESOLVED]\n\n\
         From: {}\n\
         Category: {}\n\
         Description: {}\n\n\
         Resolved by: @{} on {}",
        ticket.id,
        ticket.owner_name,
        ticket.category,
        preview(&ticket.description, 100),
        agent_key,
        timestamp(at)
    )
}

pub fn closed_notification(ticket: &Ticket, at: &DateTime<Utc>) -> String {
    format!(
        "🎫 Ticket #{} [CLOSED]\n\n\
         From: {}\n\
         Category: {}\n\
         Description: {}\n\n\
         Closed by the user on {}",
        ticket.id,
        ticket.owner_name,
        ticket.category,
        preview(&ticket.description, 100),
        timestamp(at)
    )
}

pub fn ticket_claimed_for_user(agent: &User) -> String {
    format!(
        "🎫 Your ticket has been assigned to a support agent: {}\n\n\
         They will be helping you with your issue. Please wait for their message.",
        agent.mention()
    )
}

pub fn agent_briefing(ticket: &Ticket) -> String {
    format!(
        "🎫 You have claimed ticket #{}\n\n\
         User: {}\n\
         Category: {}\n\
         Description: {}\n\n\
         To respond to the user, use the /reply command followed by your message.\n\
         Example: /reply Hello, I'll be assisting you today.",
        ticket.id, ticket.owner_name, ticket.category, ticket.description
    )
}

pub fn agent_joined(agent_key: &str) -> String {
    format!(
        "Agent {} has been assigned to this ticket and will assist you shortly.",
        agent_key
    )
}

pub fn agent_reply(agent_key: &str, text: &str) -> String {
    format!("🎫 Reply from support agent @{}:\n\n{}", agent_key, text)
}

pub fn follow_up_for_agent(sender: &str, ticket: &Ticket, text: &str) -> String {
    format!(
        "📩 New message from {} on ticket #{}:\n\n{}\n\n\
         To reply, use: /reply Your response here",
        sender, ticket.id, text
    )
}

pub fn resolved_by(agent_key: &str) -> String {
    format!("Ticket marked as resolved by {}", agent_key)
}

pub fn resolved_for_user(agent_key: &str) -> String {
    format!(
        "🎫 Your ticket has been marked as resolved by @{}.\n\n\
         If you're satisfied with the resolution, no further action is needed.\n\
         If you still need help, use /ticket to create a new support ticket.",
        agent_key
    )
}

pub fn resolved_for_agent(ticket: &Ticket) -> String {
    format!("Ticket #{} has been marked as resolved.", ticket.id)
}

pub fn closed_by(owner: &User) -> String {
    format!("Ticket closed by user {}", owner.username.clone().unwrap_or_else(|| owner.telegram_id.to_string()))
}

pub fn closed_for_agent(ticket: &Ticket) -> String {
    format!("🎫 Ticket #{} has been closed by the user.", ticket.id)
}

pub fn closed_for_owner(ticket: &Ticket, at: &DateTime<Utc>) -> String {
    format!(
        "🎫 Your ticket #{}\n\n\
         Category: {}\n\
         Status: Closed (by you)\n\
         Closed on: {}\n\n\
         Thank you for using our support service. If you need further assistance, \
         please create a new ticket with /ticket.",
        ticket.id,
        ticket.category,
        timestamp(at)
    )
}

pub fn reply_context_set(ticket: &Ticket) -> String {
    format!(
        "You are now replying to ticket #{}.\n\n\
         To send a message to the user, use:\n\
         /reply Your message here\n\n\
         The reply will be sent directly to the user.",
        ticket.id
    )
}

fn transcript(ticket: &Ticket) -> String {
    if ticket.messages.is_empty() {
        return "\nNo messages yet.\n".to_string();
    }
    ticket
        .messages
        .iter()
        .map(|m| format!("\n{}: {}\n[{}]\n", m.sender, m.text, timestamp(&m.sent_at)))
        .collect()
}

/// Full ticket card. Staff see the owner; owners see "Waiting for assignment"
/// instead of "Unassigned".
pub fn ticket_details(ticket: &Ticket, for_staff: bool) -> String {
    let assigned = match (ticket.assignee(), for_staff) {
        (Some(assignee), _) => assignee.key.to_string(),
        (None, true) => "Unassigned".to_string(),
        (None, false) => "Waiting for assignment".to_string(),
    };
    let header = if for_staff {
        format!("🎫 Ticket #{}\n\nFrom: {}\n", ticket.id, ticket.owner_name)
    } else {
        format!("🎫 Your ticket #{}\n\n", ticket.id)
    };
    format!(
        "{}Category: {}\n\
         Status: {}\n\
         Priority: {}\n\
         Created: {}\n\
         Last Updated: {}\n\
         Assigned To: {}\n\n\
         Description:\n{}\n\n\
         Conversation History:\n{}",
        header,
        ticket.category,
        ticket.status.to_str(),
        ticket.priority.to_str(),
        timestamp(&ticket.created_at),
        timestamp(&ticket.updated_at),
        assigned,
        ticket.description,
        transcript(ticket)
    )
}

pub fn staff_ticket_keyboard(ticket: &Ticket) -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("💬 Reply", CallbackAction::Reply(ticket.id)),
        Button::new("✅ Resolve", CallbackAction::Resolve(ticket.id)),
    ])
}

/// The cancel button is only offered while the ticket can still be closed.
pub fn owner_ticket_keyboard(ticket: &Ticket) -> Option<Keyboard> {
    match ticket.status {
        TicketStatus::Open | TicketStatus::InProgress => Some(Keyboard::new().row(vec![Button::new(
            "❌ Cancel Ticket",
            CallbackAction::CancelTicket(ticket.id),
        )])),
        TicketStatus::Resolved | TicketStatus::Closed => None,
    }
}

pub fn assigned_tickets(tickets: &[Ticket]) -> (String, Keyboard) {
    let mut text = String::from("🎫 Your assigned tickets:\n\n");
    for (index, ticket) in tickets.iter().enumerate() {
        text.push_str(&format!(
            "{}. #{}\n   From: {}\n   Category: {}\n   Status: {}\n   Created: {}\n   Description: {}\n\n",
            index + 1,
            ticket.id,
            ticket.owner_name,
            ticket.category,
            ticket.status.to_str(),
            timestamp(&ticket.created_at),
            preview(&ticket.description, 30)
        ));
    }
    text.push_str("To view a specific ticket, use the buttons below:");

    let keyboard = tickets.iter().fold(Keyboard::new(), |kb, ticket| {
        kb.row(vec![Button::new(
            format!("Ticket #{}", ticket.id),
            CallbackAction::View(ticket.id),
        )])
    });
    (text, keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 30), "short");
        let long = "é".repeat(40);
        let cut = preview(&long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn creation_keyboard_omits_technical() {
        let keyboard = category_keyboard();
        assert!(keyboard.contains("category:General"));
        assert!(keyboard.contains("category:Bridging/IBC"));
        assert!(!keyboard.contains("category:Technical"));
        assert!(keyboard.contains("cancel"));
        assert_eq!(keyboard.inline_keyboard.len(), 6);
    }
}
