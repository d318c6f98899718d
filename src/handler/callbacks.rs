// handler/callbacks.rs
use std::fmt;

use uuid::Uuid;

use crate::models::ticketmodel::TicketCategory;

/// Button payloads. Ticket-scoped actions carry the ticket id after `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Category(TicketCategory),
    Cancel,
    Back,
    Skip,
    Confirm,
    Claim(Uuid),
    View(Uuid),
    Resolve(Uuid),
    Reply(Uuid),
    CancelTicket(Uuid),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let (tag, value) = match data.split_once(':') {
            Some((tag, value)) => (tag, Some(value)),
            None => (data, None),
        };
        let ticket = || value.and_then(|v| Uuid::parse_str(v).ok());

        match (tag, value) {
            ("cancel", None) => Some(CallbackAction::Cancel),
            ("back", None) => Some(CallbackAction::Back),
            ("skip", None) => Some(CallbackAction::Skip),
            ("confirm", None) => Some(CallbackAction::Confirm),
            ("category", Some(label)) => TicketCategory::from_label(label).map(CallbackAction::Category),
            ("claim", Some(_)) => ticket().map(CallbackAction::Claim),
            ("view", Some(_)) => ticket().map(CallbackAction::View),
            ("resolve", Some(_)) => ticket().map(CallbackAction::Resolve),
            ("reply", Some(_)) => ticket().map(CallbackAction::Reply),
            ("cancel_ticket", Some(_)) => ticket().map(CallbackAction::CancelTicket),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Category(category) => write!(f, "category:{}", category),
            CallbackAction::Cancel => f.write_str("cancel"),
            CallbackAction::Back => f.write_str("back"),
            CallbackAction::Skip => f.write_str("skip"),
            CallbackAction::Confirm => f.write_str("confirm"),
            CallbackAction::Claim(id) => write!(f, "claim:{}", id),
            CallbackAction::View(id) => write!(f, "view:{}", id),
            CallbackAction::Resolve(id) => write!(f, "resolve:{}", id),
            CallbackAction::Reply(id) => write!(f, "reply:{}", id),
            CallbackAction::CancelTicket(id) => write!(f, "cancel_ticket:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_tag() {
        let id = Uuid::new_v4();
        for action in [
            CallbackAction::Category(TicketCategory::ViewingKeys),
            CallbackAction::Cancel,
            CallbackAction::Back,
            CallbackAction::Skip,
            CallbackAction::Confirm,
            CallbackAction::Claim(id),
            CallbackAction::View(id),
            CallbackAction::Resolve(id),
            CallbackAction::Reply(id),
            CallbackAction::CancelTicket(id),
        ] {
            assert_eq!(CallbackAction::parse(&action.to_string()), Some(action));
        }
    }

    #[test]
    fn technical_is_accepted_though_not_offered() {
        assert_eq!(
            CallbackAction::parse("category:Technical"),
            Some(CallbackAction::Category(TicketCategory::Technical))
        );
    }

    #[test]
    fn unknown_or_malformed_tags_are_rejected() {
        assert_eq!(CallbackAction::parse("escalate:123"), None);
        assert_eq!(CallbackAction::parse("claim:not-a-uuid"), None);
        assert_eq!(CallbackAction::parse("claim"), None);
        assert_eq!(CallbackAction::parse("category:Billing"), None);
        assert_eq!(CallbackAction::parse("cancel:extra"), None);
    }
}
