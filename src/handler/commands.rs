// handler/commands.rs

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Ticket,
    Cancel,
    MyTicket,
    MyTickets,
    Reply(String),
    Resolve,
}

impl Command {
    /// `name` is already lowercased and stripped of any `@bot` suffix.
    pub fn parse(name: &str, args: &str) -> Option<Self> {
        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "ticket" => Some(Command::Ticket),
            "cancel" => Some(Command::Cancel),
            "myticket" => Some(Command::MyTicket),
            "mytickets" => Some(Command::MyTickets),
            "reply" => Some(Command::Reply(args.to_string())),
            "resolve" => Some(Command::Resolve),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands() {
        assert_eq!(Command::parse("mytickets", ""), Some(Command::MyTickets));
        assert_eq!(
            Command::parse("reply", "on my way"),
            Some(Command::Reply("on my way".into()))
        );
        assert_eq!(Command::parse("escalate", ""), None);
    }
}
