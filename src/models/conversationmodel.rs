// models/conversationmodel.rs
use serde::{Deserialize, Serialize};

use super::ticketmodel::{TicketCategory, SKIPPED_TRANSACTION_REF};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStep {
    Idle,
    Category,
    Description,
    TransactionRef,
    Confirmation,
}

impl TicketStep {
    pub fn to_str(&self) -> &str {
        match self {
            TicketStep::Idle => "idle",
            TicketStep::Category => "category",
            TicketStep::Description => "description",
            TicketStep::TransactionRef => "transaction_ref",
            TicketStep::Confirmation => "confirmation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TransactionRef {
    Provided(String),
    Skipped,
}

impl TransactionRef {
    pub fn from_input(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case(SKIPPED_TRANSACTION_REF) {
            TransactionRef::Skipped
        } else {
            TransactionRef::Provided(text.to_string())
        }
    }

    pub fn provided(&self) -> Option<&str> {
        match self {
            TransactionRef::Provided(refs) => Some(refs),
            TransactionRef::Skipped => None,
        }
    }

    pub fn display(&self) -> &str {
        self.provided().unwrap_or(SKIPPED_TRANSACTION_REF)
    }
}

/// Per-user position in the ticket creation flow. Each step carries only the
/// draft fields that are known by then.
///
/// `origin` is the group chat the flow was started from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TicketFlow {
    #[default]
    Idle,
    Category {
        origin: Option<i64>,
    },
    Description {
        origin: Option<i64>,
        category: TicketCategory,
    },
    TransactionRef {
        origin: Option<i64>,
        category: TicketCategory,
        description: String,
    },
    Confirmation {
        origin: Option<i64>,
        category: TicketCategory,
        description: String,
        transaction_ref: TransactionRef,
    },
}

impl TicketFlow {
    pub fn start(origin: Option<i64>) -> Self {
        TicketFlow::Category { origin }
    }

    pub fn step(&self) -> TicketStep {
        match self {
            TicketFlow::Idle => TicketStep::Idle,
            TicketFlow::Category { .. } => TicketStep::Category,
            TicketFlow::Description { .. } => TicketStep::Description,
            TicketFlow::TransactionRef { .. } => TicketStep::TransactionRef,
            TicketFlow::Confirmation { .. } => TicketStep::Confirmation,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TicketFlow::Idle)
    }

    pub fn select_category(self, category: TicketCategory) -> Option<Self> {
        match self {
            TicketFlow::Category { origin } => Some(TicketFlow::Description { origin, category }),
            _ => None,
        }
    }

    pub fn describe(self, description: String) -> Option<Self> {
        match self {
            TicketFlow::Description { origin, category } => Some(TicketFlow::TransactionRef {
                origin,
                category,
                description,
            }),
            _ => None,
        }
    }

    pub fn attach_reference(self, transaction_ref: TransactionRef) -> Option<Self> {
        match self {
            TicketFlow::TransactionRef {
                origin,
                category,
                description,
            } => Some(TicketFlow::Confirmation {
                origin,
                category,
                description,
                transaction_ref,
            }),
            _ => None,
        }
    }

    /// One step back. Only the transaction and confirmation steps can go back;
    /// the data entered at the step being left is dropped.
    pub fn back(self) -> Option<Self> {
        match self {
            TicketFlow::TransactionRef { origin, category, .. } => {
                Some(TicketFlow::Description { origin, category })
            }
            TicketFlow::Confirmation {
                origin,
                category,
                description,
                ..
            } => Some(TicketFlow::TransactionRef {
                origin,
                category,
                description,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed() -> TicketFlow {
        TicketFlow::start(None)
            .select_category(TicketCategory::Staking)
            .and_then(|f| f.describe("rewards missing".into()))
            .and_then(|f| f.attach_reference(TransactionRef::from_input("0xabc\n0xdef")))
            .expect("flow should reach confirmation")
    }

    #[test]
    fn walks_every_step_in_order() {
        let flow = confirmed();
        assert_eq!(flow.step(), TicketStep::Confirmation);
        match flow {
            TicketFlow::Confirmation {
                category,
                description,
                transaction_ref,
                ..
            } => {
                assert_eq!(category, TicketCategory::Staking);
                assert_eq!(description, "rewards missing");
                assert_eq!(transaction_ref.provided(), Some("0xabc\n0xdef"));
            }
            other => panic!("unexpected flow {:?}", other),
        }
    }

    #[test]
    fn back_keeps_earlier_fields() {
        let back_once = confirmed().back().unwrap();
        assert_eq!(
            back_once,
            TicketFlow::TransactionRef {
                origin: None,
                category: TicketCategory::Staking,
                description: "rewards missing".into(),
            }
        );
        let back_twice = back_once.back().unwrap();
        assert_eq!(
            back_twice,
            TicketFlow::Description {
                origin: None,
                category: TicketCategory::Staking,
            }
        );
        assert!(back_twice.back().is_none());
    }

    #[test]
    fn out_of_order_inputs_are_refused() {
        assert!(TicketFlow::Idle.select_category(TicketCategory::General).is_none());
        assert!(TicketFlow::start(None).describe("x".into()).is_none());
        assert!(TicketFlow::start(None)
            .attach_reference(TransactionRef::Skipped)
            .is_none());
    }

    #[test]
    fn skip_sentinel_is_recognised() {
        assert_eq!(TransactionRef::from_input(" n/a "), TransactionRef::Skipped);
        assert_eq!(TransactionRef::Skipped.display(), "N/A");
    }

    #[test]
    fn stored_shape_is_tagged_by_step() {
        let json = serde_json::to_value(TicketFlow::start(Some(-100))).unwrap();
        assert_eq!(json, serde_json::json!({ "step": "category", "origin": -100 }));
        let idle: TicketFlow = serde_json::from_value(serde_json::json!({ "step": "idle" })).unwrap();
        assert!(idle.is_idle());
    }
}
