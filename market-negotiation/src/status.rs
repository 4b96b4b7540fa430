//! Chat request lifecycle rules.
//!
//! ```text
//! PENDING        -> IN_NEGOTIATION | REJECTED
//! IN_NEGOTIATION -> ACCEPTED | REJECTED | COMPLETED
//! ACCEPTED       -> COMPLETED | REJECTED
//! ```
//!
//! REJECTED and COMPLETED are terminal: no transitions, no messages.

use market_core::{ChatRequest, RequestStatus};
use serde::{Deserialize, Serialize};

/// Whether `from -> to` is an edge of the lifecycle graph.
/// Self-transitions are never allowed.
pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
    use market_core::RequestStatus::*;

    match (from, to) {
        (Rejected, _) | (Completed, _) => false,

        (Pending, InNegotiation) | (Pending, Rejected) => true,
        (Pending, _) => false,

        (InNegotiation, Accepted) | (InNegotiation, Rejected) | (InNegotiation, Completed) => true,
        (InNegotiation, _) => false,

        (Accepted, Completed) | (Accepted, Rejected) => true,
        (Accepted, _) => false,
    }
}

/// Message composition is read-only once a negotiation has ended.
pub fn is_chat_disabled(status: RequestStatus) -> bool {
    status.is_terminal()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellerAction {
    StartNegotiation,
    CompleteDeal,
    Reject,
}

impl SellerAction {
    pub fn target(self) -> RequestStatus {
        match self {
            SellerAction::StartNegotiation => RequestStatus::InNegotiation,
            SellerAction::CompleteDeal => RequestStatus::Completed,
            SellerAction::Reject => RequestStatus::Rejected,
        }
    }
}

/// Actions offered to the seller for a request in `status`.
pub fn available_actions(status: RequestStatus) -> &'static [SellerAction] {
    match status {
        RequestStatus::Pending => &[SellerAction::StartNegotiation, SellerAction::Reject],
        RequestStatus::InNegotiation | RequestStatus::Accepted => {
            &[SellerAction::CompleteDeal, SellerAction::Reject]
        }
        RequestStatus::Rejected | RequestStatus::Completed => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InboxFilter {
    #[default]
    All,
    /// Still open: PENDING or IN_NEGOTIATION.
    Active,
    Closed,
}

impl InboxFilter {
    pub fn matches(self, request: &ChatRequest) -> bool {
        match self {
            InboxFilter::All => true,
            InboxFilter::Active => matches!(
                request.status,
                RequestStatus::Pending | RequestStatus::InNegotiation
            ),
            InboxFilter::Closed => matches!(
                request.status,
                RequestStatus::Accepted | RequestStatus::Rejected | RequestStatus::Completed
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::RequestStatus::*;

    const ALL: [RequestStatus; 5] = [Pending, InNegotiation, Accepted, Rejected, Completed];

    #[test]
    fn test_transition_table() {
        let allowed: Vec<(RequestStatus, RequestStatus)> = ALL
            .iter()
            .flat_map(|&from| ALL.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| can_transition(from, to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (Pending, InNegotiation),
                (Pending, Rejected),
                (InNegotiation, Accepted),
                (InNegotiation, Rejected),
                (InNegotiation, Completed),
                (Accepted, Rejected),
                (Accepted, Completed),
            ]
        );
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        for from in [Rejected, Completed] {
            assert!(is_chat_disabled(from));
            assert!(available_actions(from).is_empty());
            assert!(ALL.iter().all(|&to| !can_transition(from, to)));
        }
        assert!(!is_chat_disabled(Accepted));
    }

    #[test]
    fn test_offered_actions_are_valid_transitions() {
        for status in ALL {
            for action in available_actions(status) {
                assert!(can_transition(status, action.target()), "{:?} from {}", action, status);
            }
        }
        assert_eq!(
            available_actions(Pending),
            &[SellerAction::StartNegotiation, SellerAction::Reject]
        );
    }
}
