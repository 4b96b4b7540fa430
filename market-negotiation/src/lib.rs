pub mod api;
pub mod service;
pub mod status;

pub use api::{HttpNegotiationApi, NegotiationApi};
pub use service::{sort_by_activity, NegotiationService};
pub use status::{available_actions, can_transition, is_chat_disabled, InboxFilter, SellerAction};
