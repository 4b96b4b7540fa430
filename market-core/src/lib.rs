pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod session;
pub mod types;

pub use config::Config;
pub use context::MarketContext;
pub use error::{MarketError, Result};
pub use http::ApiClient;
pub use session::{Session, SessionHandle};
pub use types::{ChatRequest, ConversationMessage, EntityType, RequestStatus, SenderType};
