use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing;

/// Authenticated identity of the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub buyer_id: Option<i64>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Session {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Shared, explicitly constructed session state.
///
/// Every change (restore, establish, invalidate) bumps `generation`, so a
/// holder can tell that the identity it captured earlier is gone.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
    generation: Arc<AtomicU64>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session restore on boot from persisted values.
    pub fn restore(&self, session: Option<Session>) {
        match &session {
            Some(s) => tracing::info!(
                "Restored session for user {:?} (token {})",
                s.user_id,
                mask_token(&s.access_token)
            ),
            None => tracing::info!("No persisted session to restore"),
        }
        self.replace(session);
    }

    pub fn establish(&self, session: Session) {
        tracing::info!("Session established for user {:?}", session.user_id);
        self.replace(Some(session));
    }

    /// Logout or unauthorized callback.
    pub fn invalidate(&self) {
        if self.inner.read().is_some() {
            tracing::warn!("Invalidating session");
        }
        self.replace(None);
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.inner.read().as_ref().map(|s| s.has_role(role)).unwrap_or(false)
    }

    pub fn set_seller_id(&self, seller_id: Option<i64>) {
        if let Some(session) = self.inner.write().as_mut() {
            session.seller_id = seller_id;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn replace(&self, session: Option<Session>) {
        *self.inner.write() = session;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller_session() -> Session {
        Session {
            access_token: "token-abcdef".to_string(),
            user_id: Some(5),
            seller_id: Some(11),
            buyer_id: None,
            roles: vec!["SELLER".to_string()],
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let handle = SessionHandle::new();
        assert!(!handle.is_signed_in());
        let start = handle.generation();

        handle.restore(Some(seller_session()));
        assert!(handle.is_signed_in());
        assert!(handle.has_role("seller"));
        assert_eq!(handle.bearer_token().as_deref(), Some("token-abcdef"));

        let clone = handle.clone();
        clone.invalidate();
        assert!(!handle.is_signed_in());
        assert!(handle.generation() > start + 1);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "****");
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9"), "eyJh****");
    }
}
