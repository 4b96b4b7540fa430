use serde::Deserialize;
use std::sync::Arc;
use tracing;

use crate::config::Config;
use crate::error::Result;
use crate::http::ApiClient;
use crate::session::SessionHandle;

#[derive(Clone)]
pub struct MarketContext {
    pub config: Arc<Config>,
    pub session: SessionHandle,
    pub api: ApiClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SellerProfile {
    seller_id: Option<i64>,
}

impl MarketContext {
    /// Builds the context and restores the persisted session from the config.
    pub fn new(config: Config) -> Result<Self> {
        let session = SessionHandle::new();
        session.restore(config.session.clone());
        let api = ApiClient::new(&config.api, session.clone())?;

        Ok(MarketContext {
            config: Arc::new(config),
            session,
            api,
        })
    }

    /// Looks up the seller profile of a user. Failures are logged and yield
    /// `None`; a missing seller profile never blocks sign-in.
    pub async fn resolve_seller_id(&self, user_id: i64) -> Option<i64> {
        let path = format!("{}/{}", self.config.negotiation.sellers_path, user_id);
        match self.api.get_json::<SellerProfile>(&path, &[]).await {
            Ok(profile) => {
                tracing::debug!("Resolved seller {:?} for user {}", profile.seller_id, user_id);
                profile.seller_id
            }
            Err(e) => {
                tracing::warn!("Failed to resolve sellerId for user {}: {}", user_id, e);
                if self.session.has_role("SELLER") {
                    tracing::warn!("User {} has SELLER role but no sellerId found", user_id);
                }
                None
            }
        }
    }

    /// Resolves the seller id of the signed-in user and stores it on the session.
    pub async fn refresh_seller_id(&self) -> Option<i64> {
        let user_id = self.session.current()?.user_id?;
        let seller_id = self.resolve_seller_id(user_id).await;
        self.session.set_seller_id(seller_id);
        seller_id
    }
}
