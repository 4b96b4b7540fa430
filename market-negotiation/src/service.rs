use market_core::{ChatRequest, MarketContext, MarketError, RequestStatus, Result, SenderType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing;

use crate::api::{HttpNegotiationApi, NegotiationApi};
use crate::status::{can_transition, InboxFilter};

/// Client side of the negotiation workflow.
///
/// Rules are checked against the cached copy of a request before anything is
/// sent; the backend stays the authority and every response overwrites the
/// cached copy wholesale.
#[derive(Clone)]
pub struct NegotiationService {
    api: Arc<dyn NegotiationApi>,
    cache: Arc<RwLock<HashMap<i64, ChatRequest>>>,
}

impl NegotiationService {
    pub fn new(ctx: &MarketContext) -> Self {
        Self::with_api(Arc::new(HttpNegotiationApi::new(ctx)))
    }

    pub fn with_api(api: Arc<dyn NegotiationApi>) -> Self {
        Self {
            api,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn cached(&self, request_id: i64) -> Option<ChatRequest> {
        self.cache.read().get(&request_id).cloned()
    }

    /// Cached requests matching `filter`, latest activity first.
    pub fn inbox(&self, filter: InboxFilter) -> Vec<ChatRequest> {
        let mut requests: Vec<ChatRequest> = self
            .cache
            .read()
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        sort_by_activity(&mut requests);
        requests
    }

    pub async fn load_buyer_requests(&self, buyer_id: i64) -> Result<Vec<ChatRequest>> {
        let mut requests = self.api.list_for_buyer(buyer_id).await?;
        self.replace_where(|cached| cached.buyer_id == buyer_id, &requests);
        sort_by_activity(&mut requests);
        tracing::info!("Loaded {} chat requests for buyer {}", requests.len(), buyer_id);
        Ok(requests)
    }

    pub async fn load_listing_requests(&self, listing_id: i64) -> Result<Vec<ChatRequest>> {
        let mut requests = self.api.list_for_listing(listing_id).await?;
        self.replace_where(|cached| cached.listing_id == listing_id, &requests);
        sort_by_activity(&mut requests);
        tracing::info!("Loaded {} chat requests for listing {}", requests.len(), listing_id);
        Ok(requests)
    }

    /// There is no single-request endpoint; the owning collection is fetched
    /// and filtered.
    pub async fn buyer_request(&self, buyer_id: i64, request_id: i64) -> Result<ChatRequest> {
        let requests = self.load_buyer_requests(buyer_id).await?;
        find_request(requests, request_id)
    }

    pub async fn seller_request(&self, listing_id: i64, request_id: i64) -> Result<ChatRequest> {
        let requests = self.load_listing_requests(listing_id).await?;
        find_request(requests, request_id)
    }

    pub async fn create_request(&self, listing_id: i64, buyer_user_id: i64, message: &str) -> Result<ChatRequest> {
        let message = validate_message(message)?;
        let created = self.api.create(listing_id, buyer_user_id, message).await?;
        tracing::info!(
            "Created chat request {} for listing {} by buyer {}",
            created.request_id,
            listing_id,
            buyer_user_id
        );
        self.store(created.clone());
        Ok(created)
    }

    /// Appends a message to an open negotiation. A seller replying to a
    /// PENDING request moves it to IN_NEGOTIATION first.
    pub async fn send_message(
        &self,
        request_id: i64,
        sender_id: i64,
        sender_type: SenderType,
        text: &str,
    ) -> Result<ChatRequest> {
        let current = self.current(request_id)?;
        if current.status.is_terminal() {
            return Err(MarketError::InvalidState {
                request_id,
                status: current.status,
            });
        }
        let text = validate_message(text)?;

        if sender_type == SenderType::Seller && current.status == RequestStatus::Pending {
            tracing::info!("Seller {} opened negotiation on request {}", sender_id, request_id);
            let opened = self.api.patch_status(request_id, RequestStatus::InNegotiation).await?;
            self.store(opened);
        }

        let updated = self.api.post_message(request_id, sender_id, text).await?;
        tracing::debug!(
            "Message from {:?} {} recorded on request {} ({} messages)",
            sender_type,
            sender_id,
            request_id,
            updated.conversation.len()
        );
        self.store(updated.clone());
        Ok(updated)
    }

    pub async fn update_status(&self, request_id: i64, target: RequestStatus) -> Result<ChatRequest> {
        let current = self.current(request_id)?;
        if !can_transition(current.status, target) {
            return Err(MarketError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }

        if target == RequestStatus::Completed {
            return self.complete_deal(request_id).await;
        }

        let updated = self.api.patch_status(request_id, target).await?;
        tracing::info!("Request {} moved from {} to {}", request_id, current.status, updated.status);
        self.store(updated.clone());
        Ok(updated)
    }

    /// Completes the deal and re-reads the listing's other requests, which
    /// the backend rejects as part of the same call.
    pub async fn complete_deal(&self, request_id: i64) -> Result<ChatRequest> {
        let current = self.current(request_id)?;
        if !can_transition(current.status, RequestStatus::Completed) {
            return Err(MarketError::InvalidTransition {
                from: current.status,
                to: RequestStatus::Completed,
            });
        }

        let completed = self.api.complete(request_id).await?;
        tracing::info!("Deal completed on request {} for listing {}", request_id, completed.listing_id);
        self.store(completed.clone());

        if let Err(e) = self.load_listing_requests(completed.listing_id).await {
            tracing::warn!(
                "Failed to refresh requests of listing {} after completing {}: {}",
                completed.listing_id,
                request_id,
                e
            );
        }

        Ok(completed)
    }

    fn current(&self, request_id: i64) -> Result<ChatRequest> {
        self.cached(request_id)
            .ok_or_else(|| MarketError::NotFound(format!("chat request {}", request_id)))
    }

    fn store(&self, request: ChatRequest) {
        self.cache.write().insert(request.request_id, request);
    }

    fn replace_where(&self, owned: impl Fn(&ChatRequest) -> bool, fresh: &[ChatRequest]) {
        let mut cache = self.cache.write();
        cache.retain(|_, cached| !owned(cached));
        for request in fresh {
            cache.insert(request.request_id, request.clone());
        }
    }
}

/// Latest activity first; ties keep their order.
pub fn sort_by_activity(requests: &mut [ChatRequest]) {
    requests.sort_by(|a, b| b.last_activity_millis().cmp(&a.last_activity_millis()));
}

fn find_request(requests: Vec<ChatRequest>, request_id: i64) -> Result<ChatRequest> {
    requests
        .into_iter()
        .find(|request| request.request_id == request_id)
        .ok_or_else(|| MarketError::NotFound(format!("chat request {}", request_id)))
}

fn validate_message(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MarketError::validation("message must not be empty"));
    }
    Ok(trimmed)
}
