use async_trait::async_trait;
use market_core::{ApiClient, ChatRequest, MarketContext, RequestStatus, Result};
use reqwest::multipart::Form;
use serde::Serialize;
use tracing;

/// Chat-request endpoints of the backend. Every mutation answers with the
/// updated request.
#[async_trait]
pub trait NegotiationApi: Send + Sync {
    async fn list_for_buyer(&self, buyer_id: i64) -> Result<Vec<ChatRequest>>;

    async fn list_for_listing(&self, listing_id: i64) -> Result<Vec<ChatRequest>>;

    async fn create(&self, listing_id: i64, buyer_user_id: i64, message: &str) -> Result<ChatRequest>;

    async fn post_message(&self, request_id: i64, sender_user_id: i64, message: &str) -> Result<ChatRequest>;

    async fn patch_status(&self, request_id: i64, status: RequestStatus) -> Result<ChatRequest>;

    /// Completes the deal; the backend rejects the other requests on the listing.
    async fn complete(&self, request_id: i64) -> Result<ChatRequest>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequestBody<'a> {
    mobile_id: i64,
    buyer_user_id: i64,
    message: &'a str,
}

pub struct HttpNegotiationApi {
    api: ApiClient,
    base_path: String,
}

impl HttpNegotiationApi {
    pub fn new(ctx: &MarketContext) -> Self {
        Self {
            api: ctx.api.clone(),
            base_path: ctx.config.negotiation.requests_path.trim_end_matches('/').to_string(),
        }
    }

    fn path(&self, suffix: impl std::fmt::Display) -> String {
        format!("{}/{}", self.base_path, suffix)
    }
}

#[async_trait]
impl NegotiationApi for HttpNegotiationApi {
    async fn list_for_buyer(&self, buyer_id: i64) -> Result<Vec<ChatRequest>> {
        let requests: Vec<ChatRequest> = self.api.get_json(&self.path(format!("buyer/{}", buyer_id)), &[]).await?;
        tracing::debug!("Fetched {} chat requests for buyer {}", requests.len(), buyer_id);
        Ok(requests)
    }

    async fn list_for_listing(&self, listing_id: i64) -> Result<Vec<ChatRequest>> {
        let requests: Vec<ChatRequest> = self.api.get_json(&self.path(listing_id), &[]).await?;
        tracing::debug!("Fetched {} chat requests for listing {}", requests.len(), listing_id);
        Ok(requests)
    }

    async fn create(&self, listing_id: i64, buyer_user_id: i64, message: &str) -> Result<ChatRequest> {
        let body = CreateRequestBody {
            mobile_id: listing_id,
            buyer_user_id,
            message,
        };
        self.api.post_json(&self.path("create"), &body).await
    }

    async fn post_message(&self, request_id: i64, sender_user_id: i64, message: &str) -> Result<ChatRequest> {
        let form = Form::new()
            .text("senderUserId", sender_user_id.to_string())
            .text("message", message.to_string());
        self.api
            .post_multipart(&self.path(format!("{}/message", request_id)), form)
            .await
    }

    async fn patch_status(&self, request_id: i64, status: RequestStatus) -> Result<ChatRequest> {
        self.api
            .patch_query(
                &self.path(format!("{}/status", request_id)),
                &[("status", status.as_str().to_string())],
            )
            .await
    }

    async fn complete(&self, request_id: i64) -> Result<ChatRequest> {
        self.api.post_empty(&self.path(format!("{}/complete", request_id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Multipart, Path, Query},
        routing::{get, patch, post},
        Json, Router,
    };
    use market_core::Config;
    use std::collections::HashMap;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request_json(request_id: i64, status: &str, messages: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({
            "requestId": request_id,
            "mobileId": 42,
            "buyerId": 3,
            "sellerId": 9,
            "status": status,
            "createdAt": "2024-05-01T10:00:00",
            "updatedAt": "2024-05-02T10:00:00",
            "conversation": messages,
        })
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/v1/mobile/requests/buyer/:buyer_id",
                get(|Path(buyer_id): Path<i64>| async move {
                    assert_eq!(buyer_id, 3);
                    Json(serde_json::json!([request_json(1, "PENDING", vec![]), request_json(2, "REJECTED", vec![])]))
                }),
            )
            .route(
                "/api/v1/mobile/requests/create",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["mobileId"], 42);
                    assert_eq!(body["buyerUserId"], 3);
                    let message = serde_json::json!({
                        "senderId": 3,
                        "senderType": "BUYER",
                        "message": body["message"],
                        "timestamp": "2024-05-01T10:00:00",
                    });
                    Json(request_json(5, "PENDING", vec![message]))
                }),
            )
            .route(
                "/api/v1/mobile/requests/:id/message",
                post(|Path(id): Path<i64>, mut multipart: Multipart| async move {
                    let mut fields = HashMap::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        fields.insert(name, field.text().await.unwrap());
                    }
                    let message = serde_json::json!({
                        "senderId": fields["senderUserId"].parse::<i64>().unwrap(),
                        "senderType": "SELLER",
                        "message": fields["message"],
                        "timestamp": "2024-05-03T10:00:00",
                    });
                    Json(request_json(id, "IN_NEGOTIATION", vec![message]))
                }),
            )
            .route(
                "/api/v1/mobile/requests/:id/status",
                patch(|Path(id): Path<i64>, Query(params): Query<HashMap<String, String>>| async move {
                    Json(request_json(id, &params["status"], vec![]))
                }),
            )
            .route(
                "/api/v1/mobile/requests/:id/complete",
                post(|Path(id): Path<i64>| async move { Json(request_json(id, "COMPLETED", vec![])) }),
            )
    }

    async fn api() -> HttpNegotiationApi {
        let ctx = MarketContext::new(Config::with_base_url(spawn(backend()).await)).unwrap();
        HttpNegotiationApi::new(&ctx)
    }

    #[tokio::test]
    async fn test_list_and_create() {
        let api = api().await;

        let requests = api.list_for_buyer(3).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].status, RequestStatus::Rejected);

        let created = api.create(42, 3, "Is it available?").await.unwrap();
        assert_eq!(created.request_id, 5);
        assert_eq!(created.conversation[0].message, "Is it available?");
    }

    #[tokio::test]
    async fn test_message_is_sent_as_multipart() {
        let api = api().await;
        let updated = api.post_message(7, 9, "Lowest is 40k").await.unwrap();
        assert_eq!(updated.request_id, 7);
        assert_eq!(updated.conversation[0].sender_id, 9);
        assert_eq!(updated.conversation[0].message, "Lowest is 40k");
    }

    #[tokio::test]
    async fn test_status_and_complete() {
        let api = api().await;
        let accepted = api.patch_status(7, RequestStatus::Accepted).await.unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);

        let completed = api.complete(7).await.unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
    }
}
