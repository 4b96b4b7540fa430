use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing;

use crate::config::ApiConfig;
use crate::error::{MarketError, Result};
use crate::session::SessionHandle;

/// JSON-over-HTTP client for the marketplace backend.
///
/// Attaches the bearer token of the current session and invalidates the
/// session whenever the backend answers 401.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: SessionHandle) -> Result<Self> {
        tracing::info!("Initializing API client for {}", config.base_url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(self.client.get(self.url(path)).query(query)).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.client.post(self.url(path))).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        self.execute(self.client.post(self.url(path)).multipart(form)).await
    }

    pub async fn patch_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(self.client.patch(self.url(path)).query(query)).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let builder = match self.session.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Request to backend failed: {}", e);
            MarketError::Network(e.to_string())
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await.map_err(MarketError::from)?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend rejected credentials for {}", url);
            self.session.invalidate();
            return Err(MarketError::Unauthorized);
        }

        if !status.is_success() {
            tracing::debug!("Backend returned {} for {}: {}", status, url, body);
            return Err(MarketError::from_status(status.as_u16(), &body));
        }

        tracing::debug!("Backend returned {} for {} ({} bytes)", status, url, body.len());
        serde_json::from_str(&body).map_err(MarketError::from)
    }
}
