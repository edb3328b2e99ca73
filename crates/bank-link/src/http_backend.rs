//! HTTP client for the linking backend.

use crate::backend::{AccountList, LinkBackend, SessionReceipt, SynchronizeRequest, SynchronizeResponse};
use crate::error::{BackendError, BackendResult};
use crate::types::ClientSecret;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, error};

/// Per-request timeout applied to every backend call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// [`LinkBackend`] over HTTPS with a publishable bearer key.
#[derive(Clone)]
pub struct HttpLinkBackend {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
}

impl HttpLinkBackend {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `api_url` - Base URL of the backend (e.g., `https://api.bank-link.dev`)
    /// * `publishable_key` - Public API key sent as the bearer token
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> BackendResult<Self> {
        let api_url = api_url.into();
        let scheme = url::Url::parse(&api_url)?.scheme().to_string();
        if scheme != "https" && scheme != "http" {
            return Err(BackendError::Config(format!(
                "api_url must be an http(s) URL, got scheme '{}'",
                scheme
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(http_client, api_url, publishable_key))
    }

    /// Create a backend client around an existing reqwest client.
    pub fn with_client(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        publishable_key: impl Into<String>,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            api_url,
            publishable_key: publishable_key.into(),
        }
    }

    /// Build the URL for a link-account-session RPC.
    fn rpc_url(&self, method: &str) -> String {
        format!("{}/v1/link_account_sessions/{}", self.api_url, method)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, rpc: &str) -> BackendResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body_summary = summarize_response_body(&body);
            error!(rpc, status = %status, body_summary = %body_summary, "Backend RPC failed");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: format!("{} failed ({})", rpc, body_summary),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(rpc, body_summary = %summarize_response_body(&body), "Failed to decode backend response: {}", e);
            BackendError::Json(e)
        })
    }
}

#[async_trait]
impl LinkBackend for HttpLinkBackend {
    async fn synchronize(&self, request: &SynchronizeRequest) -> BackendResult<SynchronizeResponse> {
        debug!("Calling synchronize");

        let response = self
            .http_client
            .post(self.rpc_url("synchronize"))
            .bearer_auth(&self.publishable_key)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        Self::decode(response, "synchronize").await
    }

    async fn session_receipt(&self, client_secret: &ClientSecret) -> BackendResult<SessionReceipt> {
        debug!("Fetching session receipt");

        let response = self
            .http_client
            .get(self.rpc_url("session_receipt"))
            .bearer_auth(&self.publishable_key)
            .header("Accept", "application/json")
            .query(&[("client_secret", client_secret.as_str())])
            .send()
            .await?;

        Self::decode(response, "session_receipt").await
    }

    async fn list_accounts(
        &self,
        client_secret: &ClientSecret,
        starting_after: Option<&str>,
    ) -> BackendResult<AccountList> {
        debug!(starting_after = ?starting_after, "Listing accounts");

        let mut query = vec![("client_secret", client_secret.as_str())];
        if let Some(cursor) = starting_after {
            query.push(("starting_after", cursor));
        }

        let response = self
            .http_client
            .get(self.rpc_url("list_accounts"))
            .bearer_auth(&self.publishable_key)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await?;

        Self::decode(response, "list_accounts").await
    }
}
