//! Backend RPC seam and its wire types.
//!
//! The linking core only talks to the backend through [`LinkBackend`], so
//! tests and alternative transports can stand in for the HTTP client.

use crate::error::BackendResult;
use crate::types::{AccountPage, ClientSecret, RawAccount};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of the `synchronize` RPC.
#[derive(Debug, Clone, Serialize)]
pub struct SynchronizeRequest {
    pub client_secret: ClientSecret,
    pub mobile: MobileOptions,
}

/// Presentation options forwarded with `synchronize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MobileOptions {
    pub fullscreen: bool,
    pub app_return_url: String,
}

impl SynchronizeRequest {
    /// Build the request for a fullscreen flow returning to `return_target`.
    pub fn new(client_secret: &ClientSecret, return_target: &url::Url) -> Self {
        Self {
            client_secret: client_secret.clone(),
            mobile: MobileOptions {
                fullscreen: true,
                app_return_url: return_target.to_string(),
            },
        }
    }
}

/// Response of the `synchronize` RPC. URLs are validated by the bootstrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SynchronizeResponse {
    pub hosted_auth_url: String,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A `{data, has_more}` list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub data: Vec<RawAccount>,
    #[serde(default)]
    pub has_more: bool,
}

impl AccountList {
    pub fn into_page(self) -> AccountPage {
        AccountPage::new(self.data, self.has_more)
    }
}

/// Response of the `session_receipt` RPC, embedding the first account page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionReceipt {
    pub id: String,
    pub accounts: AccountList,
}

/// Black-box RPC client for the linking backend.
///
/// Implementations perform no retries; callers re-invoke the whole flow.
#[async_trait]
pub trait LinkBackend: Send + Sync {
    /// Initialize a linking session.
    async fn synchronize(&self, request: &SynchronizeRequest) -> BackendResult<SynchronizeResponse>;

    /// Fetch the session receipt with the first page of accounts.
    async fn session_receipt(&self, client_secret: &ClientSecret) -> BackendResult<SessionReceipt>;

    /// Fetch the page of accounts following `starting_after`.
    async fn list_accounts(
        &self,
        client_secret: &ClientSecret,
        starting_after: Option<&str>,
    ) -> BackendResult<AccountList>;
}
