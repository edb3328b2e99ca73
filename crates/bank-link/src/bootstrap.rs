//! Session bootstrap: the `synchronize` RPC.

use crate::backend::{LinkBackend, SynchronizeRequest};
use crate::error::{BackendError, BankLinkResult, LinkError};
use crate::types::{ClientSecret, SessionDescriptor};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Turns a client secret and return target into a [`SessionDescriptor`].
pub struct SessionBootstrapper {
    backend: Arc<dyn LinkBackend>,
}

impl SessionBootstrapper {
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self { backend }
    }

    /// Initialize the linking session with one RPC call. No retries.
    pub async fn synchronize(
        &self,
        client_secret: &ClientSecret,
        return_target: &Url,
    ) -> BankLinkResult<SessionDescriptor> {
        let request = SynchronizeRequest::new(client_secret, return_target);

        let response = self.backend.synchronize(&request).await.map_err(|e| {
            warn!(error = %e, "Session bootstrap RPC failed");
            LinkError::BootstrapFailed(e)
        })?;

        let descriptor = parse_descriptor(
            &response.hosted_auth_url,
            &response.success_url,
            &response.cancel_url,
            response.session_id,
        )
        .map_err(|e| {
            warn!(error = %e, "Session bootstrap returned an invalid URL");
            LinkError::BootstrapFailed(e)
        })?;

        info!(
            session_id = descriptor.session_id.as_deref().unwrap_or(""),
            "Linking session bootstrapped"
        );
        Ok(descriptor)
    }
}

fn parse_descriptor(
    hosted_auth_url: &str,
    success_url: &str,
    cancel_url: &str,
    session_id: Option<String>,
) -> Result<SessionDescriptor, BackendError> {
    Ok(SessionDescriptor {
        hosted_auth_url: Url::parse(hosted_auth_url)?,
        success_target: Url::parse(success_url)?,
        cancel_target: Url::parse(cancel_url)?,
        session_id,
    })
}
