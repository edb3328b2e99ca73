//! Single-flight external authentication session.
//!
//! The [`AuthSessionManager`] presents at most one browser-backed flow at a
//! time through an [`AuthFlow`] and classifies where the flow landed.

use crate::error::{AuthFlowError, BankLinkResult, LinkError};
use crate::redirect::{classify_redirect, RedirectKind};
use crate::types::{AuthOutcome, SessionDescriptor};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Host surface able to show the hosted auth page to the user.
pub trait PresentationContext: Send + Sync {
    /// Whether the host can currently present anything (e.g., not backgrounded).
    fn is_available(&self) -> bool {
        true
    }

    /// Hand the hosted auth URL to the user-facing browser.
    fn open_url(&self, url: &Url) -> std::io::Result<()>;
}

/// Parameters for launching one browser-backed flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFlowRequest {
    pub url: Url,
    /// Scheme the flow should intercept when navigating back to the host.
    pub callback_scheme: String,
    pub success_target: Url,
    pub cancel_target: Url,
}

/// What the platform flow reported when it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The flow navigated to a URL with the callback scheme.
    Redirected(Url),
    /// The user dismissed the flow.
    UserCanceled,
}

/// Platform primitive driving a browser-backed authentication session.
#[async_trait]
pub trait AuthFlow: Send + Sync {
    /// Run the flow to its terminal URL.
    ///
    /// Returns `Err(AuthFlowError::StartRefused)` if the flow could not be
    /// launched at all.
    async fn start(
        &self,
        request: AuthFlowRequest,
        context: &dyn PresentationContext,
    ) -> Result<RedirectOutcome, AuthFlowError>;

    /// Tear down a running flow. Called when the awaiting caller goes away.
    fn cancel(&self);
}

/// Presents one external auth flow at a time.
pub struct AuthSessionManager {
    flow: Arc<dyn AuthFlow>,
    active: AtomicBool,
}

/// Holds the single-flight slot for the duration of one `present` call.
struct ActiveSession<'a> {
    active: &'a AtomicBool,
    flow: &'a dyn AuthFlow,
    launched: bool,
    settled: bool,
}

impl<'a> ActiveSession<'a> {
    fn claim(active: &'a AtomicBool, flow: &'a dyn AuthFlow) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            active,
            flow,
            launched: false,
            settled: false,
        })
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        if self.launched && !self.settled {
            warn!("Auth session abandoned before completion, cancelling flow");
            self.flow.cancel();
        }
        self.active.store(false, Ordering::Release);
    }
}

impl AuthSessionManager {
    pub fn new(flow: Arc<dyn AuthFlow>) -> Self {
        Self {
            flow,
            active: AtomicBool::new(false),
        }
    }

    /// Whether a session is currently being presented.
    pub fn is_presenting(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Present the hosted auth flow and classify its terminal outcome.
    ///
    /// Fails fast with `AlreadyPresenting` while another call is active,
    /// `NoPresentationContext` without a usable host, and `CannotStart` if
    /// the flow refuses to launch. The slot is released on every exit path,
    /// including when the returned future is dropped mid-flow.
    pub async fn present(
        &self,
        descriptor: &SessionDescriptor,
        context: Option<&dyn PresentationContext>,
    ) -> BankLinkResult<AuthOutcome> {
        let mut session = ActiveSession::claim(&self.active, self.flow.as_ref()).ok_or_else(|| {
            warn!("Rejected auth presentation: another session is active");
            LinkError::AlreadyPresenting
        })?;

        let context = match context {
            Some(context) if context.is_available() => context,
            _ => {
                warn!("No presentation context available for auth session");
                return Err(LinkError::NoPresentationContext);
            }
        };

        let request = AuthFlowRequest {
            url: descriptor.hosted_auth_url.clone(),
            callback_scheme: descriptor.success_target.scheme().to_string(),
            success_target: descriptor.success_target.clone(),
            cancel_target: descriptor.cancel_target.clone(),
        };

        info!(
            host = descriptor.hosted_auth_url.host_str().unwrap_or(""),
            "Presenting auth session"
        );

        session.launched = true;
        let result = self.flow.start(request, context).await;
        session.settled = true;

        let outcome = match result {
            Ok(RedirectOutcome::Redirected(url)) => {
                match classify_redirect(&url, &descriptor.success_target, &descriptor.cancel_target) {
                    RedirectKind::Success => AuthOutcome::Redirected(url),
                    RedirectKind::Cancel => AuthOutcome::Canceled,
                    RedirectKind::Unrecognized => {
                        AuthOutcome::Failed(AuthFlowError::UnexpectedRedirect(url))
                    }
                }
            }
            Ok(RedirectOutcome::UserCanceled) => AuthOutcome::Canceled,
            Err(AuthFlowError::StartRefused(reason)) => {
                warn!(reason = %reason, "Auth flow refused to start");
                return Err(LinkError::CannotStart(reason));
            }
            Err(e) => AuthOutcome::Failed(e),
        };

        match &outcome {
            AuthOutcome::Redirected(_) => info!("Auth session redirected to success target"),
            AuthOutcome::Canceled => info!("Auth session canceled"),
            AuthOutcome::Failed(e) => warn!(error = %e, "Auth session failed"),
        }
        debug!("Releasing auth session slot");

        Ok(outcome)
    }
}
