//! Bank linking error types.

use thiserror::Error;
use url::Url;

/// Failure of the backend RPC transport or of decoding its responses.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success HTTP status.
    #[error("Backend error: {status} - {message}")]
    Api {
        /// The HTTP status code returned by the backend.
        status: u16,
        /// Summary of the response body.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL in a response (or the configured base URL) did not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Backend reported more accounts but the cursor did not move.
    #[error("Pagination cursor did not advance after {accumulated} accounts")]
    StalledCursor { accumulated: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Returns true if re-invoking the operation may succeed.
    ///
    /// Transient errors include connection failures, timeouts and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            BackendError::Api { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

/// Result type alias using BackendError.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by, or while classifying, the external auth flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFlowError {
    /// Flow finished on a URL that is neither the success nor the cancel target.
    #[error("Unexpected redirect: {0}")]
    UnexpectedRedirect(Url),

    /// Flow broke while running (listener died, browser session errored).
    #[error("Auth flow transport error: {0}")]
    Transport(String),

    /// Flow did not reach a terminal URL in time.
    #[error("Auth flow timed out")]
    Timeout,

    /// Flow refused to launch at all.
    #[error("Auth flow refused to start: {0}")]
    StartRefused(String),
}

/// Error taxonomy for the linking flow.
///
/// User cancellation is not represented here; it is `LinkResult::Canceled`.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Another auth session is active on the same manager.
    #[error("An authentication session is already being presented")]
    AlreadyPresenting,

    /// No host is available to anchor the browser flow.
    #[error("No presentation context available")]
    NoPresentationContext,

    /// The platform refused to launch the browser flow.
    #[error("Auth flow cannot start: {0}")]
    CannotStart(String),

    /// Session bootstrap RPC failed.
    #[error("Session bootstrap failed: {0}")]
    BootstrapFailed(#[source] BackendError),

    /// Account synchronization failed at some page.
    #[error("Account synchronization failed: {0}")]
    SyncFailed(#[source] BackendError),

    /// Authentication succeeded but no fetched account could be reconciled.
    #[error("No linkable account returned")]
    NoLinkableAccount,

    /// The auth flow ended in failure.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFlowError),

    /// Invalid state transition in the link FSM
    #[error("Invalid link state transition: {0}")]
    InvalidStateTransition(String),
}

impl LinkError {
    /// Returns true if re-invoking the whole link call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LinkError::BootstrapFailed(e) | LinkError::SyncFailed(e) => e.is_transient(),
            LinkError::Auth(AuthFlowError::Timeout) => true,
            _ => false,
        }
    }
}

/// Result type alias using LinkError.
pub type BankLinkResult<T> = Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_api_5xx_is_transient() {
        let err = BackendError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_api_4xx_is_not_transient() {
        let err = BackendError::Api {
            status: 400,
            message: "bad request".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_stalled_cursor_is_not_transient() {
        assert!(!BackendError::StalledCursor { accumulated: 3 }.is_transient());
    }

    #[test]
    fn test_sync_failed_chains_cause() {
        let err = LinkError::SyncFailed(BackendError::StalledCursor { accumulated: 7 });
        let source = err.source().expect("cause should be chained");
        assert!(source.to_string().contains("7 accounts"));
    }

    #[test]
    fn test_link_error_transience_follows_cause() {
        let transient = LinkError::BootstrapFailed(BackendError::Api {
            status: 502,
            message: String::new(),
        });
        assert!(transient.is_transient());
        assert!(LinkError::Auth(AuthFlowError::Timeout).is_transient());
        assert!(!LinkError::NoLinkableAccount.is_transient());
        assert!(!LinkError::AlreadyPresenting.is_transient());
    }

    #[test]
    fn test_auth_flow_error_converts_into_link_error() {
        let err: LinkError = AuthFlowError::Transport("listener closed".to_string()).into();
        assert!(matches!(err, LinkError::Auth(AuthFlowError::Transport(_))));
    }
}
