//! Bank account linking for host applications.
//!
//! This crate provides:
//! - Single-flight, cancelable browser auth sessions with redirect classification
//! - Session bootstrap and capped, cursor-paginated account synchronization
//! - Reconciliation of backend account shapes into one normalized result
//! - An orchestrator driving the whole flow through an explicit FSM
//! - A reqwest-based backend client and a loopback redirect listener

mod auth_session;
mod backend;
mod bootstrap;
mod error;
mod http_backend;
mod link_fsm;
mod loopback;
mod orchestrator;
mod reconcile;
mod redirect;
mod sync;
mod types;

pub use auth_session::{
    AuthFlow, AuthFlowRequest, AuthSessionManager, PresentationContext, RedirectOutcome,
};
pub use backend::{
    AccountList, LinkBackend, MobileOptions, SessionReceipt, SynchronizeRequest,
    SynchronizeResponse,
};
pub use bootstrap::SessionBootstrapper;
pub use error::{AuthFlowError, BackendError, BackendResult, BankLinkResult, LinkError};
pub use http_backend::{HttpLinkBackend, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use link_fsm::link_machine;
pub use link_fsm::{
    LinkMachine, LinkMachineInput, LinkMachineState, LinkState, LinkStateCallback,
    LinkStateChangedPayload,
};
pub use loopback::{LoopbackAuthFlow, DEFAULT_LOOPBACK_TIMEOUT_SECS};
pub use orchestrator::LinkOrchestrator;
pub use reconcile::{reconcile, reconcile_all};
pub use redirect::{classify_redirect, linked_account_id, matches_target, RedirectKind};
pub use sync::{AccountSynchronizer, SyncedAccounts, MAX_ACCOUNTS};
pub use types::{
    AccountPage, AuthOutcome, ClientSecret, LinkResult, LinkedBank, RawAccount, SessionDescriptor,
};
