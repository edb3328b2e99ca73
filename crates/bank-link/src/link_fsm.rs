//! Link lifecycle state machine using rust-fsm.
//!
//! One machine is driven per `link()` call.
//!
//! ## State Diagram
//!
//! ```text
//!      Idle
//!       │ Start
//!       ▼
//!  Bootstrapping ── BootstrapFailed ──────────────────────────► Failed
//!       │ Bootstrapped                                            ▲
//!       ▼                                                         │
//!  Authenticating ── AuthFailed ──────────────────────────────────┤
//!       │    └────── UserCanceled ──► Canceled                    │
//!       │ Redirected                                              │
//!       ▼                                                         │
//!    Syncing ─────── SyncFailed ──────────────────────────────────┤
//!       │ AccountsFetched                                         │
//!       ▼                                                         │
//!  Reconciling ───── NothingLinkable ─────────────────────────────┘
//!       │ AccountSelected
//!       ▼
//!   Completed
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub link_machine(Idle)

    Idle => {
        Start => Bootstrapping
    },
    Bootstrapping => {
        Bootstrapped => Authenticating,
        BootstrapFailed => Failed
    },
    Authenticating => {
        Redirected => Syncing,
        UserCanceled => Canceled,
        AuthFailed => Failed
    },
    Syncing => {
        AccountsFetched => Reconciling,
        SyncFailed => Failed
    },
    Reconciling => {
        AccountSelected => Completed,
        NothingLinkable => Failed
    }
}

pub use link_machine::Input as LinkMachineInput;
pub use link_machine::State as LinkMachineState;
pub use link_machine::StateMachine as LinkMachine;

/// Link lifecycle state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Idle,
    Bootstrapping,
    Authenticating,
    Syncing,
    Reconciling,
    Completed,
    Canceled,
    Failed,
}

impl LinkState {
    /// Returns true once the call has produced its result.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LinkState::Completed | LinkState::Canceled | LinkState::Failed
        )
    }
}

impl From<&LinkMachineState> for LinkState {
    fn from(state: &LinkMachineState) -> Self {
        match state {
            LinkMachineState::Idle => LinkState::Idle,
            LinkMachineState::Bootstrapping => LinkState::Bootstrapping,
            LinkMachineState::Authenticating => LinkState::Authenticating,
            LinkMachineState::Syncing => LinkState::Syncing,
            LinkMachineState::Reconciling => LinkState::Reconciling,
            LinkMachineState::Completed => LinkState::Completed,
            LinkMachineState::Canceled => LinkState::Canceled,
            LinkMachineState::Failed => LinkState::Failed,
        }
    }
}

/// Payload for link state change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStateChangedPayload {
    pub state: LinkState,
    /// Backend session id, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Callback invoked on every link state change.
pub type LinkStateCallback = Box<dyn Fn(LinkStateChangedPayload) + Send + Sync>;
