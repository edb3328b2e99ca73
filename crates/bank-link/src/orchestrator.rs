//! Caller-facing link flow: bootstrap, authenticate, synchronize, reconcile.

use crate::auth_session::{AuthSessionManager, PresentationContext};
use crate::backend::LinkBackend;
use crate::bootstrap::SessionBootstrapper;
use crate::error::{BankLinkResult, LinkError};
use crate::link_fsm::{LinkMachine, LinkMachineInput, LinkState, LinkStateCallback, LinkStateChangedPayload};
use crate::reconcile::reconcile_all;
use crate::redirect::linked_account_id;
use crate::sync::AccountSynchronizer;
use crate::types::{AuthOutcome, ClientSecret, LinkResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Sequences one link attempt and owns the account selection policy.
pub struct LinkOrchestrator {
    bootstrapper: SessionBootstrapper,
    auth_sessions: Arc<AuthSessionManager>,
    synchronizer: AccountSynchronizer,
    state_callback: Mutex<Option<LinkStateCallback>>,
}

/// Per-call lifecycle tracking.
struct LinkRun<'a> {
    fsm: LinkMachine,
    session_id: Option<String>,
    state_callback: &'a Mutex<Option<LinkStateCallback>>,
}

impl<'a> LinkRun<'a> {
    fn new(state_callback: &'a Mutex<Option<LinkStateCallback>>) -> Self {
        Self {
            fsm: LinkMachine::new(),
            session_id: None,
            state_callback,
        }
    }

    /// Transition the FSM and notify the callback.
    fn transition(&mut self, input: &LinkMachineInput) -> BankLinkResult<LinkState> {
        let old_state = LinkState::from(self.fsm.state());

        self.fsm.consume(input).map_err(|_| {
            LinkError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.fsm.state()
            ))
        })?;

        let new_state = LinkState::from(self.fsm.state());
        debug!(old_state = ?old_state, new_state = ?new_state, "Link state transition");

        if let Some(callback) = self.state_callback.lock().as_ref() {
            callback(LinkStateChangedPayload {
                state: new_state,
                session_id: self.session_id.clone(),
            });
        }

        Ok(new_state)
    }
}

impl LinkOrchestrator {
    pub fn new(backend: Arc<dyn LinkBackend>, auth_sessions: Arc<AuthSessionManager>) -> Self {
        Self {
            bootstrapper: SessionBootstrapper::new(backend.clone()),
            auth_sessions,
            synchronizer: AccountSynchronizer::new(backend),
            state_callback: Mutex::new(None),
        }
    }

    /// Set a callback for link state changes.
    pub fn set_state_callback(&self, callback: LinkStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    /// Run one full link attempt.
    ///
    /// Always returns exactly one of completed, canceled or failed. Nothing
    /// is retried; callers re-invoke on failure. Dropping the future cancels
    /// whichever step is in flight.
    pub async fn link(
        &self,
        client_secret: &ClientSecret,
        return_target: &Url,
        context: Option<&dyn PresentationContext>,
    ) -> LinkResult {
        let mut run = LinkRun::new(&self.state_callback);

        match self.drive(&mut run, client_secret, return_target, context).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Link flow aborted");
                LinkResult::Failed(e)
            }
        }
    }

    async fn drive(
        &self,
        run: &mut LinkRun<'_>,
        client_secret: &ClientSecret,
        return_target: &Url,
        context: Option<&dyn PresentationContext>,
    ) -> BankLinkResult<LinkResult> {
        run.transition(&LinkMachineInput::Start)?;

        let descriptor = match self.bootstrapper.synchronize(client_secret, return_target).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                run.transition(&LinkMachineInput::BootstrapFailed)?;
                return Ok(LinkResult::Failed(e));
            }
        };
        run.session_id = descriptor.session_id.clone();
        run.transition(&LinkMachineInput::Bootstrapped)?;

        let outcome = match self.auth_sessions.present(&descriptor, context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                run.transition(&LinkMachineInput::AuthFailed)?;
                return Ok(LinkResult::Failed(e));
            }
        };

        match outcome {
            AuthOutcome::Redirected(url) => {
                if let Some(linked_account) = linked_account_id(&url) {
                    info!(linked_account = %linked_account, "Auth flow returned linked account");
                }
                run.transition(&LinkMachineInput::Redirected)?;
            }
            AuthOutcome::Canceled => {
                run.transition(&LinkMachineInput::UserCanceled)?;
                info!("Link canceled by user");
                return Ok(LinkResult::Canceled);
            }
            AuthOutcome::Failed(e) => {
                run.transition(&LinkMachineInput::AuthFailed)?;
                return Ok(LinkResult::Failed(LinkError::Auth(e)));
            }
        }

        let synced = match self.synchronizer.fetch_all_accounts(client_secret).await {
            Ok(synced) => synced,
            Err(e) => {
                run.transition(&LinkMachineInput::SyncFailed)?;
                return Ok(LinkResult::Failed(e));
            }
        };
        run.session_id = Some(synced.session_id.clone());
        run.transition(&LinkMachineInput::AccountsFetched)?;

        if !synced.exhausted {
            warn!(
                accounts = synced.accounts.len(),
                "Account list capped before the backend was exhausted"
            );
        }

        let linked = reconcile_all(&synced.accounts, &synced.session_id);
        debug!(
            fetched = synced.accounts.len(),
            linkable = linked.len(),
            "Accounts reconciled"
        );

        match linked.into_iter().next() {
            Some(bank) => {
                run.transition(&LinkMachineInput::AccountSelected)?;
                info!(session_id = %bank.session_id, instantly_verified = bank.instantly_verified, "Bank linked");
                Ok(LinkResult::Completed(bank))
            }
            None => {
                run.transition(&LinkMachineInput::NothingLinkable)?;
                warn!(session_id = %synced.session_id, "No linkable account returned");
                Ok(LinkResult::Failed(LinkError::NoLinkableAccount))
            }
        }
    }
}
