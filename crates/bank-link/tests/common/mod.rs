#![allow(dead_code)]

use async_trait::async_trait;
use bank_link::{
    AccountList, AuthFlow, AuthFlowError, AuthFlowRequest, BackendError, BackendResult, ClientSecret,
    LinkBackend, PresentationContext, RawAccount, RedirectOutcome, SessionReceipt, SynchronizeRequest,
    SynchronizeResponse,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// In-memory backend serving scripted responses and counting calls.
pub struct FakeBackend {
    synchronize: Option<SynchronizeResponse>,
    receipt: Option<SessionReceipt>,
    /// `None` entries fail that page.
    pages: Mutex<VecDeque<Option<AccountList>>>,
    /// When set, `list_accounts` never runs out: every page has this many
    /// fresh accounts and `has_more = true`.
    endless_page_size: Option<usize>,
    served: AtomicUsize,
    pub synchronize_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub cursors: Mutex<Vec<Option<String>>>,
    pub last_synchronize: Mutex<Option<SynchronizeRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            synchronize: Some(scenario_session()),
            receipt: Some(receipt("las_test", Vec::new(), false)),
            pages: Mutex::new(VecDeque::new()),
            endless_page_size: None,
            served: AtomicUsize::new(0),
            synchronize_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            cursors: Mutex::new(Vec::new()),
            last_synchronize: Mutex::new(None),
        }
    }

    pub fn failing_synchronize(mut self) -> Self {
        self.synchronize = None;
        self
    }

    pub fn with_synchronize(mut self, response: SynchronizeResponse) -> Self {
        self.synchronize = Some(response);
        self
    }

    pub fn with_receipt(mut self, receipt: SessionReceipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn failing_receipt(mut self) -> Self {
        self.receipt = None;
        self
    }

    pub fn with_page(self, page: AccountList) -> Self {
        self.pages.lock().push_back(Some(page));
        self
    }

    pub fn with_failing_page(self) -> Self {
        self.pages.lock().push_back(None);
        self
    }

    pub fn endless(mut self, page_size: usize) -> Self {
        self.endless_page_size = Some(page_size);
        self
    }

    pub fn synchronize_count(&self) -> usize {
        self.synchronize_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_count(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn server_error() -> BackendError {
    BackendError::Api {
        status: 500,
        message: "scripted failure".to_string(),
    }
}

#[async_trait]
impl LinkBackend for FakeBackend {
    async fn synchronize(&self, request: &SynchronizeRequest) -> BackendResult<SynchronizeResponse> {
        self.synchronize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_synchronize.lock() = Some(request.clone());
        self.synchronize.clone().ok_or_else(server_error)
    }

    async fn session_receipt(&self, _client_secret: &ClientSecret) -> BackendResult<SessionReceipt> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.receipt.clone().ok_or_else(server_error)
    }

    async fn list_accounts(
        &self,
        _client_secret: &ClientSecret,
        starting_after: Option<&str>,
    ) -> BackendResult<AccountList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.cursors.lock().push(starting_after.map(str::to_string));

        if let Some(page_size) = self.endless_page_size {
            let start = self.served.fetch_add(page_size, Ordering::SeqCst);
            let data = (start..start + page_size)
                .map(|i| bank_account(&format!("ba_endless_{}", i), "Endless Bank", "0000"))
                .collect();
            return Ok(list(data, true));
        }

        match self.pages.lock().pop_front() {
            Some(Some(page)) => Ok(page),
            Some(None) => Err(server_error()),
            None => Err(BackendError::Api {
                status: 404,
                message: "no more scripted pages".to_string(),
            }),
        }
    }
}

/// Auth flow returning a scripted result, or never finishing when `None`.
pub struct ScriptedFlow {
    result: Option<Result<RedirectOutcome, AuthFlowError>>,
    pub start_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub requests: Mutex<Vec<AuthFlowRequest>>,
}

impl ScriptedFlow {
    pub fn redirecting_to(url: &str) -> Self {
        Self::with_result(Some(Ok(RedirectOutcome::Redirected(
            Url::parse(url).expect("valid scripted url"),
        ))))
    }

    pub fn user_canceling() -> Self {
        Self::with_result(Some(Ok(RedirectOutcome::UserCanceled)))
    }

    pub fn failing(error: AuthFlowError) -> Self {
        Self::with_result(Some(Err(error)))
    }

    pub fn never_finishing() -> Self {
        Self::with_result(None)
    }

    fn with_result(result: Option<Result<RedirectOutcome, AuthFlowError>>) -> Self {
        Self {
            result,
            start_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthFlow for ScriptedFlow {
    async fn start(
        &self,
        request: AuthFlowRequest,
        context: &dyn PresentationContext,
    ) -> Result<RedirectOutcome, AuthFlowError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        context
            .open_url(&request.url)
            .map_err(|e| AuthFlowError::StartRefused(e.to_string()))?;
        self.requests.lock().push(request);

        match &self.result {
            Some(result) => result.clone(),
            None => std::future::pending().await,
        }
    }

    fn cancel(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Presentation host that records every URL it was asked to open.
#[derive(Default)]
pub struct FakeContext {
    pub opened: Mutex<Vec<Url>>,
}

impl PresentationContext for FakeContext {
    fn open_url(&self, url: &Url) -> std::io::Result<()> {
        self.opened.lock().push(url.clone());
        Ok(())
    }
}

pub fn secret() -> ClientSecret {
    ClientSecret::from("las_test_secret_abc")
}

pub fn return_target() -> Url {
    Url::parse("myapp://link/return").expect("valid return target")
}

/// Bootstrap response used across scenarios.
pub fn scenario_session() -> SynchronizeResponse {
    SynchronizeResponse {
        hosted_auth_url: "https://x/auth".to_string(),
        success_url: "https://x/s".to_string(),
        cancel_url: "https://x/c".to_string(),
        session_id: Some("las_test".to_string()),
    }
}

pub fn receipt(id: &str, data: Vec<RawAccount>, has_more: bool) -> SessionReceipt {
    SessionReceipt {
        id: id.to_string(),
        accounts: list(data, has_more),
    }
}

pub fn list(data: Vec<RawAccount>, has_more: bool) -> AccountList {
    AccountList { data, has_more }
}

pub fn bank_account(id: &str, bank_name: &str, last4: &str) -> RawAccount {
    RawAccount::BankAccount {
        id: Some(id.to_string()),
        bank_name: Some(bank_name.to_string()),
        last4: last4.to_string(),
    }
}

pub fn linked_account(id: &str, display_name: &str, institution_name: &str) -> RawAccount {
    RawAccount::LinkedAccount {
        id: Some(id.to_string()),
        display_name: Some(display_name.to_string()),
        institution_name: institution_name.to_string(),
        last4: None,
    }
}

pub fn unparsable(id: &str) -> RawAccount {
    RawAccount::Unparsable {
        id: Some(id.to_string()),
    }
}

/// `count` bank accounts with ids `{prefix}_{n}`, starting at `start`.
pub fn numbered_accounts(prefix: &str, start: usize, count: usize) -> Vec<RawAccount> {
    (start..start + count)
        .map(|i| bank_account(&format!("{}_{}", prefix, i), "Numbered Bank", "1111"))
        .collect()
}
