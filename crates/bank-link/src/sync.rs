//! Cursor-paginated account synchronization with a hard cap.

use crate::backend::LinkBackend;
use crate::error::{BackendError, BankLinkResult, LinkError};
use crate::types::{AccountPage, ClientSecret, RawAccount};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound on accounts returned by one synchronization.
pub const MAX_ACCOUNTS: usize = 100;

/// Merged result of a full synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedAccounts {
    /// Id of the linking session the receipt belongs to.
    pub session_id: String,
    /// Accounts in fetch order, at most [`MAX_ACCOUNTS`].
    pub accounts: Vec<RawAccount>,
    /// False when the cap stopped the loop while more accounts remained.
    pub exhausted: bool,
    pub pages_fetched: usize,
}

/// Loop state for the pagination walk.
#[derive(Debug, Default)]
struct PageWalk {
    accounts: Vec<RawAccount>,
    last_id: Option<String>,
    has_more: bool,
    truncated: bool,
    pages: usize,
}

impl PageWalk {
    fn absorb(&mut self, page: AccountPage) -> Result<(), BackendError> {
        // An empty receipt page defers the whole list to `list_accounts`.
        let empty_opening = self.pages == 0 && page.items.is_empty();
        self.pages += 1;
        let advanced = page.next_cursor.is_some() && page.next_cursor != self.last_id;

        self.accounts.extend(page.items);
        if page.next_cursor.is_some() {
            self.last_id = page.next_cursor;
        }
        self.has_more = page.has_more;

        if self.accounts.len() > MAX_ACCOUNTS {
            self.accounts.truncate(MAX_ACCOUNTS);
            self.truncated = true;
        }

        if self.wants_more() && !advanced && !empty_opening {
            return Err(BackendError::StalledCursor {
                accumulated: self.accounts.len(),
            });
        }
        Ok(())
    }

    fn wants_more(&self) -> bool {
        self.has_more && self.accounts.len() < MAX_ACCOUNTS
    }

    fn exhausted(&self) -> bool {
        !self.has_more && !self.truncated
    }
}

/// Fetches the session receipt and every following account page.
pub struct AccountSynchronizer {
    backend: Arc<dyn LinkBackend>,
}

impl AccountSynchronizer {
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self { backend }
    }

    /// Fetch all accounts of the session, up to [`MAX_ACCOUNTS`].
    ///
    /// Pages are requested sequentially and appended in fetch order. Any
    /// page failure aborts the whole call; no partial result is returned.
    pub async fn fetch_all_accounts(&self, client_secret: &ClientSecret) -> BankLinkResult<SyncedAccounts> {
        self.walk(client_secret).await.map_err(|e| {
            warn!(error = %e, "Account synchronization failed");
            LinkError::SyncFailed(e)
        })
    }

    async fn walk(&self, client_secret: &ClientSecret) -> Result<SyncedAccounts, BackendError> {
        let receipt = self.backend.session_receipt(client_secret).await?;
        let session_id = receipt.id;

        let mut walk = PageWalk::default();
        walk.absorb(receipt.accounts.into_page())?;
        debug!(
            accumulated = walk.accounts.len(),
            has_more = walk.has_more,
            "Session receipt fetched"
        );

        while walk.wants_more() {
            let page = self
                .backend
                .list_accounts(client_secret, walk.last_id.as_deref())
                .await?;
            walk.absorb(page.into_page())?;
            debug!(
                page = walk.pages,
                accumulated = walk.accounts.len(),
                has_more = walk.has_more,
                "Account page fetched"
            );
        }

        let exhausted = walk.exhausted();
        info!(
            session_id = %session_id,
            accounts = walk.accounts.len(),
            pages = walk.pages,
            exhausted,
            "Account synchronization finished"
        );

        Ok(SyncedAccounts {
            session_id,
            accounts: walk.accounts,
            exhausted,
            pages_fetched: walk.pages,
        })
    }
}
