mod common;

use bank_link::{AccountSynchronizer, BackendError, LinkError, RawAccount, MAX_ACCOUNTS};
use common::{list, numbered_accounts, receipt, secret, FakeBackend};
use std::sync::Arc;

fn ids(accounts: &[RawAccount]) -> Vec<String> {
    accounts
        .iter()
        .map(|account| account.id().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn receipt_without_more_returns_immediately() {
    let backend = Arc::new(FakeBackend::new().with_receipt(receipt("las_1", numbered_accounts("ba", 0, 3), false)));
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let synced = synchronizer.fetch_all_accounts(&secret()).await.unwrap();

    assert_eq!(synced.session_id, "las_1");
    assert_eq!(synced.accounts.len(), 3);
    assert!(synced.exhausted);
    assert_eq!(synced.pages_fetched, 1);
    assert_eq!(backend.list_count(), 0);
}

#[tokio::test]
async fn scenario_c_merges_pages_until_backend_is_exhausted() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_receipt(receipt("las_c", Vec::new(), true))
            .with_page(list(numbered_accounts("ba", 0, 40), true))
            .with_page(list(numbered_accounts("ba", 40, 40), true))
            .with_page(list(numbered_accounts("ba", 80, 19), false)),
    );
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let synced = synchronizer.fetch_all_accounts(&secret()).await.unwrap();

    assert_eq!(synced.accounts.len(), 99);
    assert!(synced.exhausted);
    assert_eq!(synced.pages_fetched, 4);
    assert_eq!(
        *backend.cursors.lock(),
        vec![None, Some("ba_39".to_string()), Some("ba_79".to_string())]
    );
}

#[tokio::test]
async fn endless_backend_is_capped_at_max_accounts() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_receipt(receipt("las_cap", numbered_accounts("ba", 0, 7), true))
            .endless(7),
    );
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let synced = synchronizer.fetch_all_accounts(&secret()).await.unwrap();

    assert_eq!(synced.accounts.len(), MAX_ACCOUNTS);
    assert!(!synced.exhausted);
    // 7 from the receipt, then pages of 7 until 100 is reached.
    assert_eq!(backend.list_count(), 14);
}

#[tokio::test]
async fn last_page_overflowing_cap_is_truncated_and_not_exhausted() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_receipt(receipt("las_t", numbered_accounts("ba", 0, 90), true))
            .with_page(list(numbered_accounts("ba", 90, 20), false)),
    );
    let synchronizer = AccountSynchronizer::new(backend);

    let synced = synchronizer.fetch_all_accounts(&secret()).await.unwrap();

    assert_eq!(synced.accounts.len(), MAX_ACCOUNTS);
    assert_eq!(synced.accounts.last().and_then(|a| a.id()), Some("ba_99"));
    assert!(!synced.exhausted);
}

#[tokio::test]
async fn merged_order_is_independent_of_page_partition() {
    let expected: Vec<String> = (0..30).map(|i| format!("ba_{}", i)).collect();

    for partition in [vec![30], vec![10, 10, 10], vec![1, 28, 1], vec![5, 25]] {
        let (first, rest) = partition.split_first().unwrap();
        let mut backend = FakeBackend::new().with_receipt(receipt(
            "las_p",
            numbered_accounts("ba", 0, *first),
            !rest.is_empty(),
        ));

        let mut offset = *first;
        for (i, size) in rest.iter().enumerate() {
            let has_more = i + 1 < rest.len();
            backend = backend.with_page(list(numbered_accounts("ba", offset, *size), has_more));
            offset += size;
        }

        let synchronizer = AccountSynchronizer::new(Arc::new(backend));
        let synced = synchronizer.fetch_all_accounts(&secret()).await.unwrap();

        assert_eq!(ids(&synced.accounts), expected, "partition {:?}", partition);
        assert!(synced.exhausted);
    }
}

#[tokio::test]
async fn failure_at_any_page_aborts_without_partial_result() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_receipt(receipt("las_f", numbered_accounts("ba", 0, 10), true))
            .with_page(list(numbered_accounts("ba", 10, 10), true))
            .with_failing_page()
            .with_page(list(numbered_accounts("ba", 20, 10), false)),
    );
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let err = synchronizer.fetch_all_accounts(&secret()).await.unwrap_err();

    assert!(matches!(err, LinkError::SyncFailed(BackendError::Api { status: 500, .. })));
    assert_eq!(backend.list_count(), 2);
}

#[tokio::test]
async fn receipt_failure_is_sync_failure() {
    let backend = Arc::new(FakeBackend::new().failing_receipt());
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let err = synchronizer.fetch_all_accounts(&secret()).await.unwrap_err();

    assert!(matches!(err, LinkError::SyncFailed(_)));
    assert_eq!(backend.list_count(), 0);
}

#[tokio::test]
async fn stalled_cursor_aborts_instead_of_looping() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_receipt(receipt("las_s", numbered_accounts("ba", 0, 5), true))
            .with_page(list(Vec::new(), true)),
    );
    let synchronizer = AccountSynchronizer::new(backend.clone());

    let err = synchronizer.fetch_all_accounts(&secret()).await.unwrap_err();

    assert!(matches!(
        err,
        LinkError::SyncFailed(BackendError::StalledCursor { accumulated: 5 })
    ));
    assert_eq!(backend.list_count(), 1);
}
