use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use gatehouse_store::{Account, AccountFilter, AccountStore, InMemoryStore, StorageError};
use rstest::fixture;
use tracing::debug;

#[fixture]
pub fn in_memory_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

#[fixture]
pub fn unique_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new().with_unique_usernames(true))
}

#[fixture]
pub fn faulty_store() -> Arc<FaultyStore<InMemoryStore>> {
    Arc::new(FaultyStore::new(InMemoryStore::new()))
}

/// Store wrapper that fails or slows down on demand.
///
/// Every switch can be flipped while requests are in flight.
#[derive(Debug, Default)]
pub struct FaultyStore<S> {
    inner: S,
    fail_find_one: AtomicBool,
    fail_exists: AtomicBool,
    fail_save: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicU64,
}

impl<S: AccountStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_find_one: AtomicBool::new(false),
            fail_exists: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_find_one(&self, fail: bool) {
        self.fail_find_one.store(fail, Ordering::SeqCst);
    }

    pub fn fail_exists(&self, fail: bool) {
        self.fail_exists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Delay added before every call reaches the inner store.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of calls made so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &str, fail: &AtomicBool) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if fail.load(Ordering::SeqCst) {
            debug!("Injecting failure into {operation}");
            return Err(StorageError::Unavailable(format!(
                "injected {operation} failure"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl<S: AccountStore> AccountStore for FaultyStore<S> {
    async fn find_one(&self, filter: &AccountFilter<'_>) -> Result<Option<Account>, StorageError> {
        self.enter("find_one", &self.fail_find_one).await?;
        self.inner.find_one(filter).await
    }

    async fn exists(&self, filter: &AccountFilter<'_>) -> Result<bool, StorageError> {
        self.enter("exists", &self.fail_exists).await?;
        self.inner.exists(filter).await
    }

    async fn save(&self, account: &mut Account) -> Result<(), StorageError> {
        self.enter("save", &self.fail_save).await?;
        self.inner.save(account).await
    }
}
