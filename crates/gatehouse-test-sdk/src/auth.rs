use std::{future::IntoFuture, sync::Arc};

use gatehouse_auth::{AccountCache, AccountGate, AuthClient, AuthService, ServiceError};
use gatehouse_lock::KeyedLock;
use gatehouse_store::{AccountStore, InMemoryStore};
use rstest::fixture;
use tokio::{spawn, task::JoinHandle};

use crate::storage::in_memory_store;

#[fixture]
pub fn account_gate(in_memory_store: Arc<InMemoryStore>) -> AccountGate<InMemoryStore> {
    create_gate(in_memory_store)
}

#[fixture]
pub async fn auth_client(in_memory_store: Arc<InMemoryStore>) -> AuthClient {
    let (client, _handle) = create_auth_service(in_memory_store)
        .await
        .expect("Can't create the auth service");

    client
}

/// Gate over `store` with a fresh cache and a small lock table.
pub fn create_gate<S: AccountStore>(store: Arc<S>) -> AccountGate<S> {
    AccountGate::with_locks(
        store,
        Arc::new(AccountCache::new()),
        KeyedLock::with_shards(16),
    )
}

pub async fn create_auth_service<S: AccountStore>(
    store: Arc<S>,
) -> Result<(AuthClient, JoinHandle<Result<(), ServiceError>>), ServiceError> {
    let (client, service) = AuthService::builder()
        .store(store)
        .lock_shards(16)
        .await?;

    let handle = spawn(service.into_future());

    Ok((client, handle))
}
