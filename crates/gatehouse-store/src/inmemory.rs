use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{errors::StorageError, Account, AccountFilter, AccountId, AccountStore};

/// Accounts kept in process memory, ordered by id.
#[derive(Debug)]
pub struct InMemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    next_id: AtomicI64,
    enforce_unique_usernames: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            enforce_unique_usernames: false,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects inserting a second account with an existing username, the way
    /// a unique index on the username column would.
    pub fn with_unique_usernames(mut self, enforce: bool) -> Self {
        self.enforce_unique_usernames = enforce;

        self
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    pub async fn get(&self, id: AccountId) -> Option<Account> {
        self.accounts.read().await.get(&id).cloned()
    }

    /// Every stored account matching `filter`.
    pub async fn find_all(&self, filter: &AccountFilter<'_>) -> Vec<Account> {
        self.accounts
            .read()
            .await
            .values()
            .filter(|account| filter.matches(account))
            .cloned()
            .collect()
    }

    fn assign_id(&self) -> Result<AccountId, StorageError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if id <= 0 {
            return Err(StorageError::IdentityExhausted);
        }

        Ok(AccountId::new(id))
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_one(&self, filter: &AccountFilter<'_>) -> Result<Option<Account>, StorageError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| filter.matches(account))
            .cloned())
    }

    async fn exists(&self, filter: &AccountFilter<'_>) -> Result<bool, StorageError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .any(|account| filter.matches(account)))
    }

    async fn save(&self, account: &mut Account) -> Result<(), StorageError> {
        let mut accounts = self.accounts.write().await;

        if account.id.is_assigned() {
            let stored = accounts
                .get_mut(&account.id)
                .ok_or(StorageError::AccountNotFound(account.id))?;
            *stored = account.clone();

            debug!("Account {} updated", account.id);

            return Ok(());
        }

        if self.enforce_unique_usernames
            && accounts
                .values()
                .any(|stored| stored.username == account.username)
        {
            return Err(StorageError::UsernameTaken(account.username.clone()));
        }

        account.id = self.assign_id()?;
        accounts.insert(account.id, account.clone());

        debug!("Account {} inserted", account.id);

        Ok(())
    }
}
