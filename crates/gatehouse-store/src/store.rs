use std::sync::Arc;

use async_trait::async_trait;

use crate::{errors::StorageError, Account, AccountFilter};

/// The `AccountStore` trait defines the operations the gate needs from the
/// persistence layer.
///
/// Implementations are free to run their own concurrency control. Callers
/// only rely on `save` assigning an identity to accounts saved for the first
/// time.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Returns the first account matching the filter
    async fn find_one(&self, filter: &AccountFilter<'_>) -> Result<Option<Account>, StorageError>;

    /// Whether at least one account matches the filter
    async fn exists(&self, filter: &AccountFilter<'_>) -> Result<bool, StorageError>;

    /// Insert or update the account.
    ///
    /// An account with an unassigned id is inserted and receives its id.
    /// Any other account replaces the stored one with the same id.
    async fn save(&self, account: &mut Account) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: AccountStore + ?Sized> AccountStore for Arc<S> {
    async fn find_one(&self, filter: &AccountFilter<'_>) -> Result<Option<Account>, StorageError> {
        (**self).find_one(filter).await
    }

    async fn exists(&self, filter: &AccountFilter<'_>) -> Result<bool, StorageError> {
        (**self).exists(filter).await
    }

    async fn save(&self, account: &mut Account) -> Result<(), StorageError> {
        (**self).save(account).await
    }
}
