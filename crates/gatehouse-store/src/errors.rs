use thiserror::Error;

use crate::AccountId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("An account named {0:?} already exists")]
    UsernameTaken(String),

    #[error("Unable to find account {0}")]
    AccountNotFound(AccountId),

    #[error("No account identity left to assign")]
    IdentityExhausted,
}
