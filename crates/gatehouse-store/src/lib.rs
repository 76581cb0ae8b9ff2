//! Persistence port for accounts.
//!
//! The [`AccountStore`] trait is the narrow asynchronous interface the
//! authentication gate consumes: look up one account, check existence, save.
//! [`InMemoryStore`] is the process-local implementation used by the binary
//! and the tests.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};

pub mod errors;
mod inmemory;
mod store;


pub use errors::StorageError;
pub use inmemory::InMemoryStore;
pub use store::AccountStore;

/// Identity of an account, assigned by the store on first save.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(i64);

impl AccountId {
    /// Identity of an account that was never saved.
    pub const UNASSIGNED: Self = Self(0);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }

    pub const fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl From<AccountId> for i64 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One registered credential set.
///
/// The password is kept and compared exactly as given. It is not hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub password: String,
    /// Where the registration came from
    pub source: String,
    pub created_at: SystemTime,
    pub last_login_at: Option<SystemTime>,
}

impl Account {
    /// Builds an account that has not been saved yet.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::UNASSIGNED,
            username: username.into(),
            password: password.into(),
            source: source.into(),
            created_at: SystemTime::now(),
            last_login_at: None,
        }
    }
}

/// Predicate used to look accounts up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFilter<'a> {
    Username(&'a str),
    Credentials { username: &'a str, password: &'a str },
}

impl AccountFilter<'_> {
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            Self::Username(username) => account.username == *username,
            Self::Credentials { username, password } => {
                account.username == *username && account.password == *password
            }
        }
    }
}
