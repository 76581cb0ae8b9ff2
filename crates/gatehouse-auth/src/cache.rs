use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{PoisonError, RwLock},
};

use gatehouse_store::Account;

/// Accounts registered through this process, keyed by username.
///
/// Only ever grows. It lets duplicate registrations skip the store, but the
/// store stays authoritative: a miss here proves nothing.
#[derive(Debug, Default)]
pub struct AccountCache {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get(&self, username: &str) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(username)
    }

    /// Adds the account unless the username is already cached.
    ///
    /// Returns whether the account was added.
    pub fn try_add(&self, username: String, account: Account) -> bool {
        match self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(username)
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(account);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_add_wins() {
        let cache = AccountCache::new();

        assert!(cache.try_add("alice".into(), Account::new("alice", "pw1", "test")));
        assert!(!cache.try_add("alice".into(), Account::new("alice", "pw2", "test")));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.try_get("alice").map(|a| a.password), Some("pw1".into()));
    }

    #[test]
    fn starts_empty() {
        let cache = AccountCache::new();

        assert!(cache.is_empty());
        assert!(!cache.contains("alice"));
        assert!(cache.try_get("alice").is_none());
    }
}
