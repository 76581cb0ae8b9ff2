use std::{sync::Arc, time::SystemTime};

use gatehouse_lock::{KeyedLock, KeyedLockGuard, LockKey};
use gatehouse_metrics::{
    AUTH_ACCOUNT_CACHE_SIZE, AUTH_LOCK_CONTENDED_TOTAL, AUTH_LOCK_WAIT_SECONDS, AUTH_LOGIN_TOTAL,
    AUTH_REGISTER_TOTAL,
};
use gatehouse_store::{Account, AccountFilter, AccountId, AccountStore, StorageError};
use tracing::{debug, error, info, instrument, warn};

use crate::{cache::AccountCache, AuthError, ErrorCode};

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginResponse {
    pub error_code: ErrorCode,
    /// Unassigned unless `error_code` is [`ErrorCode::Ok`]
    pub account_id: AccountId,
}

impl LoginResponse {
    fn accepted(account_id: AccountId) -> Self {
        Self {
            error_code: ErrorCode::Ok,
            account_id,
        }
    }

    fn rejected(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            account_id: AccountId::UNASSIGNED,
        }
    }
}

/// Login and registration, serialized per username.
///
/// Both operations hold the username's lock from their first cache or store
/// access to their last write. Logins and registrations use separate lock
/// namespaces and never wait on each other.
pub struct AccountGate<S> {
    store: Arc<S>,
    cache: Arc<AccountCache>,
    locks: KeyedLock<LockKey>,
}

impl<S> Clone for AccountGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            locks: self.locks.clone(),
        }
    }
}

impl<S: AccountStore> AccountGate<S> {
    pub fn new(store: Arc<S>, cache: Arc<AccountCache>) -> Self {
        Self::with_locks(store, cache, KeyedLock::new())
    }

    pub fn with_locks(store: Arc<S>, cache: Arc<AccountCache>, locks: KeyedLock<LockKey>) -> Self {
        Self {
            store,
            cache,
            locks,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<AccountCache> {
        &self.cache
    }

    pub fn locks(&self) -> &KeyedLock<LockKey> {
        &self.locks
    }

    /// Checks the credentials against the store and stamps the login time.
    ///
    /// # Errors
    ///
    /// Fails only when the store does. Wrong credentials are reported as
    /// [`ErrorCode::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let result = self.try_login(username, password).await;

        match &result {
            Ok(response) => {
                AUTH_LOGIN_TOTAL
                    .with_label_values(&[response.error_code.as_str()])
                    .inc();
            }
            Err(err) => {
                error!("Login failed on store error: {err}");
                AUTH_LOGIN_TOTAL
                    .with_label_values(&["store_unavailable"])
                    .inc();
            }
        }

        result
    }

    /// Creates the account unless the username is already taken.
    ///
    /// # Errors
    ///
    /// Fails only when the store does. A taken username is reported as
    /// [`ErrorCode::AlreadyExists`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        source: &str,
    ) -> Result<ErrorCode, AuthError> {
        let result = self.try_register(username, password, source).await;

        match &result {
            Ok(code) => {
                AUTH_REGISTER_TOTAL.with_label_values(&[code.as_str()]).inc();
            }
            Err(err) => {
                error!("Registration failed on store error: {err}");
                AUTH_REGISTER_TOTAL
                    .with_label_values(&["store_unavailable"])
                    .inc();
            }
        }

        result
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Ok(LoginResponse::rejected(ErrorCode::InvalidArgument));
        }

        let _guard = self.lock(LockKey::login(username)).await;

        let Some(mut account) = self
            .store
            .find_one(&AccountFilter::Credentials { username, password })
            .await?
        else {
            debug!("Unknown username or wrong password");
            return Ok(LoginResponse::rejected(ErrorCode::InvalidCredentials));
        };

        account.last_login_at = Some(SystemTime::now());
        self.store.save(&mut account).await?;

        debug!("Account {} logged in", account.id);

        Ok(LoginResponse::accepted(account.id))
    }

    async fn try_register(
        &self,
        username: &str,
        password: &str,
        source: &str,
    ) -> Result<ErrorCode, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Ok(ErrorCode::InvalidArgument);
        }

        let _guard = self.lock(LockKey::register(username)).await;

        if self.cache.contains(username) {
            debug!("Username found in the account cache");
            return Ok(ErrorCode::AlreadyExists);
        }

        if self
            .store
            .exists(&AccountFilter::Username(username))
            .await?
        {
            debug!("Username found in the store");
            return Ok(ErrorCode::AlreadyExists);
        }

        let mut account = Account::new(username, password, source);

        match self.store.save(&mut account).await {
            Ok(()) => {}
            Err(StorageError::UsernameTaken(_)) => {
                // Another process registered it between our check and save.
                warn!("Store rejected the username as already taken");
                return Ok(ErrorCode::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        }

        let account_id = account.id;
        self.cache.try_add(username.to_string(), account);
        AUTH_ACCOUNT_CACHE_SIZE.set(self.cache.len() as i64);

        info!("Registered account {account_id} from source {source:?}");

        Ok(ErrorCode::Ok)
    }

    async fn lock(&self, key: LockKey) -> KeyedLockGuard<LockKey> {
        let timer = AUTH_LOCK_WAIT_SECONDS.start_timer();
        let guard = self.locks.acquire(key).await;
        timer.observe_duration();

        if guard.was_contended() {
            AUTH_LOCK_CONTENDED_TOTAL
                .with_label_values(&[key.namespace().as_str()])
                .inc();
        }

        guard
    }
}
