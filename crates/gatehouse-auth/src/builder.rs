use std::{future::IntoFuture, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use gatehouse_config::auth::AuthConfig;
use gatehouse_lock::{KeyedLock, LockKey};
use gatehouse_store::AccountStore;
use tokio::sync::mpsc;

use crate::{
    cache::AccountCache, client::AuthClient, AccountGate, AuthService, RequestHandler,
    ServiceError,
};

pub struct AuthServiceBuilder<S> {
    store: Option<Arc<S>>,
    cache: Option<Arc<AccountCache>>,
    locks: Option<KeyedLock<LockKey>>,
    config: AuthConfig,
}

impl<S> Default for AuthServiceBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            cache: None,
            locks: None,
            config: AuthConfig::default(),
        }
    }
}

impl<S: AccountStore> AuthServiceBuilder<S> {
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);

        self
    }

    /// Shares an existing cache instead of starting from an empty one.
    pub fn cache(mut self, cache: Arc<AccountCache>) -> Self {
        self.cache = Some(cache);

        self
    }

    /// Shares an existing lock table, for callers running several gates over
    /// one store.
    pub fn locks(mut self, locks: KeyedLock<LockKey>) -> Self {
        self.locks = Some(locks);

        self
    }

    pub fn config(mut self, config: &AuthConfig) -> Self {
        self.config = config.clone();

        self
    }

    pub fn lock_shards(mut self, shards: usize) -> Self {
        self.config.lock_shards = shards;

        self
    }

    pub fn login_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.config.login_greeting = greeting.into();

        self
    }

    pub fn default_register_source(mut self, source: impl Into<String>) -> Self {
        self.config.default_register_source = source.into();

        self
    }
}

impl<S: AccountStore> IntoFuture for AuthServiceBuilder<S> {
    type Output = Result<(AuthClient, AuthService<S>), ServiceError>;

    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Some(store) = self.store else {
            return futures::future::err(ServiceError::MissingStore).boxed();
        };

        let (shutdown_channel, shutdown) = mpsc::channel(1);
        let (commands_channel, commands) =
            mpsc::channel(self.config.command_channel_capacity.max(1));

        let locks = self
            .locks
            .unwrap_or_else(|| KeyedLock::with_shards(self.config.lock_shards));
        let cache = self.cache.unwrap_or_default();

        let handler = RequestHandler {
            gate: AccountGate::with_locks(store, cache, locks),
            login_greeting: self.config.login_greeting.into(),
            default_register_source: self.config.default_register_source.into(),
        };

        futures::future::ok((
            AuthClient {
                shutdown_channel,
                commands: commands_channel,
            },
            AuthService::new(shutdown, commands, handler),
        ))
        .boxed()
    }
}
