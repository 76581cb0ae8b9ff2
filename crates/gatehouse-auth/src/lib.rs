//! Account login and registration.
//!
//! [`AccountGate`] holds the rules: every login and every registration of a
//! username runs under that username's lock, taken from a [`KeyedLock`]
//! shared by the whole process. [`AuthService`] puts the gate behind a
//! command channel so that request handlers only hold an [`AuthClient`].
//!
//! [`KeyedLock`]: gatehouse_lock::KeyedLock

use std::{fmt, future::IntoFuture, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use gatehouse_store::AccountStore;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};
use tracing::{debug, error, info, warn};

mod builder;
mod cache;
mod client;
mod command;
mod error;
mod gate;
mod session;

pub use builder::AuthServiceBuilder;
pub use cache::AccountCache;
pub use client::AuthClient;
pub use command::{Command, CommandHandler};
pub use error::{AuthError, ErrorCode};
pub use gate::{AccountGate, LoginResponse};
pub use session::{SessionHandle, SessionMessage};

use command::RegisterCommands;

pub struct AuthService<S> {
    pub(crate) shutdown: mpsc::Receiver<oneshot::Sender<()>>,
    pub(crate) commands: mpsc::Receiver<AuthCommand>,
    pub(crate) handler: RequestHandler<S>,
    tasks: JoinSet<()>,
}

impl<S: AccountStore> AuthService<S> {
    pub fn builder() -> AuthServiceBuilder<S> {
        AuthServiceBuilder::default()
    }

    pub(crate) fn new(
        shutdown: mpsc::Receiver<oneshot::Sender<()>>,
        commands: mpsc::Receiver<AuthCommand>,
        handler: RequestHandler<S>,
    ) -> Self {
        Self {
            shutdown,
            commands,
            handler,
            tasks: JoinSet::new(),
        }
    }

    pub fn gate(&self) -> &AccountGate<S> {
        &self.handler.gate
    }

    /// Requests run on their own task so that a request waiting on a busy
    /// username never holds back requests for other usernames.
    fn dispatch(&mut self, command: AuthCommand) {
        let mut handler = self.handler.clone();

        self.tasks.spawn(async move {
            match command {
                AuthCommand::LoginRequest(command, response_channel) => {
                    _ = response_channel.send(handler.handle(command).await)
                }
                AuthCommand::RegisterRequest(command, response_channel) => {
                    _ = response_channel.send(handler.handle(command).await)
                }
            }
        });
    }

    async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(error) = result {
                error!("Request task failed during shutdown: {error}");
            }
        }
    }
}

impl<S: AccountStore> IntoFuture for AuthService<S> {
    type Output = Result<(), ServiceError>;

    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(mut self) -> Self::IntoFuture {
        async move {
            let shutdowned: Option<oneshot::Sender<()>> = loop {
                tokio::select! {
                    sender = self.shutdown.recv() => {
                        break sender;
                    }
                    Some(result) = self.tasks.join_next() => {
                        if let Err(error) = result {
                            error!("Request task failed: {error}");
                        }
                    }
                    command = self.commands.recv() => match command {
                        Some(command) => self.dispatch(command),
                        None => break None,
                    }
                }
            };

            debug!("Waiting for {} request(s) in flight", self.tasks.len());
            self.drain().await;

            if let Some(sender) = shutdowned {
                info!("Shutting down auth service...");
                _ = sender.send(());
            } else {
                warn!("Shutting down auth service, every client is gone...");
            }

            Ok(())
        }
        .boxed()
    }
}

/// Serves requests against the shared gate, one clone per request.
pub(crate) struct RequestHandler<S> {
    pub(crate) gate: AccountGate<S>,
    pub(crate) login_greeting: Arc<str>,
    pub(crate) default_register_source: Arc<str>,
}

impl<S> Clone for RequestHandler<S> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            login_greeting: Arc::clone(&self.login_greeting),
            default_register_source: Arc::clone(&self.default_register_source),
        }
    }
}

#[async_trait::async_trait]
impl<S: AccountStore> CommandHandler<LoginRequest> for RequestHandler<S> {
    type Error = ServiceError;

    async fn handle(
        &mut self,
        LoginRequest {
            username,
            password,
            login_type,
            session,
        }: LoginRequest,
    ) -> Result<LoginResponse, Self::Error> {
        debug!("Login request of type {login_type}");

        let response = self.gate.login(&username, &password).await?;

        if response.error_code.is_ok() {
            if let Some(session) = session {
                let greeted = session.send(SessionMessage::LoginGreeting {
                    message: self.login_greeting.to_string(),
                });

                if !greeted {
                    debug!("Session closed before the login greeting");
                }
            }
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl<S: AccountStore> CommandHandler<RegisterRequest> for RequestHandler<S> {
    type Error = ServiceError;

    async fn handle(
        &mut self,
        RegisterRequest {
            username,
            password,
            source,
        }: RegisterRequest,
    ) -> Result<RegisterResponse, Self::Error> {
        let source = source.as_deref().unwrap_or(&self.default_register_source);
        let error_code = self.gate.register(&username, &password, source).await?;

        Ok(RegisterResponse { error_code })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unable to communicate with the auth service: {0}")]
    CommunicationChannel(#[from] mpsc::error::SendError<AuthCommand>),

    #[error("Unable to receive expected response from the auth service: {0}")]
    ResponseChannel(#[from] oneshot::error::RecvError),

    #[error("Unable to execute shutdown on the auth service: {0}")]
    ShutdownCommunication(mpsc::error::SendError<oneshot::Sender<()>>),

    #[error("No account store was provided to the auth service")]
    MissingStore,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

RegisterCommands!(
    name = AuthCommand,
    error = ServiceError,
    commands = [LoginRequest, RegisterRequest]
);

pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Client supplied, carried for logging only
    pub login_type: u32,
    /// Receives the greeting once the login succeeds
    pub session: Option<SessionHandle>,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            login_type: 0,
            session: None,
        }
    }

    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);

        self
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_type", &self.login_type)
            .field("session", &self.session.is_some())
            .finish()
    }
}

impl Command for LoginRequest {
    type Result = LoginResponse;
}

pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Falls back to the configured default source
    pub source: Option<String>,
}

impl RegisterRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());

        self
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl Command for RegisterRequest {
    type Result = RegisterResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterResponse {
    pub error_code: ErrorCode,
}
