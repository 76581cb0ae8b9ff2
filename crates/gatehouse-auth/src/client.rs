use tokio::sync::{mpsc, oneshot};

use crate::{AuthCommand, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, ServiceError};

/// Handle to a running [`AuthService`](crate::AuthService).
#[derive(Clone, Debug)]
pub struct AuthClient {
    pub(crate) shutdown_channel: mpsc::Sender<oneshot::Sender<()>>,
    pub(crate) commands: mpsc::Sender<AuthCommand>,
}

impl AuthClient {
    /// Stops the service once the requests in flight are answered.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        let (sender, receiver) = oneshot::channel();
        self.shutdown_channel
            .send(sender)
            .await
            .map_err(ServiceError::ShutdownCommunication)?;

        Ok(receiver.await?)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        request.send_to(&self.commands).await
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, ServiceError> {
        request.send_to(&self.commands).await
    }
}
