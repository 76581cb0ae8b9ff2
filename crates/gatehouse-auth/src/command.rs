use async_trait::async_trait;

/// Request understood by the auth service.
pub trait Command {
    type Result: 'static;
}

#[async_trait]
pub trait CommandHandler<C: Command> {
    type Error;

    /// Handle one request and produce its response.
    ///
    /// # Errors
    ///
    /// Only for failures that cannot be expressed in the response itself.
    async fn handle(&mut self, command: C) -> Result<C::Result, Self::Error>;
}

/// Declares the command enum of a service and a `send_to` helper on every
/// command, which sends it along with a response channel and waits for the
/// answer.
macro_rules! RegisterCommands {
    (name = $enum_name:ident, error = $error:ident, commands = [$($command:ident),+ $(,)?]) => {
        #[derive(Debug)]
        pub enum $enum_name {
            $(
                $command(
                    $command,
                    tokio::sync::oneshot::Sender<
                        Result<<$command as $crate::command::Command>::Result, $error>,
                    >,
                ),
            )+
        }

        $(
            impl $command {
                pub(crate) async fn send_to(
                    self,
                    tx: &tokio::sync::mpsc::Sender<$enum_name>,
                ) -> Result<<Self as $crate::command::Command>::Result, $error> {
                    let (response_channel, receiver) = tokio::sync::oneshot::channel();

                    tx.send($enum_name::$command(self, response_channel)).await?;

                    receiver.await?
                }
            }
        )+
    };
}

pub(crate) use RegisterCommands;
