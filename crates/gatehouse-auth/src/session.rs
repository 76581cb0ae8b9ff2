use tokio::sync::mpsc;

/// Message pushed to a client session outside of a request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    LoginGreeting { message: String },
}

/// Sending half of a client session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<SessionMessage>,
}

impl SessionHandle {
    /// Creates a session and the receiver its transport reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Self { sender }, receiver)
    }

    /// Returns false if the session is gone.
    pub fn send(&self, message: SessionMessage) -> bool {
        self.sender.send(message).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
