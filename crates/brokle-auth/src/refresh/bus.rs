//! Publish/subscribe channel shared by every session instance of one user
//! agent, so they converge on the same authenticated state.

use tokio::sync::broadcast;
use uuid::Uuid;

use brokle_core::types::AuthTokens;

/// Session lifecycle event.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Tokens were renewed.
    Refreshed(AuthTokens),
    /// The user logged out.
    LoggedOut,
    /// Renewal failed and the session ended.
    Expired,
}

impl SessionEvent {
    /// Lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refreshed(_) => "refreshed",
            Self::LoggedOut => "logged_out",
            Self::Expired => "expired",
        }
    }
}

/// An event tagged with the instance that published it.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Publishing instance.
    pub origin: Uuid,
    /// What happened.
    pub event: SessionEvent,
}

/// Broadcast bus. Clones publish to and subscribe from the same channel.
#[derive(Debug, Clone)]
pub struct SessionBus {
    sender: broadcast::Sender<BusMessage>,
}

impl SessionBus {
    /// Creates a bus buffering up to `capacity` undelivered messages per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns how many subscribers will see it.
    pub fn publish(&self, origin: Uuid, event: SessionEvent) -> usize {
        tracing::debug!(%origin, event = event.as_str(), "Publishing session event");
        self.sender
            .send(BusMessage { origin, event })
            .unwrap_or(0)
    }

    /// Subscribes to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(16)
    }
}
