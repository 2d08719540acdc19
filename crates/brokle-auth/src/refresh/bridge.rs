//! Carries session bus events between processes that share one storage
//! backend.
//!
//! Every bridged event is written under [`SIGNAL_KEY`]; each bridge polls
//! that key and republishes signals written by other processes onto its
//! local [`SessionBus`]. Only the latest signal is kept, so a process that
//! polls slower than its siblings publish sees the most recent event only.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use brokle_core::result::AppResult;
use brokle_core::traits::StateStorage;

use crate::session::TokenStore;

use super::bus::{BusMessage, SessionBus, SessionEvent};

/// Storage key holding the most recent session signal.
pub const SIGNAL_KEY: &str = "brokle_session_signal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SignalKind {
    Refreshed,
    LoggedOut,
    Expired,
}

/// What lands in storage. Refreshed signals carry no token material; the
/// receiving side reads the tokens from the shared storage instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Signal {
    id: Uuid,
    origin: Uuid,
    kind: SignalKind,
    at: DateTime<Utc>,
}

impl Signal {
    fn from_event(origin: Uuid, event: &SessionEvent) -> Self {
        let kind = match event {
            SessionEvent::Refreshed(_) => SignalKind::Refreshed,
            SessionEvent::LoggedOut => SignalKind::LoggedOut,
            SessionEvent::Expired => SignalKind::Expired,
        };
        Self {
            id: Uuid::new_v4(),
            origin,
            kind,
            at: Utc::now(),
        }
    }
}

/// Background task linking a [`SessionBus`] to shared storage.
///
/// Dropping the bridge aborts the task; [`shutdown`](Self::shutdown) first
/// writes out any events still queued.
#[derive(Debug)]
pub struct StorageBridge {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StorageBridge {
    /// Starts bridging `bus` to `storage`, checking for foreign signals
    /// every `poll`. A signal already in storage is not replayed.
    pub fn spawn(bus: SessionBus, storage: Arc<dyn StateStorage>, poll: Duration) -> Self {
        let (stop, stopped) = oneshot::channel();
        let rx = bus.subscribe();
        let task = tokio::spawn(run(bus, rx, storage, poll, stopped));
        Self {
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Flushes queued local events to storage and stops the task.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Session bridge task failed");
            }
        }
    }
}

impl Drop for StorageBridge {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Relay {
    bus: SessionBus,
    storage: Arc<dyn StateStorage>,
    tokens: TokenStore,
    last_seen: Option<Uuid>,
    /// Origins of signals republished here; their echoes are not written back.
    foreign: HashSet<Uuid>,
}

async fn run(
    bus: SessionBus,
    mut rx: broadcast::Receiver<BusMessage>,
    storage: Arc<dyn StateStorage>,
    poll: Duration,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut relay = Relay {
        bus,
        tokens: TokenStore::new(Arc::clone(&storage)),
        storage,
        last_seen: None,
        foreign: HashSet::new(),
    };
    relay.last_seen = match relay.read().await {
        Ok(signal) => signal.map(|s| s.id),
        Err(e) => {
            warn!(error = %e, "Could not read session signal");
            None
        }
    };

    let mut ticker = tokio::time::interval(poll.max(Duration::from_millis(10)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Ok(message) => relay.write(&message).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session bridge lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = ticker.tick() => relay.poll().await,
            _ = &mut stopped => {
                while let Ok(message) = rx.try_recv() {
                    relay.write(&message).await;
                }
                break;
            }
        }
    }
    debug!("Session bridge stopped");
}

impl Relay {
    async fn read(&self) -> AppResult<Option<Signal>> {
        let Some(raw) = self.storage.get_item(SIGNAL_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(signal) => Ok(Some(signal)),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable session signal");
                Ok(None)
            }
        }
    }

    async fn write(&mut self, message: &BusMessage) {
        if self.foreign.contains(&message.origin) {
            return;
        }
        let signal = Signal::from_event(message.origin, &message.event);
        let written = match serde_json::to_string(&signal) {
            Ok(raw) => self.storage.set_item(SIGNAL_KEY, &raw).await,
            Err(e) => Err(e.into()),
        };
        match written {
            Ok(()) => {
                self.last_seen = Some(signal.id);
                debug!(origin = %signal.origin, kind = ?signal.kind, "Session signal written");
            }
            Err(e) => warn!(error = %e, "Could not write session signal"),
        }
    }

    async fn poll(&mut self) {
        let signal = match self.read().await {
            Ok(Some(signal)) if Some(signal.id) != self.last_seen => signal,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Could not read session signal");
                return;
            }
        };
        self.last_seen = Some(signal.id);

        let event = match signal.kind {
            SignalKind::LoggedOut => SessionEvent::LoggedOut,
            SignalKind::Expired => SessionEvent::Expired,
            SignalKind::Refreshed => match self.tokens.load().await {
                Ok(Some(tokens)) => SessionEvent::Refreshed(tokens),
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "Could not read tokens for sibling renewal");
                    return;
                }
            },
        };

        debug!(origin = %signal.origin, kind = ?signal.kind, "Session signal from another process");
        self.foreign.insert(signal.origin);
        self.bus.publish(signal.origin, event);
    }
}
