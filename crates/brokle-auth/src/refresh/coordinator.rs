//! The refresh coordinator: renews tokens ahead of expiry, ends the session
//! when renewal fails, and mirrors sibling instances' lifecycle events.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use brokle_core::config::SessionConfig;
use brokle_core::result::AppResult;
use brokle_core::traits::TokenRenewer;
use brokle_core::types::AuthTokens;

use crate::session::{SessionStore, TokenStore};

use super::bus::{SessionBus, SessionEvent};
use super::state::{EndReason, RefreshOutcome, RefreshState};

/// Keeps one session instance alive.
///
/// Cheap to clone; clones drive the same coordinator. The renewal timer and
/// the bus listener are aborted by [`stop`](Self::stop), by logout, and when
/// the last clone is dropped. Background tasks only hold weak references, so
/// they never keep a torn-down coordinator alive.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    session: Arc<SessionStore>,
    tokens: TokenStore,
    renewer: Arc<dyn TokenRenewer>,
    bus: SessionBus,
    sign_in_path: String,
    margin: Duration,
    interval: Duration,
    state: watch::Sender<RefreshState>,
    in_flight: AtomicBool,
    /// Bumped whenever the session ends; renewals started under an older
    /// epoch discard their result.
    epoch: AtomicU64,
    /// Held while committing renewed tokens and while ending the session,
    /// so a logout never interleaves with a renewal's save and re-arm.
    lifecycle: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    timer: Mutex<Option<(u64, JoinHandle<()>)>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("id", &self.inner.id)
            .field("state", &*self.inner.state.borrow())
            .field("margin", &self.inner.margin)
            .field("interval", &self.inner.interval)
            .finish()
    }
}

impl RefreshCoordinator {
    /// Creates an idle coordinator. Nothing is spawned until
    /// [`start`](Self::start) or [`resume`](Self::resume).
    pub fn new(
        session: Arc<SessionStore>,
        tokens: TokenStore,
        renewer: Arc<dyn TokenRenewer>,
        bus: SessionBus,
        config: &SessionConfig,
        sign_in_path: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(RefreshState::Idle);
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                session,
                tokens,
                renewer,
                bus,
                sign_in_path: sign_in_path.into(),
                margin: Duration::from_secs(config.refresh_margin_seconds),
                interval: Duration::from_secs(config.refresh_interval_seconds.max(1)),
                state,
                in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                lifecycle: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                timer: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Identifies this instance on the session bus.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    /// Begins keeping a freshly obtained token set alive.
    pub async fn start(&self, tokens: AuthTokens) -> AppResult<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.inner.tokens.save(&tokens).await?;
        self.inner.ensure_listener();
        self.inner.arm(tokens.expires_at);
        info!(instance = %self.inner.id, expires_at = %tokens.expires_at, "Session refresh started");
        Ok(())
    }

    /// Picks up whatever tokens are already stored. Expired tokens are
    /// renewed immediately; no tokens leaves the coordinator idle.
    pub async fn resume(&self) -> AppResult<RefreshState> {
        let epoch = self.inner.epoch.load(Ordering::Acquire);
        let Some(tokens) = self.inner.tokens.load().await? else {
            self.inner.state.send_replace(RefreshState::Idle);
            return Ok(RefreshState::Idle);
        };

        self.inner.ensure_listener();
        if tokens.is_expired_at(Utc::now()) {
            debug!("Stored access token expired; renewing now");
            self.inner.refresh().await;
        } else {
            let _lifecycle = self.inner.lifecycle.lock().await;
            if self.inner.is_current(epoch) {
                self.inner.arm(tokens.expires_at);
            }
        }
        Ok(self.state())
    }

    /// Renews now, unless a renewal is already running.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.inner.refresh().await
    }

    /// Reports a 401 from a backend call; triggers an immediate renewal.
    pub async fn handle_unauthorized(&self) -> RefreshOutcome {
        debug!(instance = %self.inner.id, "Backend rejected the access token");
        self.inner.refresh().await
    }

    /// Ends the session: cancels the timer, revokes the tokens on a best
    /// effort basis, clears local state, and tells sibling instances.
    ///
    /// Returns the sign-in location.
    pub async fn logout(&self) -> AppResult<String> {
        let inner = &self.inner;
        inner.epoch.fetch_add(1, Ordering::AcqRel);
        inner.cancel_timer();

        // Waits out a renewal that is already committing its tokens.
        let _lifecycle = inner.lifecycle.lock().await;
        inner.cancel_timer();

        match inner.tokens.load().await {
            Ok(Some(tokens)) => {
                if let Err(e) = inner.renewer.revoke(&tokens).await {
                    warn!(error = %e, "Session revocation failed; clearing local session anyway");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read tokens to revoke"),
        }

        inner.tokens.clear().await?;
        inner.session.logout().await?;
        inner.bus.publish(inner.id, SessionEvent::LoggedOut);
        inner.state.send_replace(RefreshState::Idle);

        info!(instance = %inner.id, "Signed out");
        Ok(inner.sign_in_path.clone())
    }

    /// Tears the coordinator down without touching stored state.
    pub fn stop(&self) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.cancel_timer();
        if let Some(handle) = lock(&self.inner.listener).take() {
            handle.abort();
        }
        self.inner.state.send_replace(RefreshState::Idle);
        debug!(instance = %self.inner.id, "Refresh coordinator stopped");
    }
}

impl Inner {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    /// Callers hold `lifecycle` and have checked the epoch.
    fn arm(self: &Arc<Self>, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
        let delay = remaining.saturating_sub(self.margin).min(self.interval);
        let fires_at =
            now + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.release_timer(generation);
            debug!(instance = %inner.id, "Refresh timer fired");
            inner.refresh().await;
        });

        if let Some((_, previous)) = lock(&self.timer).replace((generation, handle)) {
            previous.abort();
        }

        self.state
            .send_replace(RefreshState::Scheduled { expires_at, fires_at });
        debug!(%expires_at, %fires_at, "Refresh timer armed");
    }

    /// Forgets the timer handle without aborting it; called by the timer
    /// task itself once it fires.
    fn release_timer(&self, generation: u64) {
        let mut slot = lock(&self.timer);
        if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
            slot.take();
        }
    }

    fn cancel_timer(&self) {
        if let Some((_, handle)) = lock(&self.timer).take() {
            handle.abort();
        }
    }

    async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Renewal already in flight");
            return RefreshOutcome::AlreadyInFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);
        let epoch = self.epoch.load(Ordering::Acquire);

        let current = match self.tokens.load().await {
            Ok(Some(tokens)) => tokens,
            Ok(None) => {
                self.state.send_replace(RefreshState::Idle);
                return RefreshOutcome::NoSession;
            }
            Err(e) => {
                warn!(error = %e, "Could not read tokens for renewal");
                return self.expire().await;
            }
        };

        self.state.send_replace(RefreshState::Refreshing);
        let result = self.renewer.renew(&current.refresh_token).await;

        let _lifecycle = self.lifecycle.lock().await;
        if !self.is_current(epoch) {
            debug!("Session ended during renewal; discarding result");
            return RefreshOutcome::NoSession;
        }

        let renewed = match result {
            Ok(tokens) if !tokens.is_expired_at(Utc::now()) => tokens,
            Ok(tokens) => {
                warn!(expires_at = %tokens.expires_at, "Renewal returned an expired token");
                return self.expire_locked().await;
            }
            Err(e) => {
                warn!(error = %e, "Token renewal failed");
                return self.expire_locked().await;
            }
        };

        if let Err(e) = self.tokens.save(&renewed).await {
            warn!(error = %e, "Could not store renewed tokens");
            return self.expire_locked().await;
        }

        // A logout that started during the save clears these tokens once
        // it gets the lock; nothing may be armed or announced for them.
        if !self.is_current(epoch) {
            debug!("Session ended while storing renewed tokens");
            return RefreshOutcome::NoSession;
        }

        self.bus
            .publish(self.id, SessionEvent::Refreshed(renewed.clone()));
        self.arm(renewed.expires_at);
        info!(instance = %self.id, expires_at = %renewed.expires_at, "Session renewed");
        RefreshOutcome::Renewed(renewed.expires_at)
    }

    /// Ends the session after a failed renewal and tells siblings.
    async fn expire(&self) -> RefreshOutcome {
        let _lifecycle = self.lifecycle.lock().await;
        self.expire_locked().await
    }

    async fn expire_locked(&self) -> RefreshOutcome {
        let redirect = self.end_locked(EndReason::SessionExpired).await;
        self.bus.publish(self.id, SessionEvent::Expired);
        RefreshOutcome::Ended { redirect }
    }

    async fn end(&self, reason: EndReason) -> String {
        let _lifecycle = self.lifecycle.lock().await;
        self.end_locked(reason).await
    }

    async fn end_locked(&self, reason: EndReason) -> String {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.cancel_timer();

        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear tokens");
        }
        if let Err(e) = self.session.logout().await {
            warn!(error = %e, "Failed to clear session");
        }

        let redirect = format!("{}?reason={}", self.sign_in_path, reason);
        self.state.send_replace(RefreshState::Expired {
            reason,
            redirect: redirect.clone(),
        });
        info!(instance = %self.id, %reason, "Session ended");
        redirect
    }

    fn ensure_listener(self: &Arc<Self>) {
        let mut slot = lock(&self.listener);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let mut rx = self.bus.subscribe();
        let weak = Arc::downgrade(self);
        let id = self.id;

        *slot = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) if message.origin == id => continue,
                    Ok(message) => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        debug!(
                            instance = %id,
                            origin = %message.origin,
                            event = message.event.as_str(),
                            "Session event from sibling"
                        );
                        inner.on_sibling_event(message.event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session bus lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    async fn on_sibling_event(self: &Arc<Self>, event: SessionEvent) {
        match event {
            SessionEvent::Refreshed(tokens) => {
                let _lifecycle = self.lifecycle.lock().await;
                let epoch = self.epoch.load(Ordering::Acquire);
                let scheduled = self.state.borrow().is_scheduled();
                if !scheduled || tokens.is_expired_at(Utc::now()) {
                    return;
                }
                if let Err(e) = self.tokens.save(&tokens).await {
                    warn!(error = %e, "Could not adopt sibling tokens");
                    return;
                }
                if self.is_current(epoch) {
                    self.arm(tokens.expires_at);
                }
            }
            SessionEvent::LoggedOut => {
                self.end(EndReason::SignedOut).await;
            }
            SessionEvent::Expired => {
                self.end(EndReason::SessionExpired).await;
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, handle)) = timer.take() {
            handle.abort();
        }
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
