//! The client session store: identity and scoping context for one session
//! instance, persisted to durable storage.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use brokle_core::error::AppError;
use brokle_core::result::AppResult;
use brokle_core::traits::StateStorage;
use brokle_core::types::{ApiKey, Organization, Project, User};

use super::state::{PersistedSession, SNAPSHOT_VERSION, SessionState, SnapshotEnvelope};

/// Storage key of the persisted session snapshot.
pub const SESSION_STORAGE_KEY: &str = "brokle-auth";

/// Single source of truth for the authenticated identity.
///
/// Every mutator builds the next state on a copy, persists it, and only
/// then publishes it, so a failed write leaves the visible state unchanged.
/// The store makes no authorization decisions.
#[derive(Debug)]
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn StateStorage>,
}

impl SessionStore {
    /// Creates an empty (signed-out) store backed by `storage`, ignoring
    /// anything already persisted.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            storage,
        }
    }

    /// Creates a store initialized from the persisted snapshot.
    ///
    /// A snapshot that cannot be parsed, has a different version, or claims
    /// authentication without a user is discarded and the store starts
    /// signed out. Storage I/O errors are returned.
    pub async fn hydrate(storage: Arc<dyn StateStorage>) -> AppResult<Self> {
        let raw = storage.get_item(SESSION_STORAGE_KEY).await?;

        let state = match raw {
            None => SessionState::default(),
            Some(raw) => match serde_json::from_str::<SnapshotEnvelope>(&raw) {
                Ok(envelope) if envelope.version != SNAPSHOT_VERSION => {
                    warn!(
                        found = envelope.version,
                        expected = SNAPSHOT_VERSION,
                        "Discarding session snapshot with unknown version"
                    );
                    SessionState::default()
                }
                Ok(envelope) if envelope.state.is_authenticated && envelope.state.user.is_none() => {
                    warn!("Discarding session snapshot marked authenticated without a user");
                    SessionState::default()
                }
                Ok(envelope) => SessionState::from(envelope.state),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt session snapshot");
                    SessionState::default()
                }
            },
        };

        debug!(authenticated = state.is_authenticated, "Session store hydrated");

        Ok(Self {
            state: RwLock::new(state),
            storage,
        })
    }

    /// Returns a copy of the full state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Whether a login has completed and not been undone.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    /// Returns the signed-in user.
    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Replaces the user record.
    pub async fn set_user(&self, user: Option<User>) -> AppResult<()> {
        self.mutate(|s| {
            s.user = user;
            Ok(())
        })
        .await
    }

    /// Switches the organization in scope. Switching to a different
    /// organization drops the project selection and cached API keys.
    pub async fn set_organization(&self, organization: Option<Organization>) -> AppResult<()> {
        self.mutate(|s| {
            let same = match (&s.organization, &organization) {
                (Some(a), Some(b)) => a.id == b.id,
                _ => false,
            };
            if !same {
                s.current_project = None;
                s.api_keys.clear();
            }
            s.organization = organization;
            Ok(())
        })
        .await
    }

    /// Selects a project. The project must belong to the organization in
    /// scope, if one is set.
    pub async fn set_current_project(&self, project: Option<Project>) -> AppResult<()> {
        self.mutate(|s| {
            if let (Some(project), Some(org)) = (&project, &s.organization) {
                if project.organization_id != org.id {
                    return Err(AppError::validation(format!(
                        "Project '{}' does not belong to organization '{}'",
                        project.slug, org.slug
                    )));
                }
            }
            let changed = s.current_project.as_ref().map(|p| &p.id)
                != project.as_ref().map(|p| &p.id);
            if changed {
                s.api_keys.clear();
            }
            s.current_project = project;
            Ok(())
        })
        .await
    }

    /// Marks the session authenticated as `user` in `organization`.
    pub async fn login(&self, user: User, organization: Option<Organization>) -> AppResult<()> {
        let user_id = user.id.clone();
        self.mutate(|s| {
            let org_changed = s.organization.as_ref().map(|o| &o.id)
                != organization.as_ref().map(|o| &o.id);
            if org_changed {
                s.current_project = None;
            }
            s.user = Some(user);
            s.organization = organization;
            s.is_authenticated = true;
            s.is_loading = false;
            s.api_keys.clear();
            Ok(())
        })
        .await?;

        info!(user_id = %user_id, "Session logged in");
        Ok(())
    }

    /// Clears every field and removes the persisted snapshot.
    pub async fn logout(&self) -> AppResult<()> {
        let mut guard = self.state.write().await;
        self.storage.remove_item(SESSION_STORAGE_KEY).await?;
        *guard = SessionState::default();
        info!("Session logged out");
        Ok(())
    }

    /// Sets the loading flag. Not persisted.
    pub async fn set_loading(&self, loading: bool) -> AppResult<()> {
        self.mutate(|s| {
            s.is_loading = loading;
            Ok(())
        })
        .await
    }

    /// Caches the API key list. Not persisted.
    pub async fn set_api_keys(&self, api_keys: Vec<ApiKey>) -> AppResult<()> {
        self.mutate(|s| {
            s.api_keys = api_keys;
            Ok(())
        })
        .await
    }

    /// Runs a profile mutation and stores the returned user only if it
    /// succeeds and still belongs to the signed-in user.
    pub async fn apply_profile_update<Fut>(&self, update: Fut) -> AppResult<User>
    where
        Fut: Future<Output = AppResult<User>>,
    {
        let updated = update.await?;

        self.mutate(|s| match &s.user {
            Some(current) if current.id == updated.id => {
                s.user = Some(updated.clone());
                Ok(())
            }
            _ => Err(AppError::session(
                "Profile update does not belong to the signed-in user",
            )),
        })
        .await?;

        Ok(updated)
    }

    async fn mutate<F>(&self, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut SessionState) -> AppResult<()>,
    {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        apply(&mut next)?;

        let persisted = PersistedSession::from(&next);
        if persisted != PersistedSession::from(&*guard) {
            let envelope = SnapshotEnvelope {
                state: persisted,
                version: SNAPSHOT_VERSION,
            };
            let json = serde_json::to_string(&envelope)?;
            self.storage.set_item(SESSION_STORAGE_KEY, &json).await?;
        }

        *guard = next;
        Ok(())
    }
}
