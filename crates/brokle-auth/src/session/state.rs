//! Session state and its persisted subset.

use serde::{Deserialize, Serialize};

use brokle_core::types::{ApiKey, Organization, Project, User};

/// Version of the persisted snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the client knows about the current identity and scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The signed-in user.
    pub user: Option<User>,
    /// The organization in scope.
    pub organization: Option<Organization>,
    /// The selected project, if any.
    pub current_project: Option<Project>,
    /// Whether a login completed for this state.
    pub is_authenticated: bool,
    /// Whether an auth round trip is in progress.
    pub is_loading: bool,
    /// Cached API key list. Never persisted.
    pub api_keys: Vec<ApiKey>,
}

/// The subset of [`SessionState`] written to durable storage. Token
/// material never appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// The signed-in user.
    pub user: Option<User>,
    /// The organization in scope.
    pub organization: Option<Organization>,
    /// The selected project.
    pub current_project: Option<Project>,
    /// Whether a login completed.
    pub is_authenticated: bool,
}

/// Storage envelope around the persisted subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    /// The persisted fields.
    pub state: PersistedSession,
    /// Format version; mismatches are discarded.
    pub version: u32,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        Self {
            user: state.user.clone(),
            organization: state.organization.clone(),
            current_project: state.current_project.clone(),
            is_authenticated: state.is_authenticated,
        }
    }
}

impl From<PersistedSession> for SessionState {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            user: persisted.user,
            organization: persisted.organization,
            current_project: persisted.current_project,
            is_authenticated: persisted.is_authenticated,
            is_loading: false,
            api_keys: Vec::new(),
        }
    }
}
