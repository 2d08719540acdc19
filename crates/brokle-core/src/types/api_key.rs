//! API key listing entries cached by the session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An API key as listed by the backend. Only a masked preview of the
/// secret is ever held client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key ID.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    /// Masked key, e.g. `bk_live_****3f9a`.
    pub key_preview: String,
    /// Project the key is scoped to.
    pub project_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the key authenticated a request.
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Expiry, if the key is time-limited.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
