//! JWT claims carried by Brokle session tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brokle_core::types::Role;

/// Claims payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the user ID).
    pub sub: String,
    /// Email of the user at issuance.
    pub email: String,
    /// Organization the session is scoped to.
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    /// Role within that organization.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Checks whether this token has expired at the given unix time.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
