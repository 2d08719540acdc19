//! Observable coordinator states.

use chrono::{DateTime, Utc};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Renewal failed.
    SessionExpired,
    /// A session instance logged out.
    SignedOut,
}

impl EndReason {
    /// Value of the `reason` query parameter on the sign-in redirect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::SignedOut => "signed_out",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the refresh state machine currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    /// No session to keep alive.
    Idle,
    /// A renewal timer is armed.
    Scheduled {
        /// Expiry of the current access token.
        expires_at: DateTime<Utc>,
        /// When the timer fires.
        fires_at: DateTime<Utc>,
    },
    /// A renewal request is in flight.
    Refreshing,
    /// The session ended; the user should be sent to `redirect`.
    Expired {
        /// Why the session ended.
        reason: EndReason,
        /// Sign-in location carrying the reason flag.
        redirect: String,
    },
}

impl RefreshState {
    /// Lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled { .. } => "scheduled",
            Self::Refreshing => "refreshing",
            Self::Expired { .. } => "expired",
        }
    }

    /// Whether a renewal timer is armed.
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }
}

/// Result of one renewal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens stored; they expire at the given time.
    Renewed(DateTime<Utc>),
    /// Another attempt was already running; nothing was done.
    AlreadyInFlight,
    /// Renewal failed and the session was ended.
    Ended {
        /// Sign-in location carrying the reason flag.
        redirect: String,
    },
    /// There were no tokens to renew.
    NoSession,
}
