//! Token renewal against the backend.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::AuthTokens;

/// Exchanges a refresh token for a new token set, and revokes sessions.
///
/// Any `Err` is a hard failure for that attempt; callers never treat it as
/// a partial success.
#[async_trait]
pub trait TokenRenewer: Send + Sync + std::fmt::Debug + 'static {
    /// Obtain a new access/refresh pair.
    async fn renew(&self, refresh_token: &str) -> AppResult<AuthTokens>;

    /// Revoke the session these tokens belong to.
    async fn revoke(&self, tokens: &AuthTokens) -> AppResult<()>;
}
