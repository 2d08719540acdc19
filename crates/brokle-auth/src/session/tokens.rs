//! Persisted token set, stored apart from the session snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use brokle_core::result::AppResult;
use brokle_core::traits::StateStorage;
use brokle_core::types::AuthTokens;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "brokle_access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "brokle_refresh_token";
/// Storage key of the access token expiry, in epoch milliseconds.
pub const EXPIRES_AT_KEY: &str = "brokle_expires_at";

/// Reads and writes the current [`AuthTokens`] as three separate keys.
#[derive(Debug, Clone)]
pub struct TokenStore {
    storage: Arc<dyn StateStorage>,
}

impl TokenStore {
    /// Wraps the storage the tokens live in.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Loads the stored token set. A partial or unreadable set is cleared
    /// and reported as absent.
    pub async fn load(&self) -> AppResult<Option<AuthTokens>> {
        let access = self.storage.get_item(ACCESS_TOKEN_KEY).await?;
        let refresh = self.storage.get_item(REFRESH_TOKEN_KEY).await?;
        let expires = self.storage.get_item(EXPIRES_AT_KEY).await?;

        match (access, refresh, expires) {
            (None, None, None) => Ok(None),
            (Some(access_token), Some(refresh_token), Some(expires)) => {
                match parse_expiry(&expires) {
                    Some(expires_at) => Ok(Some(AuthTokens {
                        access_token,
                        refresh_token,
                        expires_at,
                    })),
                    None => {
                        warn!(value = %expires, "Discarding tokens with unreadable expiry");
                        self.clear().await?;
                        Ok(None)
                    }
                }
            }
            _ => {
                warn!("Discarding incomplete token set");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Replaces the stored token set.
    pub async fn save(&self, tokens: &AuthTokens) -> AppResult<()> {
        self.storage
            .set_item(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await?;
        self.storage
            .set_item(REFRESH_TOKEN_KEY, &tokens.refresh_token)
            .await?;
        self.storage
            .set_item(
                EXPIRES_AT_KEY,
                &tokens.expires_at.timestamp_millis().to_string(),
            )
            .await
    }

    /// Removes every token key.
    pub async fn clear(&self) -> AppResult<()> {
        self.storage.remove_item(ACCESS_TOKEN_KEY).await?;
        self.storage.remove_item(REFRESH_TOKEN_KEY).await?;
        self.storage.remove_item(EXPIRES_AT_KEY).await
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.trim().parse::<i64>().ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
}
