//! Token verification configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Settings for verifying (and, in development, minting) session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Inline PEM-encoded public key. Takes precedence over `public_key_path`.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Path to a PEM-encoded public key file.
    #[serde(default)]
    pub public_key_path: Option<String>,
    /// Signature algorithm (`RS256`, `RS384`, `RS512`, `PS256`, `ES256`, `ES384`, `EdDSA`).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Clock skew tolerance applied by signature validation, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Name of the backup access-token cookie.
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
    /// Name of the custom auth header consulted last.
    #[serde(default = "default_custom_header")]
    pub custom_header: String,
    /// Path to a PEM private key, only used by `brokle mint-token`.
    #[serde(default)]
    pub private_key_path: Option<String>,
    /// Lifetime of minted development tokens, in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            public_key_path: None,
            algorithm: default_algorithm(),
            issuer: default_issuer(),
            leeway_seconds: 0,
            access_cookie: default_access_cookie(),
            custom_header: default_custom_header(),
            private_key_path: None,
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

impl AuthConfig {
    /// Resolves the verification key PEM from the inline value or the key file.
    pub fn resolve_public_key(&self) -> Result<String, AppError> {
        if let Some(pem) = self.public_key.as_deref().filter(|p| !p.trim().is_empty()) {
            return Ok(pem.replace("\\n", "\n"));
        }

        match self.public_key_path.as_deref() {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::with_source(
                    crate::error::ErrorKind::Configuration,
                    format!("Failed to read public key from '{path}'"),
                    e,
                )
            }),
            None => Err(AppError::configuration(
                "No verification key configured (set auth.public_key or auth.public_key_path)",
            )),
        }
    }
}

fn default_algorithm() -> String {
    "RS256".to_string()
}

fn default_issuer() -> String {
    "brokle".to_string()
}

fn default_access_cookie() -> String {
    "access_token".to_string()
}

fn default_custom_header() -> String {
    "x-auth-token".to_string()
}

fn default_token_ttl() -> u64 {
    15
}
