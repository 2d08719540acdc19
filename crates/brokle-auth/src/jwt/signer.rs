//! Session token signing for development and tests.
//!
//! Production tokens are issued by the Brokle backend; this signer lets the
//! `brokle mint-token` command produce tokens the gate accepts.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use brokle_core::config::AuthConfig;
use brokle_core::error::{AppError, ErrorKind};
use brokle_core::types::Role;

use super::claims::Claims;
use super::verifier::parse_algorithm;

/// Creates signed session tokens with a private key.
#[derive(Clone)]
pub struct JwtSigner {
    /// Private key for signing.
    encoding_key: EncodingKey,
    /// Header carrying the algorithm.
    header: Header,
    /// Value for the `iss` claim.
    issuer: String,
    /// Token TTL in minutes.
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("algorithm", &self.header.alg)
            .field("issuer", &self.issuer)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl JwtSigner {
    /// Creates a signer from auth configuration (`auth.private_key_path`).
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let algorithm = parse_algorithm(&config.algorithm)?;
        let path = config.private_key_path.as_deref().ok_or_else(|| {
            AppError::configuration("auth.private_key_path is required to mint tokens")
        })?;
        let pem = std::fs::read(path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to read private key from '{path}'"),
                e,
            )
        })?;
        Self::from_pem(
            &pem,
            algorithm,
            &config.issuer,
            config.token_ttl_minutes as i64,
        )
    }

    /// Creates a signer from a PEM-encoded private key.
    pub fn from_pem(
        pem: &[u8],
        algorithm: Algorithm,
        issuer: &str,
        ttl_minutes: i64,
    ) -> Result<Self, AppError> {
        let key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => EncodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => EncodingKey::from_ed_pem(pem),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                return Err(AppError::configuration(
                    "Symmetric algorithms are not supported for signing",
                ));
            }
        };

        let encoding_key = key.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid {algorithm:?} private key"),
                e,
            )
        })?;

        Ok(Self {
            encoding_key,
            header: Header::new(algorithm),
            issuer: issuer.to_string(),
            ttl_minutes,
        })
    }

    /// Signs the given claims as-is.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }

    /// Issues a token for the given identity, valid for the configured TTL.
    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        organization_id: &str,
        role: Role,
    ) -> Result<(String, Claims), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.ttl_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            organization_id: organization_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = self.sign(&claims)?;
        Ok((token, claims))
    }
}
