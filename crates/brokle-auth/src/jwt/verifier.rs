//! Session token signature verification against a public key.

use std::str::FromStr;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use brokle_core::config::AuthConfig;
use brokle_core::error::{AppError, ErrorKind};

use super::claims::Claims;

/// Verifies session tokens with an asymmetric public key and an expected issuer.
///
/// Holds only in-memory key material; verification does no I/O and does not
/// consume the token, so verifying the same token twice gives the same result.
#[derive(Clone)]
pub struct JwtVerifier {
    /// Public key for signature checks.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    /// Creates a verifier from auth configuration, loading the public key.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let algorithm = parse_algorithm(&config.algorithm)?;
        let pem = config.resolve_public_key()?;
        Self::from_pem(pem.as_bytes(), algorithm, &config.issuer, config.leeway_seconds)
    }

    /// Creates a verifier from a PEM-encoded public key.
    pub fn from_pem(
        pem: &[u8],
        algorithm: Algorithm,
        issuer: &str,
        leeway_seconds: u64,
    ) -> Result<Self, AppError> {
        let decoding_key = decoding_key_for(algorithm, pem)?;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verifies a token's signature, issuer, and expiry and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Like [`verify`](Self::verify) with an explicit current unix time for
    /// the expiry re-check.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AppError::authentication("Token has expired"),
                JwtErrorKind::InvalidToken => AppError::authentication("Invalid token format"),
                JwtErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                JwtErrorKind::InvalidIssuer => AppError::authentication("Unexpected token issuer"),
                JwtErrorKind::InvalidAlgorithm => {
                    AppError::authentication("Unexpected token algorithm")
                }
                _ => AppError::authentication(format!("Token validation failed: {e}")),
            },
        )?;

        // Signature validation applies `leeway`; the gate must not accept a
        // token whose `exp` has already passed.
        if token_data.claims.is_expired_at(now) {
            return Err(AppError::authentication("Token has expired"));
        }

        Ok(token_data.claims)
    }
}

/// Parses a configured algorithm name, accepting only asymmetric algorithms.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, AppError> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| AppError::configuration(format!("Unknown signature algorithm '{name}'")))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(AppError::configuration(
            format!("Symmetric algorithm '{name}' cannot be verified with a public key"),
        )),
        other => Ok(other),
    }
}

fn decoding_key_for(algorithm: Algorithm, pem: &[u8]) -> Result<DecodingKey, AppError> {
    let key = match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Err(AppError::configuration(
                "Symmetric algorithms are not supported for verification",
            ));
        }
    };

    key.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Invalid {algorithm:?} public key"),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::signer::JwtSigner;
    use brokle_core::types::Role;

    const RSA_PRIVATE: &str = include_str!("../../tests/fixtures/rsa_private.pem");
    const RSA_PUBLIC: &str = include_str!("../../tests/fixtures/rsa_public.pem");
    const RSA_OTHER_PRIVATE: &str = include_str!("../../tests/fixtures/rsa_other_private.pem");
    const EC_PRIVATE: &str = include_str!("../../tests/fixtures/ec_private.pem");
    const EC_PUBLIC: &str = include_str!("../../tests/fixtures/ec_public.pem");

    fn claims(exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "u1".into(),
            email: "ada@brokle.dev".into(),
            organization_id: "o1".into(),
            role: Role::Admin,
            iat: now,
            exp: now + exp_offset,
            iss: "brokle".into(),
        }
    }

    fn rsa_verifier(leeway: u64) -> JwtVerifier {
        JwtVerifier::from_pem(RSA_PUBLIC.as_bytes(), Algorithm::RS256, "brokle", leeway).unwrap()
    }

    fn rsa_signer(pem: &str) -> JwtSigner {
        JwtSigner::from_pem(pem.as_bytes(), Algorithm::RS256, "brokle", 15).unwrap()
    }

    #[test]
    fn test_valid_token_verifies() {
        let token = rsa_signer(RSA_PRIVATE).sign(&claims(600)).unwrap();
        let verified = rsa_verifier(0).verify(&token).unwrap();
        assert_eq!(verified.sub, "u1");
        assert_eq!(verified.organization_id, "o1");
        assert_eq!(verified.role, Role::Admin);
    }

    #[test]
    fn test_verification_is_repeatable() {
        let token = rsa_signer(RSA_PRIVATE).sign(&claims(600)).unwrap();
        let verifier = rsa_verifier(0);
        let first = verifier.verify(&token).unwrap();
        let second = verifier.verify(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = rsa_signer(RSA_OTHER_PRIVATE).sign(&claims(600)).unwrap();
        let err = rsa_verifier(0).verify(&token).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_expired_token_rejected_even_within_leeway() {
        let token = rsa_signer(RSA_PRIVATE).sign(&claims(-10)).unwrap();
        let err = rsa_verifier(120).verify(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut c = claims(600);
        c.iss = "someone-else".into();
        let token = rsa_signer(RSA_PRIVATE).sign(&c).unwrap();
        assert!(rsa_verifier(0).verify(&token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let err = rsa_verifier(0).verify("not.a.jwt").unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_ec_keys() {
        let signer = JwtSigner::from_pem(EC_PRIVATE.as_bytes(), Algorithm::ES256, "brokle", 15)
            .unwrap();
        let verifier =
            JwtVerifier::from_pem(EC_PUBLIC.as_bytes(), Algorithm::ES256, "brokle", 0).unwrap();
        let token = signer.sign(&claims(600)).unwrap();
        assert_eq!(verifier.verify(&token).unwrap().email, "ada@brokle.dev");
    }

    #[test]
    fn test_symmetric_algorithm_refused() {
        assert!(parse_algorithm("HS256").is_err());
        assert!(parse_algorithm("RS256").is_ok());
        assert!(parse_algorithm("nope").is_err());
    }

    #[test]
    fn test_garbage_key_is_configuration_error() {
        let err = JwtVerifier::from_pem(b"garbage", Algorithm::RS256, "brokle", 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
