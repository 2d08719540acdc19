//! Request and response bodies of the backend REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use brokle_core::types::{AuthTokens, Organization, User};

/// Envelope wrapping every backend response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload on success.
    pub data: Option<T>,
    /// Error details on failure.
    pub error: Option<ApiErrorBody>,
}

/// Error details reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable code, e.g. `INVALID_CREDENTIALS`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Email/password sign-in.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// New account registration.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Organization to create alongside the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub organization_name: Option<String>,
}

/// Body of the refresh and logout calls.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshTokenBody<'a> {
    pub refresh_token: &'a str,
}

/// Profile fields the user may change.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Successful sign-in or sign-up.
#[derive(Clone, Deserialize, Validate)]
pub struct AuthResponse {
    #[validate(length(min = 1))]
    pub access_token: String,
    #[validate(length(min = 1))]
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    #[validate(range(min = 1))]
    pub expires_in: i64,
    #[validate(nested)]
    pub user: User,
    #[serde(default)]
    #[validate(nested)]
    pub organization: Option<Organization>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user.id)
            .field(
                "organization",
                &self.organization.as_ref().map(|o| o.id.as_str()),
            )
            .finish()
    }
}

impl AuthResponse {
    /// Token set expiring `expires_in` seconds after `now`.
    pub fn tokens(&self, now: DateTime<Utc>) -> AuthTokens {
        AuthTokens::from_expires_in(
            self.access_token.clone(),
            self.refresh_token.clone(),
            self.expires_in,
            now,
        )
    }
}

/// Successful token refresh. The backend may keep the refresh token as is,
/// in which case it is omitted.
#[derive(Clone, Deserialize, Validate)]
pub struct TokenResponse {
    #[validate(length(min = 1))]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("rotated", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenResponse {
    /// Token set built from this response, keeping `previous_refresh` when
    /// no new refresh token was issued.
    pub fn into_tokens(self, previous_refresh: &str, now: DateTime<Utc>) -> AuthTokens {
        AuthTokens::from_expires_in(
            self.access_token,
            self.refresh_token
                .unwrap_or_else(|| previous_refresh.to_string()),
            self.expires_in,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_rejects_bad_user() {
        let body = r#"{
            "access_token": "a", "refresh_token": "r", "expires_in": 900,
            "user": {"id": "u1", "email": "nope"}
        }"#;
        let parsed: AuthResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn test_refresh_keeps_previous_token() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a2", "expires_in": 900}"#).unwrap();
        let now = Utc::now();
        let tokens = parsed.into_tokens("r1", now);
        assert_eq!(tokens.refresh_token, "r1");
        assert_eq!(tokens.expires_at, now + chrono::Duration::seconds(900));
    }

    #[test]
    fn test_envelope_error_shape() {
        let envelope: ApiEnvelope<AuthResponse> = serde_json::from_str(
            r#"{"success": false, "error": {"code": "INVALID_CREDENTIALS", "message": "Invalid email or password"}}"#,
        )
        .unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.unwrap().code, "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_envelope_success_without_error_field() {
        let envelope: ApiEnvelope<User> = serde_json::from_str(
            r#"{"success": true, "data": {"id": "u1", "email": "ada@brokle.dev", "name": "Ada"}}"#,
        )
        .unwrap();
        assert!(envelope.success);
        assert!(envelope.error.is_none());
        assert_eq!(envelope.data.unwrap().email, "ada@brokle.dev");
    }

    #[test]
    fn test_signup_password_length() {
        let req = SignUpRequest {
            email: "ada@brokle.dev".into(),
            password: "short".into(),
            name: "Ada".into(),
            organization_name: None,
        };
        assert!(req.validate().is_err());
    }
}
