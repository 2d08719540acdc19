//! The backend HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use validator::Validate;

use brokle_core::config::ApiConfig;
use brokle_core::error::{AppError, ErrorKind};
use brokle_core::result::AppResult;
use brokle_core::traits::TokenRenewer;
use brokle_core::types::{AuthTokens, User};

use crate::dto::{
    ApiEnvelope, ApiErrorBody, AuthResponse, ProfileUpdate, RefreshTokenBody, SignInRequest,
    SignUpRequest, TokenResponse,
};

/// Client for the Brokle REST API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for `config.base_url` with the configured timeout.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("brokle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Signs in with email and password.
    pub async fn sign_in(&self, request: &SignInRequest) -> AppResult<AuthResponse> {
        request.validate()?;
        let response: AuthResponse = self
            .send(self.http.post(self.url("/auth/login")).json(request))
            .await?;
        response.validate()?;
        debug!(user_id = %response.user.id, "Signed in");
        Ok(response)
    }

    /// Creates an account and signs in.
    pub async fn sign_up(&self, request: &SignUpRequest) -> AppResult<AuthResponse> {
        request.validate()?;
        let response: AuthResponse = self
            .send(self.http.post(self.url("/auth/signup")).json(request))
            .await?;
        response.validate()?;
        debug!(user_id = %response.user.id, "Signed up");
        Ok(response)
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        let response: TokenResponse = self
            .send(
                self.http
                    .post(self.url("/auth/refresh"))
                    .json(&RefreshTokenBody { refresh_token }),
            )
            .await?;
        response.validate()?;
        Ok(response)
    }

    /// Revokes the session on the backend.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> AppResult<()> {
        self.execute::<serde_json::Value>(
            self.http
                .post(self.url("/auth/logout"))
                .bearer_auth(access_token)
                .json(&RefreshTokenBody { refresh_token }),
        )
        .await?;
        Ok(())
    }

    /// Fetches the signed-in user.
    pub async fn current_user(&self, access_token: &str) -> AppResult<User> {
        let user: User = self
            .send(self.http.get(self.url("/users/me")).bearer_auth(access_token))
            .await?;
        user.validate()?;
        Ok(user)
    }

    /// Updates the signed-in user's profile and returns the stored record.
    pub async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> AppResult<User> {
        update.validate()?;
        let user: User = self
            .send(
                self.http
                    .patch(self.url("/users/me"))
                    .bearer_auth(access_token)
                    .json(update),
            )
            .await?;
        user.validate()?;
        Ok(user)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        self.execute(request)
            .await?
            .ok_or_else(|| AppError::external_service("Backend returned an empty response"))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<Option<T>> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        let envelope = match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(AppError::with_source(
                    ErrorKind::ExternalService,
                    "Backend returned a malformed response",
                    e,
                ));
            }
            Err(_) => return Err(status_error(status, None)),
        };

        if !status.is_success() || !envelope.success {
            let error = status_error(status, envelope.error);
            warn!(%status, kind = %error.kind, "Backend call failed");
            return Err(error);
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl TokenRenewer for BackendClient {
    async fn renew(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let response = self.refresh(refresh_token).await?;
        Ok(response.into_tokens(refresh_token, Utc::now()))
    }

    async fn revoke(&self, tokens: &AuthTokens) -> AppResult<()> {
        self.logout(&tokens.access_token, &tokens.refresh_token)
            .await
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    let message = if err.is_timeout() {
        "Backend request timed out"
    } else if err.is_connect() {
        "Backend is unreachable"
    } else if err.is_decode() {
        "Failed to read backend response"
    } else {
        "Backend request failed"
    };
    AppError::with_source(ErrorKind::ExternalService, message, err)
}

/// Maps an HTTP failure (or a failed envelope on a 2xx) onto an error kind.
fn status_error(status: StatusCode, body: Option<ApiErrorBody>) -> AppError {
    let message = match body {
        Some(body) => format!("{}: {}", body.code, body.message),
        None => format!("Backend returned {status}"),
    };
    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Validation,
        StatusCode::SERVICE_UNAVAILABLE => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::ExternalService,
    };
    AppError::new(kind, message)
}
