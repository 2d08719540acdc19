//! Shared test helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode, header};
use jsonwebtoken::Algorithm;
use serde_json::Value;
use tower::ServiceExt;

use brokle_api::{AppState, build_app};
use brokle_auth::{Claims, Gate, JwtSigner, JwtVerifier};
use brokle_core::config::AppConfig;
use brokle_core::types::Role;

pub const RSA_PRIVATE: &str = include_str!("../../crates/brokle-auth/tests/fixtures/rsa_private.pem");
pub const RSA_PUBLIC: &str = include_str!("../../crates/brokle-auth/tests/fixtures/rsa_public.pem");
pub const RSA_OTHER_PRIVATE: &str =
    include_str!("../../crates/brokle-auth/tests/fixtures/rsa_other_private.pem");

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    signer: JwtSigner,
}

impl TestApp {
    /// Gate server with default routes and the fixture verification key
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Gate server with custom configuration and the fixture verification key
    pub fn with_config(config: AppConfig) -> Self {
        let verifier = JwtVerifier::from_pem(
            RSA_PUBLIC.as_bytes(),
            Algorithm::RS256,
            &config.auth.issuer,
            0,
        )
        .expect("Failed to load verification key");
        let gate = Gate::new(&config.routes, Some(verifier));
        Self::with_gate(config, gate)
    }

    /// Gate server around an explicit gate
    pub fn with_gate(config: AppConfig, gate: Gate) -> Self {
        let signer = JwtSigner::from_pem(
            RSA_PRIVATE.as_bytes(),
            Algorithm::RS256,
            &config.auth.issuer,
            15,
        )
        .expect("Failed to load signing key");
        let router = build_app(AppState::with_gate(config.clone(), gate));
        Self {
            router,
            config,
            signer,
        }
    }

    /// A valid token for `u1` in `org-1` as a developer
    pub fn token(&self) -> String {
        self.token_for("ada@brokle.dev")
    }

    /// A valid token like [`token`](Self::token), for another email
    pub fn token_for(&self, email: &str) -> String {
        self.signer
            .issue("u1", email, "org-1", Role::Developer)
            .expect("Failed to issue token")
            .0
    }

    /// A correctly signed token whose `exp` is in the past
    pub fn expired_token(&self) -> String {
        let now = Utc::now().timestamp();
        self.signer
            .sign(&Claims {
                sub: "u1".into(),
                email: "ada@brokle.dev".into(),
                organization_id: "org-1".into(),
                role: Role::Developer,
                iat: now - 1000,
                exp: now - 120,
                iss: self.config.auth.issuer.clone(),
            })
            .expect("Failed to sign token")
    }

    /// A token signed with a key the gate does not trust
    pub fn foreign_token(&self) -> String {
        JwtSigner::from_pem(
            RSA_OTHER_PRIVATE.as_bytes(),
            Algorithm::RS256,
            &self.config.auth.issuer,
            15,
        )
        .expect("Failed to load foreign key")
        .issue("u1", "ada@brokle.dev", "org-1", Role::Owner)
        .expect("Failed to issue token")
        .0
    }

    /// GET `path` with a bearer token, if any
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let headers: Vec<(&str, String)> = token
            .map(|t| vec![("authorization", format!("Bearer {t}"))])
            .unwrap_or_default();
        self.get_with_headers(path, &headers).await
    }

    /// GET `path` with arbitrary request headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, String)]) -> TestResponse {
        let mut req = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// `Location` header, for redirects
    pub location: Option<String>,
    /// Parsed JSON body
    pub body: Value,
}
