//! Response bodies of the gate server's own routes.

use serde::{Deserialize, Serialize};

use brokle_auth::Identity;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Whether a token verification key is loaded.
    pub verifier_loaded: bool,
}

/// Public landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingPage {
    pub title: String,
    pub sign_in_path: String,
    pub sign_up_path: String,
}

/// Sign-in, sign-up, and password recovery forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFormPage {
    /// Which form, e.g. `signin`.
    pub form: String,
    /// Where to go after a successful sign-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Why the visitor was sent here, e.g. `session_expired`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Notice shown above the form for a known reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// The user as seen by a protected page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

/// Context handed to a protected page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    /// Page name, e.g. `dashboard`.
    pub page: String,
    pub user: PageUser,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_slug: Option<String>,
    /// Settings section, for `/settings/...` pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl PageContext {
    /// Context for `page` as seen by `identity`.
    pub fn new(page: &str, identity: &Identity) -> Self {
        Self {
            page: page.to_string(),
            user: PageUser {
                id: identity.user_id.clone(),
                email: identity.email.clone(),
                role: identity.role.as_str().to_string(),
            },
            organization_id: identity.organization_id.clone(),
            organization_slug: None,
            project_slug: None,
            section: None,
        }
    }
}
