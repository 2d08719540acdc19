//! Route classification configuration for the edge gate.

use serde::{Deserialize, Serialize};

/// Declares which paths are public, which are auth-only, and where the gate
/// sends redirected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Paths that never require a token. `/` matches only itself; every
    /// other entry also matches its sub-paths.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    /// Paths only meant for signed-out visitors (sign-in, sign-up, ...).
    #[serde(default = "default_auth_only_paths")]
    pub auth_only_paths: Vec<String>,
    /// Where unauthenticated visitors of protected paths are sent.
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
    /// Where authenticated visitors of auth-only paths are sent.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// Query parameter carrying the originally requested path.
    #[serde(default = "default_redirect_param")]
    pub redirect_param: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            public_paths: default_public_paths(),
            auth_only_paths: default_auth_only_paths(),
            sign_in_path: default_sign_in_path(),
            landing_path: default_landing_path(),
            redirect_param: default_redirect_param(),
        }
    }
}

fn default_public_paths() -> Vec<String> {
    ["/", "/api/health", "/_next", "/static", "/favicon.ico"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_auth_only_paths() -> Vec<String> {
    [
        "/auth/signin",
        "/auth/signup",
        "/auth/forgot-password",
        "/auth/reset-password",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_sign_in_path() -> String {
    "/auth/signin".to_string()
}

fn default_landing_path() -> String {
    "/dashboard".to_string()
}

fn default_redirect_param() -> String {
    "redirect".to_string()
}
