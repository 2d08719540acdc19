//! Page handlers downstream of the gate.
//!
//! Auth-only pages only ever see signed-out visitors; protected pages only
//! ever see requests carrying a verified identity.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};

use crate::dto::{ApiResponse, AuthFormPage, LandingPage, PageContext};
use crate::extractors::RequestIdentity;
use crate::state::AppState;

/// GET /
pub async fn landing(State(state): State<AppState>) -> Json<ApiResponse<LandingPage>> {
    Json(ApiResponse::ok(LandingPage {
        title: "Brokle".to_string(),
        sign_in_path: state.config.routes.sign_in_path.clone(),
        sign_up_path: "/auth/signup".to_string(),
    }))
}

/// GET /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse<AuthFormPage>> {
    auth_form("signin", &state, &query)
}

/// GET /auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse<AuthFormPage>> {
    auth_form("signup", &state, &query)
}

/// GET /auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse<AuthFormPage>> {
    auth_form("forgot-password", &state, &query)
}

/// GET /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse<AuthFormPage>> {
    auth_form("reset-password", &state, &query)
}

fn auth_form(
    form: &str,
    state: &AppState,
    query: &HashMap<String, String>,
) -> Json<ApiResponse<AuthFormPage>> {
    let redirect = query
        .get(&state.config.routes.redirect_param)
        .and_then(|r| safe_redirect(r));
    let reason = query.get("reason").cloned();
    let notice = reason.as_deref().and_then(notice_for).map(str::to_string);

    Json(ApiResponse::ok(AuthFormPage {
        form: form.to_string(),
        redirect,
        reason,
        notice,
    }))
}

/// Only same-origin absolute paths are followed after sign-in.
fn safe_redirect(target: &str) -> Option<String> {
    let ok = target.starts_with('/') && !target.starts_with("//") && !target.contains('\\');
    ok.then(|| target.to_string())
}

fn notice_for(reason: &str) -> Option<&'static str> {
    match reason {
        "session_expired" => Some("Your session has expired. Please sign in again."),
        "signed_out" => Some("You have been signed out."),
        _ => None,
    }
}

/// GET /dashboard
pub async fn dashboard(identity: RequestIdentity) -> Json<ApiResponse<PageContext>> {
    Json(ApiResponse::ok(PageContext::new("dashboard", &identity)))
}

/// GET /organizations/{org_slug}
pub async fn organization(
    identity: RequestIdentity,
    Path(org_slug): Path<String>,
) -> Json<ApiResponse<PageContext>> {
    let mut context = PageContext::new("organization", &identity);
    context.organization_slug = Some(org_slug);
    Json(ApiResponse::ok(context))
}

/// GET /organizations/{org_slug}/projects/{project_slug}
pub async fn project(
    identity: RequestIdentity,
    Path((org_slug, project_slug)): Path<(String, String)>,
) -> Json<ApiResponse<PageContext>> {
    let mut context = PageContext::new("project", &identity);
    context.organization_slug = Some(org_slug);
    context.project_slug = Some(project_slug);
    Json(ApiResponse::ok(context))
}

/// GET /settings
pub async fn settings(identity: RequestIdentity) -> Json<ApiResponse<PageContext>> {
    Json(ApiResponse::ok(PageContext::new("settings", &identity)))
}

/// GET /settings/{*section}
pub async fn settings_section(
    identity: RequestIdentity,
    Path(section): Path<String>,
) -> Json<ApiResponse<PageContext>> {
    let mut context = PageContext::new("settings", &identity);
    context.section = Some(section);
    Json(ApiResponse::ok(context))
}
