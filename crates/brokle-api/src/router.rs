//! Route definitions for the Brokle gate server.
//!
//! The gate middleware wraps every route, including the fallback, so no
//! handler runs before its route class has been enforced.

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with the gate applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(page_routes())
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::gate::authenticate,
        ))
        .with_state(state)
}

/// Public: landing and health
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::pages::landing))
        .route("/api/health", get(handlers::health::health))
}

/// Auth-only forms
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", get(handlers::pages::sign_in))
        .route("/auth/signup", get(handlers::pages::sign_up))
        .route(
            "/auth/forgot-password",
            get(handlers::pages::forgot_password),
        )
        .route("/auth/reset-password", get(handlers::pages::reset_password))
}

/// Protected dashboard pages
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::pages::dashboard))
        .route(
            "/organizations/{org_slug}",
            get(handlers::pages::organization),
        )
        .route(
            "/organizations/{org_slug}/projects/{project_slug}",
            get(handlers::pages::project),
        )
        .route("/settings", get(handlers::pages::settings))
        .route("/settings/{*section}", get(handlers::pages::settings_section))
}
