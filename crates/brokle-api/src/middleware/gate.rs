//! The authentication gate as Axum middleware.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::warn;

use brokle_auth::GateDecision;
use brokle_auth::gate::IDENTITY_HEADERS;

use crate::extractors::extract_token;
use crate::state::AppState;

/// Evaluates every request against the gate.
///
/// Client-supplied identity headers are always removed first. Redirects are
/// `307 Temporary Redirect`; authenticated requests continue with the
/// verified identity headers attached.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers_mut();
    for name in IDENTITY_HEADERS {
        headers.remove(name);
    }

    let token = extract_token(request.headers(), &state.config.auth);
    let path = request.uri().path().to_string();

    match state.gate.decide(&path, token.as_deref()) {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::Authenticated(identity) => {
            for (name, value) in identity.headers() {
                match HeaderValue::from_str(&value) {
                    Ok(value) => {
                        request.headers_mut().insert(name, value);
                    }
                    Err(_) => {
                        warn!(header = name, "Claim is not a valid header value; rejecting token");
                        return Redirect::temporary(&state.gate.sign_in_location(&path))
                            .into_response();
                    }
                }
            }
            next.run(request).await
        }
        GateDecision::Redirect { location } => Redirect::temporary(&location).into_response(),
    }
}
