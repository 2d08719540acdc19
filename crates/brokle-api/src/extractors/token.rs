//! Access token lookup on an incoming request.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::CookieJar;

use brokle_core::config::AuthConfig;

/// Finds the access token, in order: `Authorization: Bearer`, the access
/// cookie, then the custom auth header. Empty values are skipped.
pub fn extract_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    bearer_token(headers)
        .or_else(|| cookie_token(headers, &config.access_cookie))
        .or_else(|| header_token(headers, &config.custom_header))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    non_empty(token)
}

fn cookie_token(headers: &HeaderMap, name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(name)?;
    non_empty(cookie.value())
}

fn header_token(headers: &HeaderMap, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    non_empty(headers.get(name)?.to_str().ok()?)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
