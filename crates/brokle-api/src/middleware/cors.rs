//! CORS layer configuration.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use brokle_core::config::{AuthConfig, CorsConfig};

/// Builds a CORS tower layer from configuration. The auth headers the gate
/// reads are always allowed.
pub fn build_cors_layer(config: &CorsConfig, auth: &AuthConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    let mut headers = vec![AUTHORIZATION, CONTENT_TYPE];
    if let Ok(custom) = HeaderName::try_from(auth.custom_header.as_str()) {
        headers.push(custom);
    }
    layer = layer.allow_headers(headers);

    layer.max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
