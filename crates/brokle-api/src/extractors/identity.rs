//! `RequestIdentity` extractor: the identity the gate attached to the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use brokle_auth::Identity;
use brokle_auth::gate::{
    ORGANIZATION_ID_HEADER, USER_EMAIL_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};
use brokle_core::error::AppError;
use brokle_core::types::Role;

use crate::error::ApiError;

/// Identity of a request that passed the gate on a protected route.
///
/// Inbound copies of the identity headers are stripped by the gate, so
/// their presence here means the gate verified a token.
#[derive(Debug, Clone)]
pub struct RequestIdentity(pub Identity);

impl std::ops::Deref for RequestIdentity {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Claim values may carry UTF-8 (an internationalised email), which
        // `HeaderValue::to_str` rejects.
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (Some(user_id), Some(email), Some(organization_id), Some(role)) = (
            header(USER_ID_HEADER),
            header(USER_EMAIL_HEADER),
            header(ORGANIZATION_ID_HEADER),
            header(USER_ROLE_HEADER),
        ) else {
            return Err(AppError::authentication("Request is not authenticated").into());
        };

        let role: Role = role.parse()?;

        Ok(Self(Identity {
            user_id,
            email,
            organization_id,
            role,
        }))
    }
}
