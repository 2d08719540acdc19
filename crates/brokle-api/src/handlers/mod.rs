//! Request handlers.

pub mod health;
pub mod pages;

use brokle_core::error::AppError;

use crate::error::ApiError;

/// Fallback for unknown paths that made it past the gate.
pub async fn not_found() -> ApiError {
    AppError::not_found("Page not found").into()
}
