//! Convenience result type alias for Brokle.

use crate::error::AppError;

/// A specialized `Result` type for Brokle operations.
pub type AppResult<T> = Result<T, AppError>;
