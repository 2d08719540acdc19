//! # brokle-api
//!
//! HTTP layer for the Brokle dashboard edge, built on Axum.
//!
//! Every request passes through the authentication gate middleware before
//! reaching a handler. Protected handlers read the identity the gate
//! attached instead of looking at tokens themselves.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
