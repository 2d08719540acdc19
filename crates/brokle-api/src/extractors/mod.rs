//! Custom Axum extractors and request helpers.

pub mod identity;
pub mod token;

pub use identity::RequestIdentity;
pub use token::extract_token;
