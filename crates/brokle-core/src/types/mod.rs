//! Identity and scoping types shared across the Brokle crates.

pub mod api_key;
pub mod identity;
pub mod role;
pub mod tokens;

pub use api_key::ApiKey;
pub use identity::{Organization, Project, User};
pub use role::Role;
pub use tokens::AuthTokens;
