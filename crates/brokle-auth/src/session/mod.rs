//! Client session state: identity, scope, and the persisted token set.

pub mod state;
pub mod store;
pub mod tokens;

pub use state::{PersistedSession, SNAPSHOT_VERSION, SessionState};
pub use store::{SESSION_STORAGE_KEY, SessionStore};
pub use tokens::TokenStore;
