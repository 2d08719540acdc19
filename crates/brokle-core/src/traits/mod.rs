//! Trait seams between the session layer and its collaborators.

pub mod renewer;
pub mod storage;

pub use renewer::TokenRenewer;
pub use storage::StateStorage;
