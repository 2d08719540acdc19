//! # brokle-core
//!
//! Core crate for the Brokle auth boundary. Contains configuration schemas,
//! the unified error system, the storage and renewal traits, and the
//! identity types shared by the gate, the session store, and the backend
//! client.
//!
//! This crate has **no** internal dependencies on other Brokle crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
