//! Durable key/value backends implementing [`StateStorage`].
//!
//! [`StateStorage`]: brokle_core::traits::StateStorage

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
