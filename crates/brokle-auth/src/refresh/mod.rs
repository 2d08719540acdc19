//! Token refresh coordination.
//!
//! The coordinator keeps one session instance's tokens alive and ends the
//! session when they cannot be renewed. Sibling instances stay in step
//! through the [`SessionBus`]; a [`StorageBridge`] extends the bus to other
//! processes sharing the same storage.

pub mod bridge;
pub mod bus;
pub mod coordinator;
pub mod state;

pub use bridge::StorageBridge;
pub use bus::{BusMessage, SessionBus, SessionEvent};
pub use coordinator::RefreshCoordinator;
pub use state::{EndReason, RefreshOutcome, RefreshState};
