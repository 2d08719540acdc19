//! # brokle-auth
//!
//! The Brokle authentication boundary: everything between a bearer token
//! arriving at the edge and a session staying alive on the client.
//!
//! ## Modules
//!
//! - `jwt`: session token claims, signature verification, dev signing
//! - `gate`: route classification and the per-request gate decision
//! - `storage`: durable key/value backends for client state
//! - `session`: the client session store and the persisted token set
//! - `refresh`: the token refresh coordinator and the cross-instance session bus

pub mod gate;
pub mod jwt;
pub mod refresh;
pub mod session;
pub mod storage;

pub use gate::{Gate, GateDecision, Identity, RouteClass};
pub use jwt::{Claims, JwtSigner, JwtVerifier};
pub use refresh::{
    RefreshCoordinator, RefreshOutcome, RefreshState, SessionBus, SessionEvent, StorageBridge,
};
pub use session::{SessionState, SessionStore, TokenStore};
pub use storage::{FileStorage, MemoryStorage};
