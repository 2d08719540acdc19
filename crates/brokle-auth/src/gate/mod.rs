//! The edge authentication gate.
//!
//! Transport-independent: callers extract the candidate token and hand the
//! gate a path; the HTTP layer turns the [`GateDecision`] into a response.

pub mod decision;
pub mod routes;

pub use decision::{
    Gate, GateDecision, IDENTITY_HEADERS, Identity, ORGANIZATION_ID_HEADER, USER_EMAIL_HEADER,
    USER_ID_HEADER, USER_ROLE_HEADER,
};
pub use routes::{RouteClass, RouteTable};
