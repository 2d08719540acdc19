//! Session token claims, verification, and signing.

pub mod claims;
pub mod signer;
pub mod verifier;

pub use claims::Claims;
pub use signer::JwtSigner;
pub use verifier::{JwtVerifier, parse_algorithm};
