//! # brokle-client
//!
//! Typed access to the Brokle backend REST API: sign-in, sign-up, token
//! refresh, logout, and the current user's profile. Every payload is parsed
//! into explicit structs and validated before it is handed to the session
//! layer.

pub mod client;
pub mod dto;

pub use client::BackendClient;
pub use dto::{
    ApiEnvelope, ApiErrorBody, AuthResponse, ProfileUpdate, SignInRequest, SignUpRequest,
    TokenResponse,
};
