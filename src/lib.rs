//! gRPC transport for a single-sign-on authentication service.
//!
//! The crate exposes three RPCs (`Login`, `Register`, `IsAdmin`) over tonic,
//! validates required request fields, delegates to an injected [`Auth`]
//! capability, and maps domain errors to gRPC status codes. The credential
//! logic itself (password handling, token issuance, user storage) lives
//! behind the [`Auth`] trait; the crate ships only an in-memory development
//! backend for the server binary and tests.

/// Authentication capability trait.
pub mod auth;

/// Domain error types.
pub mod error;

/// gRPC server: transport adapter, configuration, development backend.
pub mod server;

/// Generated protobuf bindings for the `sso` package.
pub mod proto {
    tonic::include_proto!("sso");
}

pub use auth::Auth;
pub use error::{AuthError, Result};
pub use server::{AuthGrpc, MemoryAuth, RateLimiter, ServerConfig};
