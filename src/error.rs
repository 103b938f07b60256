//! Error types for the authentication boundary.

/// Domain errors produced by [`Auth`](crate::Auth) implementations.
///
/// The sentinel variants are matched by identity at the transport layer and
/// translated to specific gRPC status codes; every other failure travels as
/// [`AuthError::Internal`] and surfaces to callers as an opaque internal
/// error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email/password pair was rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user with this email is already registered.
    #[error("user already exists")]
    UserExists,

    /// No user with this identifier is known.
    #[error("user not found")]
    UserNotFound,

    /// Any other backend failure. The message is logged server-side and
    /// never forwarded to the caller.
    #[error("{0}")]
    Internal(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuthError>;
