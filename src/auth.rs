use async_trait::async_trait;

use crate::error::Result;

/// Authentication capability consumed by the gRPC transport adapter.
///
/// Implementations own the credential logic: how passwords are verified,
/// what a session token looks like, and where users live. The transport
/// layer only relies on the sentinel variants of
/// [`AuthError`](crate::AuthError) to pick status codes, so implementations
/// must return those variants for the corresponding conditions and wrap
/// everything else in [`AuthError::Internal`](crate::AuthError::Internal).
#[async_trait]
pub trait Auth: Send + Sync + 'static {
    /// Checks the credentials against the given application and returns an
    /// opaque session token.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`](crate::AuthError::InvalidCredentials)
    /// if the email/password pair is rejected.
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String>;

    /// Creates a new user account and returns its numeric identifier.
    ///
    /// # Errors
    /// [`AuthError::UserExists`](crate::AuthError::UserExists) if the email
    /// is already registered.
    async fn register_new_user(&self, email: &str, password: &str) -> Result<i64>;

    /// Reports whether the user has the admin role.
    ///
    /// # Errors
    /// [`AuthError::UserNotFound`](crate::AuthError::UserNotFound) if no
    /// such user exists.
    async fn is_admin(&self, user_id: i64) -> Result<bool>;
}
