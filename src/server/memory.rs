use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::RwLock;

use crate::auth::Auth;
use crate::error::{AuthError, Result};

/// Registered user record.
#[derive(Clone, Debug)]
struct UserRecord {
    id: i64,
    password: String,
    is_admin: bool,
}

/// In-memory [`Auth`] backend for the development server and tests.
///
/// This is deliberately not a credential engine: passwords are held verbatim
/// in process memory and session tokens are random bytes that are never
/// verified. Production deployments implement [`Auth`] against a real
/// credential store.
pub struct MemoryAuth {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    /// Users keyed by email.
    users: HashMap<String, UserRecord>,
    /// Application identifiers accepted at login.
    apps: HashSet<i32>,
    next_user_id: i64,
}

impl MemoryAuth {
    /// Creates an empty backend with no users and no known applications.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                users: HashMap::new(),
                apps: HashSet::new(),
                next_user_id: 1,
            })),
        }
    }

    /// Adds an application identifier to the set accepted at login.
    pub async fn register_app(&self, app_id: i32) {
        let mut inner = self.inner.write().await;
        inner.apps.insert(app_id);
    }

    /// Grants or revokes the admin role for a user.
    ///
    /// # Errors
    /// [`AuthError::UserNotFound`] if no such user exists.
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .values_mut()
            .find(|record| record.id == user_id)
            .ok_or(AuthError::UserNotFound)?;

        record.is_admin = is_admin;
        Ok(())
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.users.len()
    }

    fn issue_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[async_trait]
impl Auth for MemoryAuth {
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String> {
        let inner = self.inner.read().await;

        // An unknown application is a deployment problem, not a credentials
        // failure; it surfaces to callers as an opaque internal error.
        if !inner.apps.contains(&app_id) {
            return Err(AuthError::Internal(format!("unknown app id {app_id}")));
        }

        let record = inner
            .users
            .get(email)
            .ok_or(AuthError::InvalidCredentials)?;

        if record.password != password {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Self::issue_token())
    }

    async fn register_new_user(&self, email: &str, password: &str) -> Result<i64> {
        let mut inner = self.inner.write().await;

        if inner.users.contains_key(email) {
            return Err(AuthError::UserExists);
        }

        let id = inner.next_user_id;
        inner.next_user_id += 1;

        inner.users.insert(
            email.to_string(),
            UserRecord {
                id,
                password: password.to_string(),
                is_admin: false,
            },
        );

        Ok(id)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool> {
        let inner = self.inner.read().await;

        inner
            .users
            .values()
            .find(|record| record.id == user_id)
            .map(|record| record.is_admin)
            .ok_or(AuthError::UserNotFound)
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryAuth {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registration_assigns_sequential_ids() {
        let auth = MemoryAuth::new();

        let first = auth.register_new_user("a@example.com", "pw").await.unwrap();
        let second = auth.register_new_user("b@example.com", "pw").await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(auth.user_count().await, 2);
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let auth = MemoryAuth::new();

        auth.register_new_user("a@example.com", "pw").await.unwrap();
        let err = auth
            .register_new_user("a@example.com", "other")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserExists));
    }

    #[tokio::test]
    async fn login_checks_password_and_app() {
        let auth = MemoryAuth::new();
        auth.register_app(1).await;
        auth.register_new_user("a@example.com", "pw").await.unwrap();

        let token = auth.login("a@example.com", "pw", 1).await.unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let err = auth.login("a@example.com", "wrong", 1).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.login("missing@example.com", "pw", 1).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.login("a@example.com", "pw", 99).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn admin_flag_round_trip() {
        let auth = MemoryAuth::new();
        let id = auth.register_new_user("a@example.com", "pw").await.unwrap();

        assert!(!auth.is_admin(id).await.unwrap());

        auth.set_admin(id, true).await.unwrap();
        assert!(auth.is_admin(id).await.unwrap());

        let err = auth.is_admin(999).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = auth.set_admin(999, true).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
