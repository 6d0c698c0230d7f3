//! # Session Gate
//!
//! Login, registration and the admin check that picks which screens a user
//! sees.
//!
//! The admin flag drives navigation only. Anyone holding the database file
//! can flip it, so it is not an access-control boundary.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::password::verify_password;
use crate::repository::UserRepository;
use cellar_core::validation::validate_password;
use cellar_core::{NewUser, User, UserUpdate, ValidationError};

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are not distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The new username or password breaks an input rule.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The database failed underneath the check.
    #[error(transparent)]
    Storage(DbError),
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => AuthError::Validation(e),
            other => AuthError::Storage(other),
        }
    }
}

impl AuthError {
    /// True when registration hit a taken username.
    pub fn is_username_taken(&self) -> bool {
        matches!(self, AuthError::Storage(DbError::UniqueViolation { .. }))
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// True when `user` may open the admin screens.
pub fn is_admin(user: &User) -> bool {
    user.is_admin
}

/// Credential checks over the user table.
#[derive(Debug, Clone)]
pub struct SessionGate {
    users: UserRepository,
}

impl SessionGate {
    pub fn new(users: UserRepository) -> Self {
        SessionGate { users }
    }

    /// Returns the user whose username and password both match.
    ///
    /// ## Errors
    /// * `InvalidCredentials` - unknown username or wrong password
    /// * `Storage` - the lookup itself failed
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        let username = username.trim();
        debug!(username, "Authenticating");

        // Unknown usernames still pay for one argon2 verification
        let user = self.users.find_by_username(username).await?;
        let verified =
            verify_password(password, user.as_ref().map(|u| u.password_hash.as_str())).await;
        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(username, "Authentication failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        info!(user_id = user.id, is_admin = user.is_admin, "User authenticated");
        Ok(user)
    }

    /// Creates a customer account (never an admin) and returns it.
    ///
    /// ## Errors
    /// * `Validation` - username or password rejected
    /// * `Storage(UniqueViolation)` - username taken, see
    ///   [`AuthError::is_username_taken`]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        phone: Option<&str>,
    ) -> AuthResult<User> {
        let mut new_user = NewUser::new(username, password);
        if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
            new_user = new_user.with_phone(phone);
        }

        let id = self.users.create(&new_user).await?;
        info!(user_id = id, "User registered");

        self.users
            .get(id)
            .await?
            .ok_or_else(|| AuthError::Storage(DbError::not_found("User", id)))
    }

    /// Replaces a user's password after checking the current one.
    ///
    /// A missing user and a wrong current password both report
    /// `InvalidCredentials`.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        validate_password(new_password)?;

        let user = self.users.get(user_id).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
        if !verify_password(current_password, stored_hash).await {
            warn!(user_id, "Password change rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.users
            .update(user_id, &UserUpdate::default().password(new_password))
            .await?;
        info!(user_id, "Password changed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
    use crate::{Database, DbConfig};
    use std::time::Instant;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let db = setup().await;
        let user = db
            .session()
            .authenticate(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap();

        assert_eq!(user.username, "admin");
        assert!(is_admin(&user));
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let db = setup().await;
        let gate = db.session();

        let wrong_password = gate.authenticate("admin", "admin124").await.unwrap_err();
        let unknown_user = gate.authenticate("ghost", "admin123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_costs_a_full_verification() {
        let db = setup().await;
        let gate = db.session();

        let start = Instant::now();
        for _ in 0..3 {
            assert!(gate.authenticate("admin", "wrong-pass").await.is_err());
        }
        let known = start.elapsed();

        let start = Instant::now();
        for _ in 0..3 {
            assert!(gate.authenticate("ghost", "wrong-pass").await.is_err());
        }
        let unknown = start.elapsed();

        // Same work on both paths; a skipped hash check is orders of magnitude faster
        assert!(unknown * 5 >= known, "unknown={unknown:?} known={known:?}");
    }

    #[tokio::test]
    async fn test_change_password_for_missing_user() {
        let db = setup().await;
        let err = db
            .session()
            .change_password(999, "admin123", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = setup().await;
        let gate = db.session();

        let user = gate.register("linh", "secret1", Some("0911222333")).await.unwrap();
        assert!(!is_admin(&user));
        assert_eq!(user.phone.as_deref(), Some("0911222333"));

        let logged_in = gate.authenticate("linh", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_taken_username() {
        let db = setup().await;
        let err = db.session().register("admin", "secret1", None).await.unwrap_err();
        assert!(err.is_username_taken());
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let db = setup().await;
        let err = db.session().register("linh", "123", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = setup().await;
        let gate = db.session();
        let user = gate.register("linh", "secret1", None).await.unwrap();

        let err = gate
            .change_password(user.id, "not-it", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        gate.change_password(user.id, "secret1", "secret2").await.unwrap();

        assert!(gate.authenticate("linh", "secret1").await.is_err());
        assert!(gate.authenticate("linh", "secret2").await.is_ok());
    }
}
