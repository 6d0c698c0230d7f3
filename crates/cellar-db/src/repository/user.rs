//! # User Repository
//!
//! Storefront accounts. Raw passwords enter through [`NewUser`] and
//! [`UserUpdate`] and are hashed here; only the hash is written.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{require_affected, DbError, DbResult, LogFailure};
use crate::password::hash_password;
use cellar_core::validation::{validate_password, validate_username};
use cellar_core::{NewUser, User, UserUpdate};

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, phone, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks a user up by exact username.
    ///
    /// Returns the full row, credential hash included; comparing it is the
    /// session gate's job.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("find_user_by_username")
    }

    /// Gets a user by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("get_user")
    }

    /// Lists users in id order, optionally leaving administrators out.
    pub async fn list(&self, exclude_admin: bool) -> DbResult<Vec<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE (?1 = 0 OR is_admin = 0) ORDER BY id"
        ))
        .bind(exclude_admin)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_users")
    }

    /// Creates a user and returns its id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the username is taken
    /// * `Err(DbError::Validation)` - username or password rejected
    pub async fn create(&self, user: &NewUser) -> DbResult<i64> {
        validate_username(&user.username)?;
        validate_password(&user.password)?;

        let username = user.username.trim();
        debug!(username, is_admin = user.is_admin, "Creating user");

        let password_hash = hash_password(&user.password).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, is_admin, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(user.is_admin)
        .bind(&user.phone)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|r| r.last_insert_rowid())
        .map_err(|e| username_conflict(e.into(), username));

        result.log_failure("create_user")
    }

    /// Writes the supplied fields of `update` to user `id`.
    ///
    /// An empty update is a no-op and runs no query.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no user has this id
    /// * `Err(DbError::UniqueViolation)` - renamed onto a taken username
    pub async fn update(&self, id: i64, update: &UserUpdate) -> DbResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        if let Some(username) = &update.username {
            validate_username(username)?;
        }
        let password_hash = match &update.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        debug!(id, ?update, "Updating user");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = query.separated(", ");
        if let Some(hash) = password_hash {
            fields.push("password_hash = ").push_bind_unseparated(hash);
        }
        if let Some(phone) = &update.phone {
            fields.push("phone = ").push_bind_unseparated(phone.clone());
        }
        if let Some(username) = &update.username {
            fields.push("username = ").push_bind_unseparated(username.trim().to_string());
        }
        if let Some(is_admin) = update.is_admin {
            fields.push("is_admin = ").push_bind_unseparated(is_admin);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| match &update.username {
                Some(username) => username_conflict(e.into(), username.trim()),
                None => e.into(),
            })
            .and_then(|r| require_affected(r.rows_affected(), "User", id));

        result.log_failure("update_user")
    }

    /// Deletes a user, their orders and those orders' items.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "User", id));

        result.log_failure("delete_user")
    }
}

/// Attaches the offending username to a unique violation.
fn username_conflict(err: DbError, username: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
