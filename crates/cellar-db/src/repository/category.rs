//! # Category Repository
//!
//! Database operations for wine categories. Deleting a category removes
//! its products (and their order lines) through the foreign-key cascade.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{require_affected, DbError, DbResult, LogFailure};
use cellar_core::validation::validate_new_category;
use cellar_core::{Category, NewCategory};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories in id order.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let result = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon_uri FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_categories")
    }

    /// Gets a category by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Category>> {
        let result = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon_uri FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("get_category")
    }

    /// Inserts a category and returns its id.
    pub async fn create(&self, category: &NewCategory) -> DbResult<i64> {
        validate_new_category(category)?;
        debug!(name = %category.name, "Creating category");

        let result = sqlx::query("INSERT INTO categories (name, icon_uri) VALUES (?1, ?2)")
            .bind(category.name.trim())
            .bind(&category.icon_uri)
            .execute(&self.pool)
            .await
            .map(|r| r.last_insert_rowid())
            .map_err(DbError::from);

        result.log_failure("create_category")
    }

    /// Replaces the name and icon of a category.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no category has this id
    pub async fn update(&self, id: i64, category: &NewCategory) -> DbResult<()> {
        validate_new_category(category)?;
        debug!(id, "Updating category");

        let result = sqlx::query("UPDATE categories SET name = ?2, icon_uri = ?3 WHERE id = ?1")
            .bind(id)
            .bind(category.name.trim())
            .bind(&category.icon_uri)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "Category", id));

        result.log_failure("update_category")
    }

    /// Deletes a category and, by cascade, its products.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "Category", id));

        result.log_failure("delete_category")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
