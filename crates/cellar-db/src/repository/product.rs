//! # Product Repository
//!
//! Database operations for wines on sale.
//!
//! ## Key Operations
//! - CRUD, with partial updates
//! - Listing per category for the category screen
//!
//! Search and price filtering live in [`crate::catalog`].
//!
//! ## Partial Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ProductUpdate → SQL                                  │
//! │                                                                         │
//! │  ProductUpdate::default().price(9.5)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET price = ?  WHERE id = ?                           │
//! │                                                                         │
//! │  ProductUpdate::default().name("X").img(None)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET name = ?, img = ?  WHERE id = ?                   │
//! │                                                                         │
//! │  Fields left as None are never touched.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{require_affected, DbError, DbResult, LogFailure};
use cellar_core::validation::{validate_new_product, validate_price, validate_product_name};
use cellar_core::{NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, name, price, img, category_id";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let id = repo.create(&new_wine).await?;
/// repo.update(id, &ProductUpdate::default().price(1_250_000.0)).await?;
/// let reds = repo.list_by_category(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product in id order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let result = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_products")
    }

    /// Gets a product by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let result = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("get_product")
    }

    /// Lists the products of one category.
    pub async fn list_by_category(&self, category_id: i64) -> DbResult<Vec<Product>> {
        debug!(category_id, "Listing products by category");

        let result = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY id"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_products_by_category")
    }

    /// Inserts a product and returns its id.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - the category does not exist
    pub async fn create(&self, product: &NewProduct) -> DbResult<i64> {
        validate_new_product(product)?;
        debug!(name = %product.name, category_id = product.category_id, "Creating product");

        let result = sqlx::query(
            "INSERT INTO products (name, price, img, category_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(product.name.trim())
        .bind(product.price)
        .bind(&product.img)
        .bind(product.category_id)
        .execute(&self.pool)
        .await
        .map(|r| r.last_insert_rowid())
        .map_err(DbError::from);

        result.log_failure("create_product")
    }

    /// Writes the supplied fields of `update` to product `id`.
    ///
    /// An empty update writes nothing but still reports a missing product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no product has this id
    /// * `Err(DbError::ForeignKeyViolation)` - the new category does not exist
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<()> {
        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
        }

        if update.is_empty() {
            return match self.get(id).await? {
                Some(_) => Ok(()),
                None => Err(DbError::not_found("Product", id)),
            };
        }

        debug!(id, ?update, "Updating product");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut fields = query.separated(", ");
        if let Some(name) = &update.name {
            fields.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(price) = update.price {
            fields.push("price = ").push_bind_unseparated(price);
        }
        if let Some(img) = &update.img {
            fields.push("img = ").push_bind_unseparated(img.clone());
        }
        if let Some(category_id) = update.category_id {
            fields.push("category_id = ").push_bind_unseparated(category_id);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "Product", id));

        result.log_failure("update_product")
    }

    /// Deletes a product. Order lines that reference it go with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "Product", id));

        result.log_failure("delete_product")
    }

    /// Gets the total product count.
    pub async fn count(&self) -> DbResult<i64> {
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from);

        result.log_failure("count_products")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use cellar_core::{NewProduct, ProductUpdate};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn wine(name: &str, price: f64, category_id: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            img: Some("https://example.com/bottle.jpg".to_string()),
            category_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = db.products();

        let id = repo.create(&wine("Penfolds Grange 2017", 22_000_000.0, 3)).await.unwrap();

        let product = repo.get(id).await.unwrap().unwrap();
        assert_eq!(product.name, "Penfolds Grange 2017");
        assert_eq!(product.price, 22_000_000.0);
        assert_eq!(product.category_id, 3);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = setup().await;
        assert!(db.products().get(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = setup().await;
        let err = db.products().create(&wine("Bad", -1.0, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_with_unknown_category_fails() {
        let db = setup().await;
        let err = db.products().create(&wine("Orphan", 10.0, 999)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let db = setup().await;
        let repo = db.products();
        repo.create(&wine("Tignanello 2019", 3_500_000.0, 4)).await.unwrap();
        repo.create(&wine("Tignanello 2020", 3_700_000.0, 4)).await.unwrap();

        let tuscan = repo.list_by_category(4).await.unwrap();
        assert_eq!(tuscan.len(), 2);
        assert!(tuscan.iter().all(|p| p.category_id == 4));
        assert_eq!(repo.list_by_category(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_given_fields() {
        let db = setup().await;
        let repo = db.products();
        let before = repo.get(1).await.unwrap().unwrap();

        repo.update(1, &ProductUpdate::default().price(16_000_000.0))
            .await
            .unwrap();

        let after = repo.get(1).await.unwrap().unwrap();
        assert_eq!(after.price, 16_000_000.0);
        assert_eq!(after.name, before.name);
        assert_eq!(after.img, before.img);
        assert_eq!(after.category_id, before.category_id);
    }

    #[tokio::test]
    async fn test_update_can_clear_image_and_move_category() {
        let db = setup().await;
        let repo = db.products();

        repo.update(1, &ProductUpdate::default().img(None).category_id(2))
            .await
            .unwrap();

        let product = repo.get(1).await.unwrap().unwrap();
        assert_eq!(product.img, None);
        assert_eq!(product.category_id, 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = setup().await;
        let repo = db.products();

        let err = repo
            .update(404, &ProductUpdate::default().name("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo.update(404, &ProductUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let repo = db.products();

        repo.delete(1).await.unwrap();
        assert!(repo.get(1).await.unwrap().is_none());
        assert!(matches!(repo.delete(1).await, Err(DbError::NotFound { .. })));
    }
}
