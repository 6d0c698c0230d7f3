//! # Catalog Query Layer
//!
//! Read-side filtering for the listing screens.
//!
//! ## Keyword Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    search("CHÂTEAU")                                    │
//! │                                                                         │
//! │  products LEFT JOIN categories                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lowercase(product name)  contains "château" ?  ──┐                    │
//! │  lowercase(category name) contains "château" ?  ──┴─► keep             │
//! │                                                                         │
//! │  Folding happens in Rust: SQLite's LIKE/lower() only fold ASCII, so    │
//! │  "CHÂTEAU" would never meet "Château" in SQL.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Explore Screen
//! [`Catalog::browse`] applies [`CatalogFilter`] precedence: a complete price
//! range replaces the keyword instead of narrowing it.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, LogFailure};
use cellar_core::{CatalogFilter, CatalogQuery, Product};

/// Product row joined with its category's name.
#[derive(Debug, FromRow)]
struct CatalogRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
}

impl CatalogRow {
    fn matches(&self, needle: &str) -> bool {
        self.product.name.to_lowercase().contains(needle)
            || self
                .category_name
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

/// Search and filter over the product table.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Catalog { pool }
    }

    /// Products whose name, or whose category's name, contains `keyword`
    /// ignoring case.
    ///
    /// The empty keyword is not special-cased; it matches every product.
    pub async fn search(&self, keyword: &str) -> DbResult<Vec<Product>> {
        debug!(keyword, "Searching catalog");

        let result = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT p.id, p.name, p.price, p.img, p.category_id, c.name AS category_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
        .map(|rows| {
            let needle = keyword.to_lowercase();
            rows.into_iter()
                .filter(|row| row.matches(&needle))
                .map(|row| row.product)
                .collect::<Vec<_>>()
        });

        if let Ok(products) = &result {
            debug!(count = products.len(), "Search returned products");
        }
        result.log_failure("search_products")
    }

    /// Products with `min <= price <= max`.
    ///
    /// Bounds are not checked; an inverted range simply matches nothing.
    /// Use `validate_price_range` first when the bounds come from a user.
    pub async fn filter_by_price_range(&self, min: f64, max: f64) -> DbResult<Vec<Product>> {
        debug!(min, max, "Filtering catalog by price");

        let result = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, img, category_id
            FROM products
            WHERE price >= ?1 AND price <= ?2
            ORDER BY price, id
            "#,
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("filter_products_by_price")
    }

    /// Runs the query an explore-screen filter resolves to.
    ///
    /// ```text
    /// valid min and max   → filter_by_price_range(min, max)   (keyword ignored)
    /// non-blank keyword   → search(keyword)
    /// otherwise           → every product
    /// ```
    pub async fn browse(&self, filter: &CatalogFilter) -> DbResult<Vec<Product>> {
        match filter.resolve() {
            CatalogQuery::PriceRange { min, max } => self.filter_by_price_range(min, max).await,
            CatalogQuery::Keyword(keyword) => self.search(&keyword).await,
            CatalogQuery::All => {
                let result = sqlx::query_as::<_, Product>(
                    "SELECT id, name, price, img, category_id FROM products ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::from);

                result.log_failure("browse_catalog")
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
