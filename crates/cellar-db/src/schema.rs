//! # Schema Manager
//!
//! Creates, upgrades and seeds the on-device schema. Safe to run on every
//! start.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ensure_schema()                                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── 1. CREATE TABLE IF NOT EXISTS (5 tables) + indexes               │
//! │    │                                                                    │
//! │    ├── 2. Additive migrations (pragma_table_info)                       │
//! │    │       users.phone       missing? → ADD COLUMN                      │
//! │    │       users.created_at  missing? → ADD COLUMN + back-fill now()    │
//! │    │       orders.phone      missing? → ADD COLUMN                      │
//! │    │                                                                    │
//! │    └── 3. _cellar_seed marker present?                                  │
//! │            yes → nothing                                                │
//! │            no  → products empty? → categories, products, admin user     │
//! │                  then write the marker                                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls everything back and surfaces as                      │
//! │  DbError::InitializationFailed.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, LogFailure};
use crate::password::hash_password;
use crate::seed::SeedData;

/// Table definitions, parents before children.
const CREATE_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY NOT NULL,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        phone TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        icon_uri TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        img TEXT,
        category_id INTEGER NOT NULL,
        FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY NOT NULL,
        user_id INTEGER NOT NULL,
        total REAL NOT NULL,
        status TEXT NOT NULL,
        address TEXT NOT NULL,
        phone TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY NOT NULL,
        order_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        price REAL NOT NULL,
        FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE,
        FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS _cellar_seed (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        seeded_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
];

/// Row counts per table, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaStatus {
    pub categories: i64,
    pub products: i64,
    pub users: i64,
    pub orders: i64,
    pub order_items: i64,
}

/// Creates the schema, applies additive migrations and seeds once.
///
/// ## Idempotence
/// - Table creation uses `IF NOT EXISTS`
/// - Columns are only added when `pragma_table_info` lacks them
/// - Seeding runs at most once per database, recorded in `_cellar_seed`.
///   Seed rows deleted or renamed later are never brought back
///
/// ## Errors
/// Every failure is reported as [`DbError::InitializationFailed`].
pub async fn ensure_schema(pool: &SqlitePool, seed: &SeedData) -> DbResult<()> {
    info!("Ensuring database schema");

    let result = run_setup(pool, seed).await;

    result.map_err(DbError::into_initialization).log_failure("ensure_schema")?;

    info!("Database schema ready");
    Ok(())
}

async fn run_setup(pool: &SqlitePool, seed: &SeedData) -> DbResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    create_tables(&mut tx).await?;
    apply_additive_migrations(&mut tx).await?;
    seed_once(&mut tx, seed).await?;

    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

/// Returns row counts for every table.
pub async fn schema_status(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    Ok(SchemaStatus {
        categories: count_rows(pool, "categories").await?,
        products: count_rows(pool, "products").await?,
        users: count_rows(pool, "users").await?,
        orders: count_rows(pool, "orders").await?,
        order_items: count_rows(pool, "order_items").await?,
    })
}

async fn count_rows(pool: &SqlitePool, table: &'static str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn create_tables(conn: &mut SqliteConnection) -> DbResult<()> {
    for statement in CREATE_STATEMENTS {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    debug!(statements = CREATE_STATEMENTS.len(), "Tables ensured");
    Ok(())
}

/// Lists the column names of `table`.
pub(crate) async fn table_columns(conn: &mut SqliteConnection, table: &str) -> DbResult<Vec<String>> {
    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(columns)
}

/// Adds `column` to `table` if it is missing. Returns whether it was added.
async fn add_column_if_missing(
    conn: &mut SqliteConnection,
    table: &'static str,
    column: &'static str,
    definition: &'static str,
) -> DbResult<bool> {
    let columns = table_columns(conn, table).await?;
    if columns.iter().any(|c| c == column) {
        return Ok(false);
    }

    info!(table, column, "Adding missing column");
    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

async fn apply_additive_migrations(conn: &mut SqliteConnection) -> DbResult<()> {
    add_column_if_missing(conn, "orders", "phone", "TEXT").await?;
    add_column_if_missing(conn, "users", "phone", "TEXT").await?;

    // ALTER TABLE cannot add a column with a non-constant default, so rows
    // that predate the column get the migration time instead.
    if add_column_if_missing(conn, "users", "created_at", "TEXT").await? {
        let backfilled = sqlx::query("UPDATE users SET created_at = ?1 WHERE created_at IS NULL")
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?
            .rows_affected();
        info!(rows = backfilled, "Back-filled users.created_at");
    }

    Ok(())
}

async fn seed_once(conn: &mut SqliteConnection, seed: &SeedData) -> DbResult<()> {
    let marked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _cellar_seed")
        .fetch_one(&mut *conn)
        .await?;
    if marked > 0 {
        debug!("Seed already applied");
        return Ok(());
    }

    // Databases created before the marker existed keep their catalogue
    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *conn)
        .await?;
    if products > 0 {
        info!(products, "Catalogue present, recording seed as applied");
    } else {
        insert_seed(conn, seed).await?;
    }

    sqlx::query("INSERT INTO _cellar_seed (id, seeded_at) VALUES (1, ?1)")
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_seed(conn: &mut SqliteConnection, seed: &SeedData) -> DbResult<()> {
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Seeding initial data"
    );

    // OR IGNORE: an unmarked database may already hold these rows
    for category in &seed.categories {
        sqlx::query("INSERT OR IGNORE INTO categories (id, name, icon_uri) VALUES (?1, ?2, ?3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.icon_uri)
            .execute(&mut *conn)
            .await?;
    }

    for product in &seed.products {
        sqlx::query("INSERT INTO products (id, name, price, img, category_id) VALUES (?1, ?2, ?3, ?4, ?5)")
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.img)
            .bind(product.category_id)
            .execute(&mut *conn)
            .await?;
    }

    let admin_hash = hash_password(&seed.admin.password).await?;
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (username, password_hash, is_admin, phone, created_at)
        VALUES (?1, ?2, 1, ?3, ?4)
        "#,
    )
    .bind(&seed.admin.username)
    .bind(admin_hash)
    .bind(&seed.admin.phone)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use cellar_core::{NewProduct, UserUpdate};

    #[tokio::test]
    async fn test_fresh_database_is_seeded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let status = db.schema_status().await.unwrap();
        assert_eq!(status.categories, 6);
        assert_eq!(status.products, 1);
        assert_eq!(status.users, 1);

        let admin = db.users().find_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert_ne!(admin.password_hash, "admin123");
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let once = db.schema_status().await.unwrap();

        db.ensure_schema().await.unwrap();
        db.ensure_schema().await.unwrap();

        assert_eq!(db.schema_status().await.unwrap(), once);
    }

    #[tokio::test]
    async fn test_deleted_seed_rows_stay_deleted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db.users().find_by_username("admin").await.unwrap().unwrap();
        db.users()
            .update(admin.id, &UserUpdate::default().username("boss"))
            .await
            .unwrap();
        db.products().delete(1).await.unwrap();

        db.ensure_schema().await.unwrap();

        let status = db.schema_status().await.unwrap();
        assert_eq!(status.products, 0);
        assert_eq!(status.users, 1);
        assert!(db.users().find_by_username("admin").await.unwrap().is_none());
        assert!(db
            .session()
            .authenticate("admin", "admin123")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_existing_catalogue_is_marked_not_seeded() {
        let db = Database::new(DbConfig::in_memory().ensure_schema(false))
            .await
            .unwrap();
        sqlx::query("CREATE TABLE categories (id INTEGER PRIMARY KEY NOT NULL, name TEXT NOT NULL, icon_uri TEXT)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE products (id INTEGER PRIMARY KEY NOT NULL, name TEXT NOT NULL, \
             price REAL NOT NULL, img TEXT, category_id INTEGER NOT NULL)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO categories (id, name) VALUES (7, 'House')")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO products (name, price, category_id) VALUES ('House Red', 9.5, 7)")
            .execute(db.pool())
            .await
            .unwrap();

        db.ensure_schema().await.unwrap();

        let status = db.schema_status().await.unwrap();
        assert_eq!(status.categories, 1);
        assert_eq!(status.products, 1);
        assert_eq!(status.users, 0);

        // Marked now, so emptying the catalogue does not trigger a seed
        db.products().delete(1).await.unwrap();
        db.ensure_schema().await.unwrap();
        assert_eq!(db.schema_status().await.unwrap().products, 0);
    }

    #[tokio::test]
    async fn test_legacy_tables_gain_missing_columns() {
        let db = Database::new(DbConfig::in_memory().ensure_schema(false))
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY NOT NULL, username TEXT UNIQUE NOT NULL, \
             password_hash TEXT NOT NULL, is_admin INTEGER NOT NULL)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY NOT NULL, user_id INTEGER NOT NULL, \
             total REAL NOT NULL, status TEXT NOT NULL, address TEXT NOT NULL)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES ('old', 'x', 0)")
            .execute(db.pool())
            .await
            .unwrap();

        db.ensure_schema().await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let user_columns = table_columns(&mut conn, "users").await.unwrap();
        assert!(user_columns.contains(&"phone".to_string()));
        assert!(user_columns.contains(&"created_at".to_string()));
        let order_columns = table_columns(&mut conn, "orders").await.unwrap();
        assert!(order_columns.contains(&"phone".to_string()));
        drop(conn);

        let old = db.users().find_by_username("old").await.unwrap().unwrap();
        assert!(old.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_end_to_end_seed_then_dangling_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(db.categories().list().await.unwrap().len(), 6);
        assert_eq!(db.products().list().await.unwrap().len(), 1);
        let users = db.users().list(false).await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);

        let err = db
            .products()
            .create(&NewProduct {
                name: "Orphan".to_string(),
                price: 10.0,
                img: None,
                category_id: 999,
            })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_only_seed() {
        let config = DbConfig::in_memory().seed_data(SeedData::admin_only());
        let db = Database::new(config).await.unwrap();

        let status = db.schema_status().await.unwrap();
        assert_eq!(status.categories, 0);
        assert_eq!(status.products, 0);
        assert_eq!(status.users, 1);

        db.ensure_schema().await.unwrap();
        assert_eq!(db.schema_status().await.unwrap().users, 1);
    }
}
