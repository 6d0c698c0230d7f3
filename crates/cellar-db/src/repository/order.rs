//! # Order Repository
//!
//! Checkout persistence: an order row plus its line items.
//!
//! ## Order Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create(user, items, total, address, phone)           │
//! │                                                                         │
//! │  validate (items non-empty, quantities, prices, total, address)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    ├── INSERT orders       (status = 'pending')                        │
//! │    ├── INSERT order_items  × N  (unit price captured per line)         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure before COMMIT (unknown user, unknown product, I/O):       │
//! │  the transaction is dropped → ROLLBACK → no order row, no item rows    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate submissions are not detected; two calls create two orders.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{require_affected, DbError, DbResult, LogFailure};
use cellar_core::validation::{validate_address, validate_amount, validate_order_items};
use cellar_core::{NewOrderItem, Order, OrderItem, ORDER_STATUS_PENDING};

const ORDER_COLUMNS: &str = "id, user_id, total, status, address, phone, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order with its items in one transaction and returns the
    /// order id.
    ///
    /// `total` is stored as given; it is not recomputed from the items.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - no items, bad quantity/price/total/address
    /// * `Err(DbError::ForeignKeyViolation)` - unknown user or product; nothing
    ///   was written
    pub async fn create(
        &self,
        user_id: i64,
        items: &[NewOrderItem],
        total: f64,
        address: &str,
        phone: Option<&str>,
    ) -> DbResult<i64> {
        validate_order_items(items)?;
        validate_amount("total", total)?;
        validate_address(address)?;

        debug!(user_id, items = items.len(), total, "Creating order");

        let result = self.insert_order(user_id, items, total, address.trim(), phone).await;

        if let Ok(order_id) = &result {
            info!(order_id = *order_id, user_id, "Order placed");
        }
        result.log_failure("create_order")
    }

    async fn insert_order(
        &self,
        user_id: i64,
        items: &[NewOrderItem],
        total: f64,
        address: &str,
        phone: Option<&str>,
    ) -> DbResult<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total, status, address, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(user_id)
        .bind(total)
        .bind(ORDER_STATUS_PENDING)
        .bind(address)
        .bind(phone)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(order_id)
    }

    /// Gets an order by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Order>> {
        let result = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("get_order")
    }

    /// Lists a user's orders, most recent first.
    pub async fn list_by_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let result = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_orders_by_user")
    }

    /// Lists every order, most recent first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let result = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_all_orders")
    }

    /// Lists the items of an order in insertion order.
    pub async fn list_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let result = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = ?1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from);

        result.log_failure("list_order_items")
    }

    /// Overwrites an order's status.
    ///
    /// Statuses are an open set; any transition is accepted.
    pub async fn update_status(&self, order_id: i64, status: &str) -> DbResult<()> {
        debug!(order_id, status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .and_then(|r| require_affected(r.rows_affected(), "Order", order_id));

        result.log_failure("update_order_status")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use cellar_core::{Cart, NewOrderItem, NewProduct, NewUser};

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db
            .users()
            .create(&NewUser::new("linh", "secret1"))
            .await
            .unwrap();
        (db, user_id)
    }

    fn line(product_id: i64, quantity: i64, price: f64) -> NewOrderItem {
        NewOrderItem {
            product_id,
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn test_create_writes_order_and_items() {
        let (db, user_id) = setup().await;
        let second = db
            .products()
            .create(&NewProduct {
                name: "Cloudy Bay 2022".to_string(),
                price: 900_000.0,
                img: None,
                category_id: 6,
            })
            .await
            .unwrap();

        let order_id = db
            .orders()
            .create(
                user_id,
                &[line(1, 1, 15_000_000.0), line(second, 3, 900_000.0)],
                17_700_000.0,
                "12 Lê Lợi, Q1",
                Some("0911222333"),
            )
            .await
            .unwrap();

        let order = db.orders().get(order_id).await.unwrap().unwrap();
        assert_eq!(order.user_id, user_id);
        assert_eq!(order.total, 17_700_000.0);
        assert!(order.is_pending());
        assert_eq!(order.phone.as_deref(), Some("0911222333"));

        let items = db.orders().list_items(order_id).await.unwrap();
        assert_eq!(items.len(), 2);
        let sum: f64 = items.iter().map(|i| i.line_total()).sum();
        assert_eq!(sum, order.total);
    }

    #[tokio::test]
    async fn test_checkout_from_cart() {
        let (db, user_id) = setup().await;
        let margaux = db.products().get(1).await.unwrap().unwrap();

        let mut cart = Cart::new();
        cart.add_item(&margaux, 1).unwrap();
        cart.add_item(&margaux, 1).unwrap();

        let order_id = db
            .orders()
            .create(user_id, &cart.order_items().unwrap(), cart.total(), "Đà Nẵng", None)
            .await
            .unwrap();
        cart.clear();

        let items = db.orders().list_items(order_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(db.orders().get(order_id).await.unwrap().unwrap().total, 30_000_000.0);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_item_price_is_decoupled_from_product() {
        let (db, user_id) = setup().await;
        let order_id = db
            .orders()
            .create(user_id, &[line(1, 1, 15_000_000.0)], 15_000_000.0, "Hà Nội", None)
            .await
            .unwrap();

        db.products()
            .update(1, &cellar_core::ProductUpdate::default().price(99.0))
            .await
            .unwrap();

        let items = db.orders().list_items(order_id).await.unwrap();
        assert_eq!(items[0].price, 15_000_000.0);
    }

    #[tokio::test]
    async fn test_failed_item_rolls_back_whole_order() {
        let (db, user_id) = setup().await;

        // The order row and first item insert fine; the second item points at
        // a product that does not exist.
        let err = db
            .orders()
            .create(
                user_id,
                &[line(1, 1, 15_000_000.0), line(999, 1, 10.0)],
                15_000_010.0,
                "12 Lê Lợi, Q1",
                None,
            )
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());

        assert!(db.orders().list_by_user(user_id).await.unwrap().is_empty());
        let status = db.schema_status().await.unwrap();
        assert_eq!(status.orders, 0);
        assert_eq!(status.order_items, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_writes_nothing() {
        let (db, _) = setup().await;
        let err = db
            .orders()
            .create(404, &[line(1, 1, 1.0)], 1.0, "Huế", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(db.schema_status().await.unwrap().orders, 0);
    }

    #[tokio::test]
    async fn test_empty_items_rejected() {
        let (db, user_id) = setup().await;
        let err = db
            .orders()
            .create(user_id, &[], 0.0, "Huế", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let (db, user_id) = setup().await;
        let admin = db.users().find_by_username("admin").await.unwrap().unwrap();

        let first = db
            .orders()
            .create(user_id, &[line(1, 1, 1.0)], 1.0, "A", None)
            .await
            .unwrap();
        let second = db
            .orders()
            .create(admin.id, &[line(1, 2, 1.0)], 2.0, "B", None)
            .await
            .unwrap();
        let third = db
            .orders()
            .create(user_id, &[line(1, 3, 1.0)], 3.0, "C", None)
            .await
            .unwrap();

        let mine: Vec<i64> = db
            .orders()
            .list_by_user(user_id)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec![third, first]);

        let all: Vec<i64> = db.orders().list_all().await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(all, vec![third, second, first]);
    }

    #[tokio::test]
    async fn test_update_status_overwrites() {
        let (db, user_id) = setup().await;
        let order_id = db
            .orders()
            .create(user_id, &[line(1, 1, 1.0)], 1.0, "A", None)
            .await
            .unwrap();

        db.orders().update_status(order_id, "delivered").await.unwrap();
        // No state machine: going back is accepted
        db.orders().update_status(order_id, "pending").await.unwrap();
        db.orders().update_status(order_id, "shipping").await.unwrap();

        let order = db.orders().get(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, "shipping");

        assert!(matches!(
            db.orders().update_status(404, "shipping").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
