//! # Domain Types
//!
//! Record types persisted by the storefront, plus the input shapes the
//! presentation layer hands to the repositories.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id (FK)  │       │
//! │  │  name           │   │  price (REAL)   │   │  product_id (FK)│       │
//! │  │  icon_uri       │   │  category_id    │   │  price snapshot │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                 │
//! │  │      User       │◄──│     Order       │◄───────────┘                 │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  username (UQ)  │   │  user_id (FK)   │                              │
//! │  │  password_hash  │   │  total, status  │                              │
//! │  │  is_admin       │   │  address, phone │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Every arrow is a foreign key with ON DELETE CASCADE.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are SQLite rowids (`i64`), assigned on insert and never reused by
//! the application.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Status assigned to every freshly placed order.
///
/// Status is an open set of strings; no transition rules are enforced.
pub const ORDER_STATUS_PENDING: &str = "pending";

// =============================================================================
// Category
// =============================================================================

/// A grouping label for products, shown as a shortcut on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Remote image shown on the category tile.
    pub icon_uri: Option<String>,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub icon_uri: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        NewCategory {
            name: name.into(),
            icon_uri: None,
        }
    }

    pub fn with_icon(mut self, icon_uri: impl Into<String>) -> Self {
        self.icon_uri = Some(icon_uri.into());
        self
    }
}

// =============================================================================
// Product
// =============================================================================

/// A purchasable wine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Non-negative amount, stored as a real number.
    pub price: f64,
    /// Remote URI or local file reference. The presentation layer picks a
    /// placeholder when this is absent.
    pub img: Option<String>,
    pub category_id: i64,
}

/// Fields for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub img: Option<String>,
    pub category_id: i64,
}

/// Partial product update. `None` leaves the column untouched.
///
/// `img` is doubly optional: `Some(None)` clears the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub img: Option<Option<String>>,
    pub category_id: Option<i64>,
}

impl ProductUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn img(mut self, img: Option<String>) -> Self {
        self.img = Some(img);
        self
    }

    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.img.is_none() && self.category_id.is_none()
    }
}

// =============================================================================
// User
// =============================================================================

/// A storefront account.
///
/// `password_hash` is the stored credential (a PHC-format argon2 string).
/// It is never serialized towards the presentation layer.
#[derive(Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    /// Capability flag gating the admin screens. UX only, not a security
    /// boundary.
    pub is_admin: bool,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .field("phone", &self.phone)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields for creating a user. `password` is the raw credential; the
/// repository hashes it before it touches the database.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        NewUser {
            username: username.into(),
            password: password.into(),
            is_admin: false,
            phone: None,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Partial user update. Only supplied fields are written; an empty update
/// is a no-op.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub password: Option<String>,
    #[serde(default)]
    pub phone: Option<Option<String>>,
    pub username: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the phone number. An empty string clears it.
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        let phone = phone.into();
        self.phone = Some(if phone.is_empty() { None } else { Some(phone) });
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn is_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = Some(is_admin);
        self
    }

    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.phone.is_none() && self.username.is_none() && self.is_admin.is_none()
    }
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("phone", &self.phone)
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer's checkout transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: f64,
    /// Open enumeration, starts at [`ORDER_STATUS_PENDING`].
    pub status: String,
    pub address: String,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == ORDER_STATUS_PENDING
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line in an order.
/// `price` is the unit price captured at order time, decoupled from later
/// edits to the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

impl OrderItem {
    /// Unit price × quantity.
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A line to be written as part of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            is_admin: true,
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serialization_hides_credential() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"isAdmin\":true"));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let user = format!("{:?}", sample_user());
        assert!(!user.contains("argon2"));

        let new_user = format!("{:?}", NewUser::new("bob", "hunter2"));
        assert!(!new_user.contains("hunter2"));

        let update = format!("{:?}", UserUpdate::default().password("hunter2"));
        assert!(!update.contains("hunter2"));
    }

    #[test]
    fn test_user_update_phone_empty_clears() {
        let update = UserUpdate::default().phone("");
        assert_eq!(update.phone, Some(None));

        let update = UserUpdate::default().phone("0909");
        assert_eq!(update.phone, Some(Some("0909".to_string())));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UserUpdate::default().is_empty());
        assert!(!UserUpdate::default().is_admin(false).is_empty());
        assert!(ProductUpdate::default().is_empty());
        assert!(!ProductUpdate::default().img(None).is_empty());
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            id: 1,
            order_id: 1,
            product_id: 1,
            quantity: 3,
            price: 250.0,
        };
        assert_eq!(item.line_total(), 750.0);
    }
}
