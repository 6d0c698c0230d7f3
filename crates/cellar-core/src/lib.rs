//! # cellar-core: Pure Domain Logic for the Cellar storefront
//!
//! Record types, input validation, catalog filter resolution and the cart.
//! Nothing in this crate touches a database, the network or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cellar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront screens (TypeScript)                 │   │
//! │  │    Home ──► Explore ──► Product detail ──► Cart ──► Admin       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ request / response                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cellar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  catalog  │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │  Filter   │  │   Cart    │  │   rules   │  │   │
//! │  │   │   Order   │  │  Query    │  │ CartItem  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cellar-db (Database Layer)                   │   │
//! │  │        schema, seed, repositories, catalog, session gate        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record types (Category, Product, User, Order, OrderItem)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`catalog`] - Explore-screen filter precedence
//! - [`cart`] - In-memory cart with price snapshots
//!
//! ## Example Usage
//!
//! ```rust
//! use cellar_core::{Cart, Product};
//!
//! let grange = Product {
//!     id: 3,
//!     name: "Penfolds Grange 2017".to_string(),
//!     price: 250.0,
//!     img: None,
//!     category_id: 3,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(&grange, 2).unwrap();
//! assert_eq!(cart.total(), 500.0);
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem};
pub use catalog::{CatalogFilter, CatalogQuery};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
