//! # Repository Module
//!
//! One repository per stored entity, each holding a clone of the shared pool.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Record Repositories                                  │
//! │                                                                         │
//! │  Screen                                                                │
//! │       │                                                                 │
//! │       │  db.products().update(7, ProductUpdate::default().price(9.0))  │
//! │       ▼                                                                 │
//! │  CategoryRepository   list / get / create / update / delete            │
//! │  ProductRepository    list / get / list_by_category / create /         │
//! │                       update (partial) / delete / count                │
//! │  UserRepository       find_by_username / get / list / create /         │
//! │                       update (partial) / delete                        │
//! │  OrderRepository      create (transactional) / get / list_by_user /    │
//! │                       list_all / list_items / update_status            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (foreign keys ON, cascades do the clean-up)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Inserts return the new row id
//! - Updates and deletes on a missing id return `DbError::NotFound`
//! - Failures are logged once, at the operation boundary

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;
