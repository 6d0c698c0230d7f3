//! # cellar-db: Local Data Layer for the Cellar storefront
//!
//! Everything the storefront screens read or write goes through this crate.
//! Storage is a single SQLite file accessed asynchronously with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cellar Data Flow                                 │
//! │                                                                         │
//! │  Screen (login, explore, cart, admin)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cellar-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    Schema    │  │   │
//! │  │   │   (pool.rs)   │    │ category      │    │  (schema.rs) │  │   │
//! │  │   │               │    │ product       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ user          │    │ create, add  │  │   │
//! │  │   │ init / close  │    │ order         │    │ columns, seed│  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          ▲                                                      │   │
//! │  │          ├──── Catalog      (search, price range, browse)       │   │
//! │  │          └──── SessionGate  (authenticate, register)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │        categories · products · users · orders · order_items     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - `DbConfig` and the `Database` handle
//! - [`schema`] - Table creation, additive migrations, one-time seed
//! - [`seed`] - Starter catalogue and default administrator
//! - [`repository`] - Per-entity CRUD
//! - [`catalog`] - Keyword search and price filtering
//! - [`session`] - Authentication and the admin check
//! - [`password`] - argon2 credential hashing
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cellar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let user = db.session().authenticate("admin", "admin123").await?;
//! let wines = db.catalog().search("margaux").await?;
//!
//! db.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod password;
pub mod pool;
pub mod repository;
pub mod schema;
pub mod seed;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::Catalog;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, ENV_DB_CONNECT_TIMEOUT_SECS, ENV_DB_MAX_CONNECTIONS, ENV_DB_PATH};
pub use schema::SchemaStatus;
pub use seed::SeedData;
pub use session::{is_admin, AuthError, AuthResult, SessionGate};

// Repository re-exports for convenience
pub use repository::{CategoryRepository, OrderRepository, ProductRepository, UserRepository};
