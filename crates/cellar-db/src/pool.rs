//! # Database Handle
//!
//! Connection setup and the scoped [`Database`] handle every screen shares.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Lifecycle                                 │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) / DbConfig::from_env()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Open pool + ensure schema + seed        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │            ┌─────┐                       │  max_connections = 1      │
//! │  │            │Conn │                       │  (operations queue on it) │
//! │  │            └─────┘                       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── db.categories() / products() / users() / orders()            │
//! │       ├── db.catalog()                                                 │
//! │       └── db.session()                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.close().await ← On shutdown                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL journaling with NORMAL synchronous, so a crash
//! can lose the last commit but never corrupts the file.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::repository::category::CategoryRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;
use crate::schema::{self, SchemaStatus};
use crate::seed::SeedData;
use crate::session::SessionGate;

/// Environment variable holding the database file path.
pub const ENV_DB_PATH: &str = "CELLAR_DB_PATH";
/// Environment variable overriding the pool size.
pub const ENV_DB_MAX_CONNECTIONS: &str = "CELLAR_DB_MAX_CONNECTIONS";
/// Environment variable overriding the acquire timeout, in seconds.
pub const ENV_DB_CONNECT_TIMEOUT_SECS: &str = "CELLAR_DB_CONNECT_TIMEOUT_SECS";

const DEFAULT_DB_PATH: &str = "cellar.db";
const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/cellar.db")
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 1 (one live connection for the whole app)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long an operation waits for the connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps it forever.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether `Database::new` runs schema setup and seeding.
    /// Default: true
    pub ensure_schema: bool,

    /// Content for the one-time seed.
    pub seed: SeedData,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    ///
    /// The file is created if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            ensure_schema: true,
            seed: SeedData::default(),
        }
    }

    /// Creates an isolated in-memory configuration (for testing).
    ///
    /// The single connection is never recycled; dropping it would drop the
    /// database.
    pub fn in_memory() -> Self {
        DbConfig {
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CELLAR_DB_PATH` | `cellar.db` |
    /// | `CELLAR_DB_MAX_CONNECTIONS` | `1` |
    /// | `CELLAR_DB_CONNECT_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> DbResult<Self> {
        let path = std::env::var(ENV_DB_PATH).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let mut config = DbConfig::new(path);

        if let Some(max) = env_number::<u32>(ENV_DB_MAX_CONNECTIONS)? {
            config = config.max_connections(max);
        }
        if let Some(secs) = env_number::<u64>(ENV_DB_CONNECT_TIMEOUT_SECS)? {
            config = config.connect_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether schema setup runs on connect.
    pub fn ensure_schema(mut self, run: bool) -> Self {
        self.ensure_schema = run;
        self
    }

    /// Replaces the seed content.
    pub fn seed_data(mut self, seed: SeedData) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects settings that cannot work together.
    ///
    /// Every in-memory connection opens its own empty database, so an
    /// in-memory pool must hold exactly one connection.
    pub fn validate(&self) -> DbResult<()> {
        if self.max_connections == 0 {
            return Err(DbError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.is_in_memory() && self.max_connections > 1 {
            return Err(DbError::InvalidConfig(format!(
                "an in-memory database needs max_connections = 1, got {}",
                self.max_connections
            )));
        }
        Ok(())
    }

    /// True for `:memory:` configurations.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // SQLite leaves them off by default; cascades depend on them
        Ok(options.foreign_keys(true))
    }
}

fn env_number<T: FromStr>(name: &'static str) -> DbResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DbError::InvalidConfig(format!("{name} is not a valid number: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap; clones share the same pool. Repositories are built on
/// demand and hold their own pool clone.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
/// let user = db.session().authenticate("admin", "admin123").await?;
/// let wines = db.catalog().search("margaux").await?;
/// db.close().await;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    seed: SeedData,
}

impl Database {
    /// Opens the database and prepares it for use.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Enables foreign keys (plus WAL for files)
    /// 3. Creates the connection pool
    /// 4. Ensures the schema and seeds it (if enabled)
    ///
    /// ## Errors
    /// * `InvalidConfig` - see [`DbConfig::validate`]
    /// * `ConnectionFailed` - the file could not be opened
    /// * `InitializationFailed` - schema setup failed; the pool is closed
    ///   and no handle is returned
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        config.validate()?;
        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);
        if config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            seed: config.seed,
        };

        if config.ensure_schema {
            if let Err(err) = db.ensure_schema().await {
                warn!("Schema setup failed, closing pool");
                db.pool.close().await;
                return Err(err);
            }
        }

        Ok(db)
    }

    /// Creates missing tables and columns, then seeds a database seen for
    /// the first time.
    ///
    /// Called by `new()` unless disabled; safe to call again.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        schema::ensure_schema(&self.pool, &self.seed).await
    }

    /// Row counts per table.
    pub async fn schema_status(&self) -> DbResult<SchemaStatus> {
        schema::schema_status(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// For queries not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the product search and filter layer.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.pool.clone())
    }

    /// Returns the login and authorization gate.
    pub fn session(&self) -> SessionGate {
        SessionGate::new(self.users())
    }

    /// Closes the connection pool.
    ///
    /// After calling close, all repository operations fail with
    /// `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
