//! SQLite pool for the Local Store.
//!
//! File databases run in WAL mode with `synchronous = NORMAL`. The embedded
//! migrations under `migrations/` are applied every time a pool is opened.

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the Local Store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private to the pool; gone when the pool closes.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: StoreLocation,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(database_path.into()),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Every `:memory:` connection is a separate database, so the pool is
    /// pinned to one connection that is never reaped.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        match &self.location {
            StoreLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            StoreLocation::Memory => SqliteConnectOptions::new().in_memory(true),
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout);
        match self.location {
            StoreLocation::File(_) => pool.idle_timeout(Duration::from_secs(600)),
            StoreLocation::Memory => pool
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

/// Opens the store, creating the file if needed, and migrates it.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(location = ?config.location, "Opening local store");

    let pool = config
        .pool_options()
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            warn!(error = %e, "Could not open local store");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        warn!(error = %e, "Local store migration failed");
        LibraryError::Migration(e.to_string())
    })?;

    debug!(connections = pool.size(), "Local store ready");
    Ok(pool)
}

/// Migrated in-memory store.
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}
