//! # acu-store
//!
//! SQLite persistence for the school directory, teaching assignments and
//! homework. All access goes through [`Store`], whose methods are split by
//! concern across the modules below.
//!
//! Idempotent creation paths rely on the schema's unique constraints
//! (`INSERT ... ON CONFLICT DO NOTHING`), so concurrent duplicate requests
//! never produce duplicate rows or surface an error.

pub mod academics;
pub mod error;
pub mod homework;
pub mod identities;
pub mod models;
pub mod people;
pub mod teaching;

pub use error::StoreError;
pub use models::*;
pub use teaching::AssignRequest;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Handle to the school database.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `url` and apply migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url = %url, "school database ready");
        Ok(store)
    }

    /// A private in-memory database, migrated and empty.
    ///
    /// Uses a single connection that never expires, since every SQLite
    /// in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
