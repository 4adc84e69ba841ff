//! SQLite-backed key-value store.
//!
//! Stores everything in a single `kv_store` table inside the app's local
//! database file (`{app_data_dir}/binflow/client.db`). The pool is created
//! lazily on first use so constructing the store never touches the disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tokio::sync::Mutex;

use crate::kv::{KeyValueStore, StoreError};

/// SQLite-backed [`KeyValueStore`].
///
/// Cheap to clone; clones share the same pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Arc<Mutex<Option<SqlitePool>>>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a store backed by the default app database
    /// (`{app_data_dir}/binflow/client.db`).
    ///
    /// The database is initialized on first use.
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::at_path(default_db_path().map_err(|e| StoreError::Path(e.to_string()))?))
    }

    /// Create a store backed by an explicit database file (tests, custom
    /// data directories).
    pub fn at_path(db_path: PathBuf) -> Self {
        Self {
            pool: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open SQLite store at {:?}", self.db_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create kv_store table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> Result<SqlitePool, StoreError> {
        self.ensure_initialized()
            .await
            .map_err(|e| StoreError::Database(format!("{e:?}")))?;
        let pool_guard = self.pool.lock().await;
        Ok(pool_guard.as_ref().expect("pool initialized above").clone())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let pool = self.get_pool().await?;

        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let pool = self.get_pool().await?;

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let pool = self.get_pool().await?;

        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&pool)
            .await?;

        Ok(())
    }
}

/// Resolve the path to the app's SQLite database:
/// `{app_data_dir}/binflow/client.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory")?;

    let mut dir = base;
    dir.push("binflow");
    dir.push("client.db");

    Ok(dir)
}
