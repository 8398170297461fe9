use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;

use crate::db::{open_memory_pool, open_pool};
use crate::store::{KeyValueStore, StorageError};

/// `KeyValueStore` backed by the `kv_store` SQLite table.
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(db_path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(open_pool(db_path).await?))
    }

    pub async fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(open_memory_pool().await?))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }
}
