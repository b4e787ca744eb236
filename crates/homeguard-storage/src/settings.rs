//! Durable key/value settings.
//!
//! The controller persists exactly one thing across reboots today: the
//! master password under [`MASTER_PASSWORD_KEY`]. The store is keyed by
//! string so further settings need no schema change.
//!
//! [`MASTER_PASSWORD_KEY`]: homeguard_core::constants::MASTER_PASSWORD_KEY

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::error::StorageResult;

/// Repository trait for persisted settings.
///
/// Futures are `Send` so a store can be used from spawned command handlers.
pub trait SettingsStore: Send + Sync {
    /// Load a value, `None` if the key was never saved.
    fn load(&self, key: &str) -> impl Future<Output = StorageResult<Option<String>>> + Send;

    /// Insert or replace a value.
    fn save(&self, key: &str, value: &str) -> impl Future<Output = StorageResult<()>> + Send;
}

/// SQLite implementation of SettingsStore
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new SQLite settings store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingsStore for SqliteSettingsStore {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT value
            FROM settings
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Volatile settings store for tests and diskless runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Enum wrapper for settings store dispatch.
///
/// `SettingsStore` futures are opaque, so the trait cannot be used as a
/// trait object. The controller holds this enum instead and stays
/// non-generic over its store.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnySettingsStore {
    /// SQLite-backed store.
    Sqlite(SqliteSettingsStore),

    /// In-memory store.
    Memory(MemorySettingsStore),
}

impl SettingsStore for AnySettingsStore {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Sqlite(store) => store.load(key).await,
            Self::Memory(store) => store.load(key).await,
        }
    }

    async fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Sqlite(store) => store.save(key, value).await,
            Self::Memory(store) => store.save(key, value).await,
        }
    }
}

impl From<SqliteSettingsStore> for AnySettingsStore {
    fn from(store: SqliteSettingsStore) -> Self {
        Self::Sqlite(store)
    }
}

impl From<MemorySettingsStore> for AnySettingsStore {
    fn from(store: MemorySettingsStore) -> Self {
        Self::Memory(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use rstest::rstest;

    #[derive(Debug, Clone, Copy)]
    enum Backend {
        Memory,
        Sqlite,
    }

    async fn store(backend: Backend) -> AnySettingsStore {
        match backend {
            Backend::Memory => MemorySettingsStore::new().into(),
            Backend::Sqlite => {
                let db = Database::in_memory().await.unwrap();
                SqliteSettingsStore::new(db.pool().clone()).into()
            }
        }
    }

    #[rstest]
    #[case::memory_empty(Backend::Memory, &[], None)]
    #[case::memory_single(Backend::Memory, &["1234"], Some("1234"))]
    #[case::memory_overwrite(Backend::Memory, &["1111", "2222"], Some("2222"))]
    #[case::sqlite_empty(Backend::Sqlite, &[], None)]
    #[case::sqlite_single(Backend::Sqlite, &["1234"], Some("1234"))]
    #[case::sqlite_overwrite(Backend::Sqlite, &["1111", "2222", "3333"], Some("3333"))]
    #[tokio::test]
    async fn test_latest_save_wins(
        #[case] backend: Backend,
        #[case] saves: &[&str],
        #[case] expected: Option<&str>,
    ) {
        let store = store(backend).await;
        for value in saves {
            store.save("master_pw", value).await.unwrap();
        }
        assert_eq!(store.load("master_pw").await.unwrap().as_deref(), expected);
    }

    #[rstest]
    #[case::memory(Backend::Memory)]
    #[case::sqlite(Backend::Sqlite)]
    #[tokio::test]
    async fn test_keys_are_independent(#[case] backend: Backend) {
        let store = store(backend).await;
        store.save("master_pw", "2580").await.unwrap();
        store.save("other", "x").await.unwrap();

        assert_eq!(store.load("master_pw").await.unwrap().as_deref(), Some("2580"));
        assert_eq!(store.load("other").await.unwrap().as_deref(), Some("x"));
        assert_eq!(store.load("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_upserts_one_row() {
        let db = Database::in_memory().await.unwrap();
        let store = SqliteSettingsStore::new(db.pool().clone());

        store.save("master_pw", "1111").await.unwrap();
        store.save("master_pw", "2222").await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
