//! SQLite pool for the settings database.
//!
//! Settings are written rarely (a password change) and read once at boot, so
//! the pool is small and writes are fully synced.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Where and how to open the settings database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database.
    pub busy_timeout: Duration,
    pub create_if_missing: bool,
    pub migrate_on_open: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("homeguard.db"),
            pool_size: 2,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
            migrate_on_open: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn migrate_on_open(mut self, migrate: bool) -> Self {
        self.migrate_on_open = migrate;
        self
    }
}

/// Handle to the settings database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the settings database, creating its directory and file and
    /// applying migrations as configured.
    ///
    /// ```no_run
    /// use homeguard_storage::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new(DatabaseConfig::new("/var/lib/homeguard/settings.db")).await?;
    /// db.health_check().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the directory cannot be
    /// created, or a database error if the file cannot be opened or
    /// migrated.
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        if config.create_if_missing {
            ensure_parent_dir(&config.path)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(config.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(config.busy_timeout)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;
        info!(path = %config.path.display(), "Settings database opened");

        let db = Self { pool };
        if config.migrate_on_open {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// A private in-memory database with the schema applied.
    pub async fn in_memory() -> StorageResult<Self> {
        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded migrations. Already applied ones are skipped.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Settings migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = DatabaseConfig::new("custom.db")
            .pool_size(4)
            .create_if_missing(false)
            .migrate_on_open(false);

        assert_eq!(config.path, PathBuf::from("custom.db"));
        assert_eq!(config.pool_size, 4);
        assert!(!config.create_if_missing);
        assert!(!config.migrate_on_open);
        assert_eq!(config.busy_timeout, DatabaseConfig::default().busy_timeout);
    }

    #[test]
    fn test_ensure_parent_dir_accepts_bare_file_name() {
        ensure_parent_dir(Path::new("settings.db")).unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_has_settings_table() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'settings'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(count, 1);
        db.close().await;
    }
}
