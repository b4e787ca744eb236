use thiserror::Error;

/// Settings store failures.
///
/// None of these block a state transition: the controller logs them and
/// keeps running with the in-memory value.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Settings database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Settings migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Bad path or unusable location for the database file.
    #[error("Settings store misconfigured: {0}")]
    Configuration(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
