//! Durable configuration store for the Homeguard controller.
//!
//! This crate provides SQLite-backed persistence for controller settings
//! (today: the master password), plus an in-memory store for tests.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with embedded migrations
//! - [`SettingsStore`] - Data access trait (`load`/`save` by key)
//! - [`SqliteSettingsStore`], [`MemorySettingsStore`] - Implementations
//! - [`AnySettingsStore`] - Enum dispatch so callers stay non-generic
//!
//! # Examples
//!
//! ```no_run
//! use homeguard_storage::{Database, DatabaseConfig, SettingsStore, SqliteSettingsStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("homeguard.db")).await?;
//! let store = SqliteSettingsStore::new(db.pool().clone());
//!
//! store.save("master_pw", "2580").await?;
//! assert_eq!(store.load("master_pw").await?.as_deref(), Some("2580"));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod settings;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use settings::{AnySettingsStore, MemorySettingsStore, SettingsStore, SqliteSettingsStore};
