//! # homeguardd
//!
//! Runs the controller against simulated peripherals driven from stdin,
//! with the master password persisted in SQLite and the remote channel
//! served over TCP.
//!
//! ```text
//! homeguardd [config.toml]
//! ```

mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use homeguard_controller::{Hub, LogSink, Peripherals, load_master_password};
use homeguard_hardware::MatrixKeypad;
use homeguard_hardware::mock::{MockClimate, MockKeyMatrix, MockProximity, SimulatedIndicator};
use homeguard_network::RemoteServer;
use homeguard_storage::{AnySettingsStore, Database, SqliteSettingsStore};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::console::Console;

const DEFAULT_CONFIG_PATH: &str = "homeguard.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting homeguardd");

    let db = Database::new(config.database_config())
        .await
        .context("opening settings database")?;
    let store: AnySettingsStore = SqliteSettingsStore::new(db.pool().clone()).into();
    let password = load_master_password(&store, config.default_password()?).await;

    let sink = Arc::new(LogSink);
    let (hub, relay) = Hub::new(
        SimulatedIndicator::new(),
        sink.clone(),
        sink,
        store,
        password,
    );

    let (matrix, keys) = MockKeyMatrix::new();
    let (proximity, distance) = MockProximity::new();
    let (climate, climate_handle) = MockClimate::new();

    let mut handle = hub
        .start(
            relay,
            Peripherals {
                keypad: MatrixKeypad::with_config(matrix, config.scan_config()),
                proximity,
                climate,
            },
            &config.hub_config(),
        )
        .await;

    let server = RemoteServer::bind(config.remote_config(), hub.clone())
        .await
        .context("starting remote server")?;
    let remote = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "Remote server stopped");
        }
    });

    let console = Console {
        keys,
        proximity: distance,
        climate: climate_handle,
        state: Arc::clone(hub.state()),
    };
    let console = tokio::spawn(async move {
        if let Err(e) = console.run().await {
            warn!(error = %e, "Console stopped");
        }
    });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for shutdown signal")?;
            info!("Shutdown requested");
        }
        ended = handle.join_next() => {
            warn!(?ended, "Controller loop ended, shutting down");
        }
    }

    remote.abort();
    console.abort();
    let report = handle.shutdown().await;
    db.close().await;

    info!(
        errors = report.errors,
        panics = report.panics,
        "homeguardd stopped"
    );
    Ok(())
}
