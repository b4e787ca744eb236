//! Daemon configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables, then validated. Every field has a default, so an empty or
//! missing file yields a working controller:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:4100"
//!
//! [database]
//! path = "homeguard.db"
//!
//! [logging]
//! filter = "info"
//!
//! [security]
//! default_password = "2580"
//! door_threshold_cm = 15.0
//! auto_close_secs = 10
//!
//! [timing]
//! proximity_period_ms = 100
//! keypad_period_ms = 50
//! climate_period_ms = 2000
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use homeguard_controller::{HubConfig, MonitorConfig};
use homeguard_core::MasterPassword;
use homeguard_core::constants::{
    CLIMATE_PERIOD_MS, DEFAULT_PASSWORD, DOOR_AUTO_CLOSE_SECS, DOOR_THRESHOLD_CM,
    KEYPAD_SCAN_PERIOD_MS, PROXIMITY_PERIOD_MS,
};
use homeguard_hardware::ScanConfig;
use homeguard_network::RemoteServerConfig;
use homeguard_storage::DatabaseConfig;
use serde::Deserialize;

pub const ENV_BIND: &str = "HOMEGUARD_BIND";
pub const ENV_DATABASE: &str = "HOMEGUARD_DATABASE";
pub const ENV_LOG: &str = "HOMEGUARD_LOG";
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let defaults = RemoteServerConfig::default();
        Self {
            bind: defaults.bind_addr,
            max_connections: defaults.max_connections,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "homeguard.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Used until a password has been stored.
    pub default_password: String,
    pub door_threshold_cm: f32,
    pub auto_close_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            default_password: DEFAULT_PASSWORD.to_string(),
            door_threshold_cm: DOOR_THRESHOLD_CM,
            auto_close_secs: DOOR_AUTO_CLOSE_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub proximity_period_ms: u64,
    pub keypad_period_ms: u64,
    pub climate_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            proximity_period_ms: PROXIMITY_PERIOD_MS,
            keypad_period_ms: KEYPAD_SCAN_PERIOD_MS,
            climate_period_ms: CLIMATE_PERIOD_MS,
        }
    }
}

impl Config {
    /// Load from `path` (a missing file means defaults), apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override
    /// is malformed, or a value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, falling back to defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from `lookup`, normally the process environment.
    ///
    /// `HOMEGUARD_LOG` wins over `RUST_LOG` when both are set.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind
                .parse()
                .map_err(|_| {
                    ConfigError::Validation(format!("{ENV_BIND}: invalid address {bind:?}"))
                })?;
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database.path = path;
        }
        if let Some(filter) = lookup(ENV_LOG).or_else(|| lookup(ENV_RUST_LOG)) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("timing.proximity_period_ms", self.timing.proximity_period_ms),
            ("timing.keypad_period_ms", self.timing.keypad_period_ms),
            ("timing.climate_period_ms", self.timing.climate_period_ms),
            ("security.auto_close_secs", self.security.auto_close_secs),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }

        let threshold = self.security.door_threshold_cm;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::Validation(
                "security.door_threshold_cm must be positive".to_string(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(ConfigError::Validation(
                "server.max_connections must be non-zero".to_string(),
            ));
        }

        self.default_password()?;
        Ok(())
    }

    pub fn default_password(&self) -> Result<MasterPassword, ConfigError> {
        MasterPassword::new(&self.security.default_password)
            .map_err(|e| ConfigError::Validation(format!("security.default_password: {e}")))
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            monitor: MonitorConfig {
                period: Duration::from_millis(self.timing.proximity_period_ms),
                threshold_cm: self.security.door_threshold_cm,
                auto_close: Duration::from_secs(self.security.auto_close_secs),
                ..MonitorConfig::default()
            },
            climate_period: Duration::from_millis(self.timing.climate_period_ms),
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            period: Duration::from_millis(self.timing.keypad_period_ms),
            ..ScanConfig::default()
        }
    }

    pub fn remote_config(&self) -> RemoteServerConfig {
        RemoteServerConfig {
            bind_addr: self.server.bind,
            max_connections: self.server.max_connections,
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn should_use_design_defaults_when_empty() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:4100".parse().unwrap());
        assert_eq!(config.database.path, "homeguard.db");
        assert_eq!(config.security.default_password, "2580");
        assert_eq!(config.timing.proximity_period_ms, 100);
        assert_eq!(config.timing.keypad_period_ms, 50);
        assert_eq!(config.timing.climate_period_ms, 2000);
        config.validate().unwrap();
    }

    #[test]
    fn should_fill_missing_fields_within_a_section() {
        let config = Config::parse(
            r#"
            [security]
            default_password = "1111"

            [timing]
            climate_period_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.security.default_password, "1111");
        assert_eq!(config.security.auto_close_secs, 10);
        assert_eq!(config.timing.climate_period_ms, 500);
        assert_eq!(config.timing.proximity_period_ms, 100);
    }

    #[test]
    fn should_map_to_library_configs() {
        let config = Config::parse(
            r#"
            [security]
            door_threshold_cm = 20.0
            auto_close_secs = 30

            [timing]
            proximity_period_ms = 250
            keypad_period_ms = 20
            "#,
        )
        .unwrap();

        let hub = config.hub_config();
        assert_eq!(hub.monitor.period, Duration::from_millis(250));
        assert_eq!(hub.monitor.threshold_cm, 20.0);
        assert_eq!(hub.monitor.auto_close, Duration::from_secs(30));
        assert_eq!(hub.climate_period, Duration::from_millis(2000));

        let scan = config.scan_config();
        assert_eq!(scan.period, Duration::from_millis(20));
        assert_eq!(scan.release_poll, ScanConfig::default().release_poll);
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                (ENV_BIND, "0.0.0.0:5000"),
                (ENV_DATABASE, "/var/lib/homeguard.db"),
                (ENV_RUST_LOG, "debug"),
            ]))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.database.path, "/var/lib/homeguard.db");
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_prefer_homeguard_log_over_rust_log() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[(ENV_LOG, "homeguard=trace"), (ENV_RUST_LOG, "warn")]))
            .unwrap();
        assert_eq!(config.logging.filter, "homeguard=trace");
    }

    #[test]
    fn should_reject_malformed_bind_override() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(env(&[(ENV_BIND, "not-an-address")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[rstest]
    #[case("[timing]\nproximity_period_ms = 0")]
    #[case("[timing]\nkeypad_period_ms = 0")]
    #[case("[timing]\nclimate_period_ms = 0")]
    #[case("[security]\nauto_close_secs = 0")]
    #[case("[security]\ndoor_threshold_cm = 0.0")]
    #[case("[security]\ndoor_threshold_cm = -3.0")]
    #[case("[security]\ndefault_password = \"\"")]
    #[case("[security]\ndefault_password = \"1234567890123456\"")]
    #[case("[server]\nmax_connections = 0")]
    fn should_reject_invalid_values(#[case] contents: &str) {
        let config = Config::parse(contents).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_report_parse_errors() {
        let err = Config::parse("[timing]\nkeypad_period_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn should_default_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.database.path, "homeguard.db");
    }

    #[test]
    fn should_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"custom.db\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.path, "custom.db");
    }
}
