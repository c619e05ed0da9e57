//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `thermoplan.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Persistence settings.
    pub storage: StorageConfig,
    /// Reconciliation timings.
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Demo device settings.
    pub demo: DemoConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Persistence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON document holding groups, history, and settings.
    pub path: String,
}

/// Reconciliation timing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between reconciliation ticks.
    pub tick_interval_secs: u64,
    /// Upper bound in seconds on each individual device call.
    pub actuation_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Demo fleet configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Register simulated climate devices at startup.
    pub enabled: bool,
    /// Device ids to simulate.
    pub devices: Vec<String>,
}

impl Config {
    /// Load configuration from `thermoplan.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("thermoplan.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("THERMOPLAN_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("THERMOPLAN_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("THERMOPLAN_STORAGE") {
            self.storage.path = val;
        }
        if let Ok(val) = std::env::var("THERMOPLAN_TICK_INTERVAL") {
            if let Ok(secs) = val.parse() {
                self.scheduler.tick_interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("THERMOPLAN_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "tick interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "thermoplan.json".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            actuation_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "thermopland=info,thermoplan=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            devices: vec![
                "climate.living_room".to_string(),
                "climate.bedroom".to_string(),
            ],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.path, "thermoplan.json");
        assert_eq!(config.scheduler.tick_interval_secs, 60);
        assert!(config.demo.enabled);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [storage]
            path = '/var/lib/thermoplan/state.json'

            [scheduler]
            tick_interval_secs = 30
            actuation_timeout_secs = 5

            [logging]
            filter = 'debug'

            [demo]
            enabled = false
            devices = []
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.path, "/var/lib/thermoplan/state.json");
        assert_eq!(config.scheduler.tick_interval_secs, 30);
        assert_eq!(config.scheduler.actuation_timeout_secs, 5);
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.demo.enabled);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [server]
            port = 8080
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.path, "thermoplan.json");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port_and_zero_interval() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
