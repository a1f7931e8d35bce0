use crate::utils::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Retain idle connections for reuse at all
    #[serde(default = "default_keep_alive_enabled")]
    pub keep_alive_enabled: bool,
    /// Connections idle longer than this are never matched and are
    /// eligible for eviction (milliseconds)
    #[serde(default = "default_keep_alive_duration_ms")]
    pub keep_alive_duration_ms: u64,
    /// Upper bound on concurrently-idle non-multiplexed connections
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
    /// Maximum expired/dead entries removed by one maintenance sweep
    #[serde(default = "default_sweep_cap")]
    pub sweep_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String, // "json" or "pretty"
}

// Default values
fn default_keep_alive_enabled() -> bool {
    true
}

fn default_keep_alive_duration_ms() -> u64 {
    300_000
}

fn default_max_idle_connections() -> usize {
    5
}

fn default_sweep_cap() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            keep_alive_enabled: default_keep_alive_enabled(),
            keep_alive_duration_ms: default_keep_alive_duration_ms(),
            max_idle_connections: default_max_idle_connections(),
            sweep_cap: default_sweep_cap(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PoolOptions {
    pub fn keep_alive_duration(&self) -> Duration {
        Duration::from_millis(self.keep_alive_duration_ms)
    }

    /// Idle cap actually applied by the pool. Disabling keep-alive forces
    /// the cap to zero, which disables all reuse.
    pub fn effective_max_idle(&self) -> usize {
        if self.keep_alive_enabled {
            self.max_idle_connections
        } else {
            0
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PoolError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| PoolError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.pool.keep_alive_duration_ms == 0 {
            return Err(PoolError::Config(
                "keep_alive_duration_ms must be greater than zero".to_string(),
            ));
        }

        if self.pool.sweep_cap == 0 {
            return Err(PoolError::Config(
                "sweep_cap must be greater than zero".to_string(),
            ));
        }

        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(PoolError::Config(format!(
                "Invalid log level: {}. Must be one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(PoolError::Config(format!(
                "Invalid log format: {}. Must be 'pretty' or 'json'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let example = r#"[pool]
keep_alive_enabled = true
keep_alive_duration_ms = 300000  # 5 minutes
max_idle_connections = 5
sweep_cap = 2  # Expired entries removed per maintenance sweep

[logging]
level = "info"  # Options: "trace", "debug", "info", "warn", "error"
format = "pretty"  # Options: "pretty", "json"
"#;

        std::fs::write(path.as_ref(), example)
            .map_err(|e| PoolError::Config(format!("Failed to write example config: {}", e)))?;

        Ok(())
    }
}
