//! Server configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (PARLOR_HOST, PARLOR_PORT)
//! - TOML configuration file

use anyhow::{Context, Result};
use parlor_core::SweeperConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Presence expiry configuration.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Presence expiry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Time between sweep cycles in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,

    /// Inactivity before eviction in milliseconds.
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_ms: u64,
}

/// Store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file loaded at startup and written at shutdown.
    /// `~` is expanded. No snapshot is kept when unset.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// HTTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_host() -> String {
    std::env::var("PARLOR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("PARLOR_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    15_000 // 15 seconds
}

fn default_inactivity_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            presence: PresenceConfig::default(),
            store: StoreConfig::default(),
            http: HttpConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval(),
            inactivity_timeout_ms: default_inactivity_timeout(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl PresenceConfig {
    /// Sweeper settings derived from this section.
    #[must_use]
    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval: Duration::from_millis(self.sweep_interval_ms),
            inactivity_timeout: Duration::from_millis(self.inactivity_timeout_ms),
        }
    }
}

impl StoreConfig {
    /// The snapshot path with `~` expanded.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot_path
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "parlor.toml",
            "/etc/parlor/parlor.toml",
            "~/.config/parlor/parlor.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// presence timings are zero.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the server misbehave.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.presence.sweep_interval_ms == 0 {
            anyhow::bail!("presence.sweep_interval_ms must be greater than zero");
        }
        if self.presence.inactivity_timeout_ms == 0 {
            anyhow::bail!("presence.inactivity_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if `host:port` is not a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid host:port {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.presence.sweep_interval_ms, 15_000);
        assert_eq!(config.presence.inactivity_timeout_ms, 10_000);
        assert!(config.store.snapshot_path.is_none());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_config_bind_addr() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 5000;
        assert_eq!(config.bind_addr().unwrap().port(), 5000);

        config.host = "not a host".to_string();
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000

            [presence]
            inactivity_timeout_ms = 30000

            [store]
            snapshot_path = "/var/lib/parlor/snapshot.bin"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.presence.inactivity_timeout_ms, 30_000);
        assert_eq!(config.presence.sweep_interval_ms, 15_000);
        assert_eq!(
            config.store.snapshot_path(),
            Some(PathBuf::from("/var/lib/parlor/snapshot.bin"))
        );
    }

    #[test]
    fn test_sweeper_config_conversion() {
        let sweeper = PresenceConfig::default().sweeper_config();
        assert_eq!(sweeper.interval, Duration::from_secs(15));
        assert_eq!(sweeper.inactivity_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_zero_timings() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.presence.sweep_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
