//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cw_db::{DEFAULT_POOL_SIZE, PoolConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub mqtt: MqttSettings,
}

/// Database connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of open connections.
    pub size: usize,
    /// Give up waiting for a free connection after this many milliseconds.
    /// Unset waits forever.
    pub acquire_timeout_ms: Option<u64>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

/// MQTT subscription settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MqttSettings {
    /// Set to false to serve the API without subscribing to the broker.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub topic: String,
    /// A random `classwatch-<uuid>` identifier is used when unset.
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
    /// Pause between polls after a connection error.
    pub reconnect_delay_ms: u64,
    /// Maximum number of messages being stored at once.
    pub max_in_flight: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("pool", &self.pool)
            .field("http", &self.http)
            .field("mqtt", &self.mqtt)
            .finish()
    }
}

impl fmt::Debug for MqttSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttSettings")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("topic", &self.topic)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("classwatch.db"),
            pool: PoolSettings::default(),
            http: HttpSettings::default(),
            mqtt: MqttSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            acquire_timeout_ms: None,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 1883,
            topic: "home".to_string(),
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: 30,
            reconnect_delay_ms: 5000,
            max_in_flight: 16,
        }
    }
}

impl PoolSettings {
    /// Converts to the storage layer's pool configuration.
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            size: self.size,
            acquire_timeout: self.acquire_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Config {
    /// Loads configuration from default locations, optionally adding a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CW_*, nested keys split on "__")
        figment = figment.merge(Env::prefixed("CW_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for classwatch.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("classwatch"))
}

/// Returns the platform-specific data directory for classwatch.
///
/// On Linux: `~/.local/share/classwatch`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("classwatch"))
}
