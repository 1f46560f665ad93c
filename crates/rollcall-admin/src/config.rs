//! Admin configuration loading from file and environment variables.

use rollcall_db::DbRuntimeSettings;
use rollcall_live::RedisRuntimeSettings;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Durable registry database.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Ephemeral check-in state.
    #[serde(default)]
    pub live_state: LiveStateConfig,

    /// Custom field schemas and values.
    #[serde(default)]
    pub schema_store: SchemaStoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_registry_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_sqlite_pool_max_size")]
    pub pool_max_size: u32,

    #[serde(default = "default_sqlite_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Which live state implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveBackend {
    Redis,
    /// Process-local; state is lost when the command exits.
    Memory,
}

/// Live state configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveStateConfig {
    #[serde(default = "default_live_backend")]
    pub backend: LiveBackend,

    /// Redis connection URL, used by the `redis` backend.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_redis_pool_max_size")]
    pub pool_max_size: u32,

    #[serde(default = "default_redis_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Schema store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaStoreConfig {
    /// Path to the SQLite file holding the documents.
    #[serde(default = "default_schema_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_sqlite_pool_max_size")]
    pub pool_max_size: u32,

    #[serde(default = "default_sqlite_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "rollcall_attendance=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_registry_path() -> String {
    "rollcall.db".to_string()
}

fn default_schema_path() -> String {
    "rollcall-schema.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_sqlite_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

fn default_sqlite_connection_timeout_ms() -> u64 {
    DbRuntimeSettings::default().connection_timeout_ms
}

fn default_live_backend() -> LiveBackend {
    LiveBackend::Redis
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_pool_max_size() -> u32 {
    RedisRuntimeSettings::default().pool_max_size
}

fn default_redis_connection_timeout_ms() -> u64 {
    RedisRuntimeSettings::default().connection_timeout_ms
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_sqlite_pool_max_size(),
            connection_timeout_ms: default_sqlite_connection_timeout_ms(),
        }
    }
}

impl Default for LiveStateConfig {
    fn default() -> Self {
        Self {
            backend: default_live_backend(),
            redis_url: default_redis_url(),
            pool_max_size: default_redis_pool_max_size(),
            connection_timeout_ms: default_redis_connection_timeout_ms(),
        }
    }
}

impl Default for SchemaStoreConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_sqlite_pool_max_size(),
            connection_timeout_ms: default_sqlite_connection_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl RegistryConfig {
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
            connection_timeout_ms: self.connection_timeout_ms,
        }
    }
}

impl SchemaStoreConfig {
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
            connection_timeout_ms: self.connection_timeout_ms,
        }
    }
}

impl LiveStateConfig {
    pub fn runtime_settings(&self) -> RedisRuntimeSettings {
        RedisRuntimeSettings {
            pool_max_size: self.pool_max_size,
            connection_timeout_ms: self.connection_timeout_ms,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `ROLLCALL_REGISTRY_PATH` overrides `registry.path`
/// - `ROLLCALL_REDIS_URL` overrides `live_state.redis_url`
/// - `ROLLCALL_LIVE_BACKEND` overrides `live_state.backend` (`redis` or `memory`)
/// - `ROLLCALL_SCHEMA_PATH` overrides `schema_store.path`
/// - `ROLLCALL_LOG_LEVEL` overrides `logging.level`
/// - `ROLLCALL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `ROLLCALL_*` overrides using `lookup` to read variables.
/// Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup("ROLLCALL_REGISTRY_PATH") {
        config.registry.path = path;
    }
    if let Some(url) = lookup("ROLLCALL_REDIS_URL") {
        config.live_state.redis_url = url;
    }
    if let Some(backend) = lookup("ROLLCALL_LIVE_BACKEND") {
        match backend.trim().to_ascii_lowercase().as_str() {
            "redis" => config.live_state.backend = LiveBackend::Redis,
            "memory" => config.live_state.backend = LiveBackend::Memory,
            other => tracing::warn!(value = other, "ignoring unknown ROLLCALL_LIVE_BACKEND"),
        }
    }
    if let Some(path) = lookup("ROLLCALL_SCHEMA_PATH") {
        config.schema_store.path = path;
    }
    if let Some(level) = lookup("ROLLCALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("ROLLCALL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
