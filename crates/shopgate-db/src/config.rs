//! Store configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! Binaries load a `.env` file (via `dotenvy`) before calling
//! [`StoreConfig::from_env`]; the library itself never touches the file system
//! for configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::contract::BackendKind;
use crate::pool::{DbConfig, IN_MEMORY_PATH};

/// Default key prefix for Redis tables.
pub const DEFAULT_KV_PREFIX: &str = "shopgate";

/// Default SQLite file.
pub const DEFAULT_DB_PATH: &str = "./shopgate.db";

/// Key-value engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    /// Redis endpoint. `None` selects the in-process engine.
    pub redis_url: Option<String>,

    /// Namespace for table keys (`<prefix>:<table>`).
    pub prefix: String,
}

impl Default for KvConfig {
    fn default() -> Self {
        KvConfig {
            redis_url: None,
            prefix: DEFAULT_KV_PREFIX.to_string(),
        }
    }
}

/// Everything needed to build a [`crate::DataAccess`] implementation.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which adapter to compose.
    pub backend: BackendKind,

    /// Relational store settings (used when `backend` is relational).
    pub db: DbConfig,

    /// Key-value store settings (used when `backend` is key-value).
    pub kv: KvConfig,
}

impl StoreConfig {
    /// Relational backend over the given SQLite configuration.
    pub fn relational(db: DbConfig) -> Self {
        StoreConfig {
            backend: BackendKind::Relational,
            db,
            kv: KvConfig::default(),
        }
    }

    /// Key-value backend over the given engine settings.
    pub fn key_value(kv: KvConfig) -> Self {
        StoreConfig {
            backend: BackendKind::KeyValue,
            db: DbConfig::new(DEFAULT_DB_PATH),
            kv,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend: BackendKind = lookup("SHOPGATE_BACKEND")
            .unwrap_or_else(|| "relational".to_string())
            .parse()?;

        let database_path =
            lookup("SHOPGATE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let max_connections: u32 = lookup("SHOPGATE_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SHOPGATE_DB_MAX_CONNECTIONS".to_string()))?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SHOPGATE_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        let connect_timeout_secs: u64 = lookup("SHOPGATE_DB_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string()) // 30 seconds
            .parse()
            .map_err(|_| {
                ConfigError::InvalidValue("SHOPGATE_DB_CONNECT_TIMEOUT_SECS".to_string())
            })?;

        // A private in-memory database only exists on its one connection.
        let db = if database_path == IN_MEMORY_PATH {
            DbConfig::in_memory()
        } else {
            DbConfig::new(database_path).max_connections(max_connections)
        }
        .connect_timeout(Duration::from_secs(connect_timeout_secs));

        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        let prefix = lookup("SHOPGATE_KV_PREFIX").unwrap_or_else(|| DEFAULT_KV_PREFIX.to_string());
        if prefix.is_empty() || prefix.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue("SHOPGATE_KV_PREFIX".to_string()));
        }

        Ok(StoreConfig {
            backend,
            db,
            kv: KvConfig { redis_url, prefix },
        })
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" | "sql" | "sqlite" => Ok(BackendKind::Relational),
            "key-value" | "kv" | "redis" | "memory" => Ok(BackendKind::KeyValue),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Unknown backend '{0}' (expected relational or key-value)")]
    UnknownBackend(String),
}
