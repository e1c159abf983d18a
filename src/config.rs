// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Prefix for every storage key
    pub storage_namespace: String,
    /// Memoized selector lifetime
    pub cache_ttl_secs: i64,
    /// Debounce window for persistence writes
    pub persist_debounce_ms: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("./data"),
            frontend_url: "http://localhost:5173".to_string(),
            storage_namespace: "@stridesync".to_string(),
            cache_ttl_secs: 300,
            persist_debounce_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the defaults; set but malformed
    /// numeric values are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        let defaults = Self::default();

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            storage_namespace: env::var("STORAGE_NAMESPACE")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.storage_namespace),
            cache_ttl_secs: parse_var("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            persist_debounce_ms: parse_var("PERSIST_DEBOUNCE_MS", defaults.persist_debounce_ms)?,
        })
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, value)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
