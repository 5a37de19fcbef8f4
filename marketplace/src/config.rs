//! Configuration management for the marketplace server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default and are logged.

use crate::environment::TokenFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Store runtime configuration
    pub store: StoreSettings,
    /// API key and link token minting
    pub tokens: TokenConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Store runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// How long a caller waits for a command outcome, in milliseconds
    pub request_timeout_ms: u64,
    /// Capacity of the action broadcast seen by observers
    pub broadcast_capacity: usize,
}

/// Token minting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Opaque or timestamped tokens
    pub format: TokenFormat,
    /// Random bytes per token
    pub bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                metrics_enabled: true,
                shutdown_timeout: 30,
            },
            store: StoreSettings {
                request_timeout_ms: 5000,
                broadcast_capacity: 256,
            },
            tokens: TokenConfig {
                format: TokenFormat::Opaque,
                bytes: 32,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "PORT", defaults.server.port),
                metrics_enabled: parse_or(
                    &lookup,
                    "METRICS_ENABLED",
                    defaults.server.metrics_enabled,
                ),
                shutdown_timeout: parse_or(
                    &lookup,
                    "SHUTDOWN_TIMEOUT",
                    defaults.server.shutdown_timeout,
                ),
            },
            store: StoreSettings {
                request_timeout_ms: parse_or(
                    &lookup,
                    "REQUEST_TIMEOUT_MS",
                    defaults.store.request_timeout_ms,
                ),
                broadcast_capacity: parse_or(
                    &lookup,
                    "BROADCAST_CAPACITY",
                    defaults.store.broadcast_capacity,
                ),
            },
            tokens: TokenConfig {
                format: parse_or(&lookup, "TOKEN_FORMAT", defaults.tokens.format),
                bytes: parse_or(&lookup, "TOKEN_BYTES", defaults.tokens.bytes),
            },
        }
    }

    /// Address the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.store.request_timeout_ms)
    }

    /// Shutdown timeout as a [`Duration`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}
