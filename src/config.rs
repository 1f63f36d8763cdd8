//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::ws::{HubSettings, KeepaliveSettings};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`ServiceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Master switch for the PostgreSQL store.
    pub persistence_enabled: bool,

    /// Bearer token that grants operator rights. `None` disables them.
    pub operator_token: Option<String>,

    /// Milliseconds a single WebSocket push may wait before failing.
    pub ws_push_timeout_ms: u64,

    /// Depth of each WebSocket connection's outbound queue.
    pub ws_queue_capacity: usize,

    /// Seconds between keepalive pings.
    pub ws_ping_interval_secs: u64,

    /// Seconds without inbound frames before a connection is closed.
    pub ws_idle_timeout_secs: u64,

    /// Seconds before a REST request is aborted.
    pub request_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: None,
            database_max_connections: 10,
            database_min_connections: 1,
            database_connect_timeout_secs: 5,
            persistence_enabled: true,
            operator_token: None,
            ws_push_timeout_ms: 5_000,
            ws_queue_capacity: 64,
            ws_ping_interval_secs: 30,
            ws_idle_timeout_secs: 90,
            request_timeout_secs: 30,
            log_format: LogFormat::Text,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            database_url: non_empty_env("DATABASE_URL"),
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_min_connections: parse_env(
                "DATABASE_MIN_CONNECTIONS",
                defaults.database_min_connections,
            ),
            database_connect_timeout_secs: parse_env(
                "DATABASE_CONNECT_TIMEOUT_SECS",
                defaults.database_connect_timeout_secs,
            ),
            persistence_enabled: parse_env_bool(
                "PERSISTENCE_ENABLED",
                defaults.persistence_enabled,
            ),
            operator_token: non_empty_env("OPERATOR_TOKEN"),
            ws_push_timeout_ms: parse_env("WS_PUSH_TIMEOUT_MS", defaults.ws_push_timeout_ms),
            ws_queue_capacity: parse_env("WS_QUEUE_CAPACITY", defaults.ws_queue_capacity),
            ws_ping_interval_secs: parse_env(
                "WS_PING_INTERVAL_SECS",
                defaults.ws_ping_interval_secs,
            ),
            ws_idle_timeout_secs: parse_env("WS_IDLE_TIMEOUT_SECS", defaults.ws_idle_timeout_secs),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            log_format,
        })
    }

    /// Hub delivery settings derived from this configuration.
    #[must_use]
    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            push_timeout: Duration::from_millis(self.ws_push_timeout_ms.max(1)),
            queue_capacity: self.ws_queue_capacity.max(1),
        }
    }

    /// Per-connection keepalive settings derived from this configuration.
    #[must_use]
    pub fn keepalive_settings(&self) -> KeepaliveSettings {
        KeepaliveSettings {
            ping_interval: Duration::from_secs(self.ws_ping_interval_secs.max(1)),
            idle_timeout: Duration::from_secs(self.ws_idle_timeout_secs.max(1)),
        }
    }

    /// REST request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

/// Reads an environment variable, treating blank values as unset.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
