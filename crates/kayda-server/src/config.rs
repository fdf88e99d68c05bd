//! Server configuration for `Kayda`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `KAYDA_*` environment variables.

use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 5000;

/// Upper bound on session lifetime (ten years).
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// How long a login session stays valid, in seconds.
    pub session_ttl_secs: u64,
    /// Seconds between expired-session sweeps.
    pub session_sweep_interval_secs: u64,
    /// Admin account to create or promote at startup.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// `RocksDB` persistent storage.
    RocksDb { path: String },
}

/// Credentials for the startup admin account.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `KAYDA_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:5000`)
    /// - `KAYDA_STORAGE`: `memory` or `rocksdb` (default: `memory`)
    /// - `KAYDA_STORAGE_PATH`: path for persistent backends (default: `./data`)
    /// - `KAYDA_LOG_LEVEL`: log filter (default: `info`)
    /// - `KAYDA_SESSION_TTL_SECS`: session lifetime (default: `86400`)
    /// - `KAYDA_SESSION_SWEEP_INTERVAL`: seconds between session sweeps (default: `300`)
    /// - `KAYDA_BOOTSTRAP_ADMIN_EMAIL` / `KAYDA_BOOTSTRAP_ADMIN_PASSWORD`: startup admin
    /// - `KAYDA_CORS_ORIGIN`: allowed browser origin (default: any)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        // Priority: KAYDA_BIND_ADDR > PORT > default 127.0.0.1:5000
        let bind_addr = if let Some(addr) = var("KAYDA_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        };

        let storage_path = var("KAYDA_STORAGE_PATH").unwrap_or_else(|| "./data".to_owned());

        let storage_backend = match var("KAYDA_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "rocksdb" => StorageBackendType::RocksDb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let log_level = var("KAYDA_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let session_ttl_secs = var("KAYDA_SESSION_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(86_400);

        let session_sweep_interval_secs = var("KAYDA_SESSION_SWEEP_INTERVAL")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(300);

        let bootstrap_admin = match (
            var("KAYDA_BOOTSTRAP_ADMIN_EMAIL"),
            var("KAYDA_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        let cors_origin = var("KAYDA_CORS_ORIGIN").filter(|o| !o.is_empty() && o != "*");

        Self {
            bind_addr,
            storage_backend,
            log_level,
            session_ttl_secs,
            session_sweep_interval_secs,
            bootstrap_admin,
            cors_origin,
        }
    }

    /// Session lifetime as a `chrono` duration.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = self.session_ttl_secs.min(MAX_SESSION_TTL_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or_default())
    }
}
