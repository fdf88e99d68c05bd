//! `Kayda` server entry point.
//!
//! Opens the storage backend, builds the repositories, ensures the bootstrap
//! admin exists, then starts the Axum HTTP server with graceful shutdown. A
//! background session sweeper runs alongside the server and is cancelled on
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use kayda_storage::{MemoryBackend, StorageBackend};

use kayda_server::app::build_router;
use kayda_server::config::{ServerConfig, StorageBackendType};
use kayda_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "Kayda starting");

    let state = build_app_state(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = {
        let st = Arc::clone(&state);
        let mut rx = shutdown_rx.clone();
        let interval_secs = config.session_sweep_interval_secs;
        tokio::spawn(async move {
            session_sweeper(st, &mut rx, interval_secs).await;
        })
    };

    let app = build_router(Arc::clone(&state), config.cors_origin.as_deref());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Kayda server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    info!("Kayda server stopped");
    Ok(())
}

/// Open storage, build the repositories and apply the bootstrap admin.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let storage: Arc<dyn StorageBackend> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            Arc::new(MemoryBackend::new())
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackendType::RocksDb { path } => {
            info!(path = %path, "using RocksDB storage");
            Arc::new(
                kayda_storage::RocksDbBackend::open(path)
                    .context("failed to open RocksDB storage")?,
            )
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageBackendType::RocksDb { .. } => {
            anyhow::bail!("RocksDB backend requested but feature 'rocksdb-backend' is not enabled");
        }
    };

    let state = Arc::new(AppState::new(storage, config.session_ttl()));

    if let Some(admin) = &config.bootstrap_admin {
        let created = state
            .accounts
            .ensure_admin(&admin.email, &admin.password)
            .await
            .context("failed to bootstrap admin account")?;
        info!(email = %admin.email, created, "bootstrap admin ready");
    } else {
        warn!("no bootstrap admin configured; admin routes are unreachable until one exists");
    }

    Ok(state)
}

/// Maximum retries per tick when the storage backend is unreachable.
const SWEEP_MAX_RETRIES: u32 = 3;

/// Background worker that periodically deletes expired sessions.
///
/// A failed sweep is retried with exponential backoff (1s, 2s, 4s) before
/// the tick is given up. Persistent failures escalate to `error!`.
async fn session_sweeper(
    state: Arc<AppState>,
    shutdown: &mut watch::Receiver<bool>,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    let mut consecutive_failures: u32 = 0;
    info!(interval_secs, "session sweeper started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match retry_sweep(&state, shutdown).await {
                    Ok(None) => {
                        info!("session sweeper shutting down");
                        return;
                    }
                    Ok(Some(_)) => {
                        consecutive_failures = 0;
                    }
                    Err(last_err) => {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                        if consecutive_failures >= 5 {
                            tracing::error!(
                                error = %last_err,
                                consecutive_failures,
                                "session sweep persistently failing, storage may be down"
                            );
                        } else {
                            warn!(
                                error = %last_err,
                                consecutive_failures,
                                retries = SWEEP_MAX_RETRIES,
                                "session sweep failed after retries, will retry next tick"
                            );
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("session sweeper shutting down");
                return;
            }
        }
    }
}

/// Run one sweep with exponential backoff. Returns:
/// - `Ok(Some(removed))` on success
/// - `Ok(None)` if shutdown was signalled during retry
/// - `Err(last_error)` if all retries were exhausted
async fn retry_sweep(
    state: &AppState,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Option<usize>, String> {
    let mut last_err = String::new();

    for attempt in 0..=SWEEP_MAX_RETRIES {
        match state.accounts.sweep_expired_sessions(Utc::now()).await {
            Ok(removed) => return Ok(Some(removed)),
            Err(e) => {
                last_err = e.to_string();

                if attempt == SWEEP_MAX_RETRIES {
                    break;
                }

                let backoff = Duration::from_secs(1u64 << attempt);
                tracing::debug!(
                    attempt = attempt.saturating_add(1),
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "session sweep failed, retrying"
                );

                tokio::select! {
                    () = tokio::time::sleep(backoff) => {}
                    _ = shutdown.changed() => {
                        return Ok(None);
                    }
                }
            }
        }
    }

    Err(last_err)
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}
