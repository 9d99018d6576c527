//! interiors-server: the admin site and JSON API for interior images.
//!
//! Ties the core and db crates into a running Axum application:
//!
//! - Admin changelist with a session-remembered list/grid view
//! - Bulk image upload that creates one record per file
//! - JSON API and OpenAPI document
//! - Background sweep of idle sessions
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod forms;
pub mod importer;
pub mod messages;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;
pub mod storage;
pub mod templates;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use interiors_core::config::Config;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::session::SessionStore;

/// How often idle sessions are swept while the server runs.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Start the server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> interiors_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db = open_database(&config)?;

    if !config.media.root.exists() {
        std::fs::create_dir_all(&config.media.root)?;
        tracing::info!("Created media directory {}", config.media.root.display());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| interiors_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, db);
    let session_ttl = ctx.config.sessions.ttl();
    let sessions = ctx.sessions.clone();
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| interiors_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    let local = listener.local_addr()?;
    tracing::info!("Starting server on {local}");

    // Cancellation token for the background session sweeper.
    let cancel = CancellationToken::new();
    let sweeper_handle = session_ttl.map(|ttl| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            run_session_sweeper(sessions, ttl, cancel).await;
        })
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = sweeper_handle {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Delete idle sessions now and then every [`SESSION_SWEEP_INTERVAL`].
///
/// Runs until the cancellation token is triggered.
pub async fn run_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
    cancel: CancellationToken,
) {
    // The first tick completes immediately, which covers the startup sweep.
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        let store = sessions.clone();
        match tokio::task::spawn_blocking(move || store.purge_expired(ttl)).await {
            Ok(Ok(0)) => {}
            Ok(Ok(n)) => tracing::info!(removed = n, "Purged expired sessions"),
            Ok(Err(e)) => tracing::warn!("Session cleanup failed: {e}"),
            Err(e) => tracing::error!("Session cleanup task failed: {e}"),
        }
    }

    tracing::debug!("Session sweeper stopped");
}

/// Open the configured database, creating its directory when needed.
pub fn open_database(config: &Config) -> interiors_core::Result<interiors_db::pool::DbPool> {
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }

    let db_str = db_path.to_string_lossy();
    let db = interiors_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }
    Ok(db)
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
