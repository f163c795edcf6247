//! Signal handling for stopping the server.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

/// Wait for ctrl+c or the terminate signal.
///
/// If the signal handlers cannot be installed the error is logged and this
/// future never completes, leaving the server running.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install SIGTERM handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received ctrl+c signal."),
        _ = terminate => tracing::debug!("Received terminate signal."),
    }
}

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// The server stops accepting connections and gives in-flight requests up
/// to `grace_period` to finish. A second signal closes the remaining
/// connections immediately.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>, grace_period: Duration) {
    shutdown_signal().await;

    tracing::info!(
        "Shutting down gracefully, waiting up to {}s for {} open connections",
        grace_period.as_secs(),
        handle.connection_count()
    );
    handle.graceful_shutdown(Some(grace_period));

    shutdown_signal().await;

    tracing::warn!("Received a second shutdown signal, closing open connections now");
    handle.shutdown();
}
