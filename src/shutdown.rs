use tracing::{info, warn};

/// Resolves on SIGINT (Ctrl-C). If the handler cannot be installed the
/// future never resolves, so a pending branch deletion is not cancelled by
/// accident.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt received"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
