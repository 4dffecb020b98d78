//! Ctrl-C handling shared by the long-running processes.

use tracing::{error, info};

/// Resolves when the process receives Ctrl-C.
///
/// If the handler cannot be installed this never resolves, so the process
/// keeps running until it is killed instead of stopping at once.
pub async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
