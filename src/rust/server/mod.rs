//! HTTP surface: `/predict` plus read-only comment queries.

mod error;
mod handlers;
mod router;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{HealthResponse, PredictResponse};
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serves `state` on `addr` until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState, max_body_size: usize) -> std::io::Result<()> {
    let app = create_router(state, max_body_size);
    let listener = TcpListener::bind(addr).await?;
    log::info!("niasafe listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("niasafe shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
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
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => log::info!("Received terminate signal, initiating graceful shutdown"),
    }
}
