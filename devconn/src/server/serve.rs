//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ConnectivityError;
use crate::server::handlers::{
    activity_handler, certificate_download_handler, device_connectivity_handler,
    gateway_compose_download_handler, health_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Device connectivity
        .route(
            "/api/device-connectivity/{device_id}",
            get(device_connectivity_handler),
        )
        .route(
            "/api/device-connectivity/{protocol}/certificate/download",
            get(certificate_download_handler),
        )
        .route(
            "/api/device-connectivity/gateway-launch/{device_id}/docker-compose/download",
            get(gateway_compose_download_handler),
        )
        // Activity
        .route("/api/activity/{device_id}", post(activity_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ConnectivityError>>, ConnectivityError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ConnectivityError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ConnectivityError::ServerError(e.to_string()))
    });

    Ok(handle)
}
