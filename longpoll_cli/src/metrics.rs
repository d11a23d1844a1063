//! Prometheus metrics server.

use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Install the global metrics recorder and return a handle for the HTTP endpoint.
///
/// Must be called once at startup, before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub(crate) fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Start the metrics HTTP server on the given address.
///
/// Spawns a background task serving `/metrics` until `token` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the address.
pub(crate) async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
        {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}
