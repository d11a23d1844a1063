//! HTTP server for the long-poll endpoints.

use anyhow::Result;
use longpoll_http::{DEFAULT_MAX_BODY_SIZE, DEFAULT_POLL_TIMEOUT_SECS, server::LongPollServerBuilder};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::metrics;

/// Arguments for the server.
#[derive(Debug, clap::Parser)]
#[command(version, about = "Long-poll rendezvous server")]
pub(crate) struct ServerArgs {
    /// Socket address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8090")]
    pub(crate) socket: String,

    /// Seconds a poll waits for a message before answering 504
    #[arg(short, long, default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    pub(crate) poll_timeout: u64,

    /// Maximum `/send` request body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub(crate) max_body_size: usize,

    /// Metrics server port (Prometheus endpoint)
    #[arg(long, default_value = "9090")]
    pub(crate) metrics_port: u16,

    /// Enable the Prometheus metrics server
    #[arg(long, default_value_t = false)]
    pub(crate) metrics: bool,
}

/// Run the long-poll server until `token` is cancelled.
pub(crate) async fn run(args: ServerArgs, token: CancellationToken) -> Result<()> {
    let addr: SocketAddr = args.socket.parse()?;

    if args.metrics {
        let metrics_handle = metrics::init_metrics()?;
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], args.metrics_port).into();
        metrics::start_metrics_server(metrics_addr, metrics_handle, token.clone()).await?;
    }

    let router = LongPollServerBuilder::new()
        .poll_timeout(Duration::from_secs(args.poll_timeout))
        .max_body_size(args.max_body_size)
        .shutdown(token.clone())
        .into_router();

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Long-poll server listening on {}", addr);
    tracing::info!(
        "Poll timeout: {}s, max body size: {} bytes",
        args.poll_timeout,
        args.max_body_size
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    tracing::info!("Shutting down server...");
    Ok(())
}
