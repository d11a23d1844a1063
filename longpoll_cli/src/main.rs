//! # Long-Poll Server
//!
//! Runs the `/poll/{id}` and `/send/{id}` endpoints.

mod metrics;
mod server;

use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let token = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(token.clone()));

    #[cfg(unix)]
    tokio::spawn(watch_sigterm(token.clone()));

    let args = server::ServerArgs::parse();
    server::run(args, token).await
}

/// First Ctrl+C cancels `token`; a second one exits immediately.
async fn watch_ctrl_c(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl+C: {}", e);
        return;
    }
    eprintln!("Ctrl+C: draining polls and shutting down (press again to force)");
    token.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("Force exiting.");
        std::process::exit(130);
    }
}

#[cfg(unix)]
async fn watch_sigterm(token: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            if term.recv().await.is_some() {
                eprintln!("SIGTERM: shutting down");
                token.cancel();
            }
        }
        Err(e) => tracing::warn!("Unable to listen for SIGTERM: {}", e),
    }
}
