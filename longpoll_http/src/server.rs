//! HTTP long-polling server implementation.
//!
//! Provides an Axum router for `/poll/{id}` and `/send/{id}`.

mod handlers;
mod state;

pub use handlers::router;
pub use state::LongPollState;

use core::time::Duration;
use std::sync::Arc;

use longpoll_core::Registry;
use tokio_util::sync::CancellationToken;

use crate::{DEFAULT_MAX_BODY_SIZE, DEFAULT_POLL_TIMEOUT_SECS};

/// Builder for creating an HTTP server.
#[derive(Debug)]
pub struct LongPollServerBuilder {
    registry: Option<Arc<Registry<String>>>,
    poll_timeout: Duration,
    max_body_size: usize,
    shutdown: CancellationToken,
}

impl LongPollServerBuilder {
    /// Create a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: None,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an existing registry instead of a fresh one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry<String>>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the long-poll timeout.
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the maximum `/send` body size.
    #[must_use]
    pub const fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Resolve outstanding polls with `503` once `token` is cancelled.
    #[must_use]
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Build the server state.
    #[must_use]
    pub fn build(self) -> Arc<LongPollState> {
        let registry = self.registry.unwrap_or_default();
        Arc::new(LongPollState::new(
            registry,
            self.poll_timeout,
            self.max_body_size,
            self.shutdown,
        ))
    }

    /// Build and create the Axum router.
    pub fn into_router(self) -> axum::Router {
        let state = self.build();
        router(state)
    }
}

impl Default for LongPollServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
