//! Server state management.

use core::time::Duration;
use std::sync::Arc;

use longpoll_core::{Registry, WaitCoordinator};
use tokio_util::sync::CancellationToken;

/// Shared state for the long-poll handlers.
#[derive(Debug)]
pub struct LongPollState {
    /// Runs `/poll` waits against the registry.
    pub(crate) coordinator: WaitCoordinator<String>,

    /// Maximum `/send` body size.
    pub(crate) max_body_size: usize,

    /// Cancelled when the server begins shutting down.
    pub(crate) shutdown: CancellationToken,
}

impl LongPollState {
    /// Create a new server state.
    #[must_use]
    pub fn new(
        registry: Arc<Registry<String>>,
        poll_timeout: Duration,
        max_body_size: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator: WaitCoordinator::new(registry).with_poll_timeout(poll_timeout),
            max_body_size,
            shutdown,
        }
    }

    /// The registry shared by `/poll` and `/send`.
    #[must_use]
    pub const fn registry(&self) -> &Arc<Registry<String>> {
        self.coordinator.registry()
    }

    /// Get the poll timeout.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        self.coordinator.poll_timeout()
    }

    /// Get the maximum `/send` body size.
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
