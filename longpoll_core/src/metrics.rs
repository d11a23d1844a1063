//! Prometheus metrics instrumentation for the rendezvous core.
//!
//! This module is only available when the `metrics` feature is enabled.

use crate::{registry::Delivery, wait::Outcome};

/// Metric names used throughout the application.
pub mod names {
    /// Number of currently registered waiters.
    pub const WAITERS_ACTIVE: &str = "longpoll_waiters_active";
    /// Total waits resolved, labeled by outcome.
    pub const WAITS_TOTAL: &str = "longpoll_waits_total";
    /// Wait duration in seconds, labeled by outcome.
    pub const WAIT_DURATION_SECONDS: &str = "longpoll_wait_duration_seconds";
    /// Total sends, labeled by delivery.
    pub const SENDS_TOTAL: &str = "longpoll_sends_total";
    /// Total registrations replaced by a newer one for the same ID.
    pub const SUPERSEDED_TOTAL: &str = "longpoll_superseded_total";
}

/// Set the number of registered waiters.
#[inline]
pub fn set_waiters_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(names::WAITERS_ACTIVE).set(count as f64);
}

/// Record a wait reaching its terminal state.
#[inline]
pub fn wait_resolved<T>(outcome: &Outcome<T>, duration_secs: f64) {
    let label = outcome.as_str();
    metrics::counter!(names::WAITS_TOTAL, "outcome" => label).increment(1);
    metrics::histogram!(names::WAIT_DURATION_SECONDS, "outcome" => label).record(duration_secs);
}

/// Record a send.
#[inline]
pub fn message_sent(delivery: Delivery) {
    metrics::counter!(names::SENDS_TOTAL, "delivery" => delivery.as_str()).increment(1);
}

/// Record a registration being replaced.
#[inline]
pub fn waiter_superseded() {
    metrics::counter!(names::SUPERSEDED_TOTAL).increment(1);
}
