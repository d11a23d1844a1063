//! Resolving a single long-poll wait.
//!
//! A wait registers a mailbox and then races three events:
//!
//! ```text
//!                      ┌─► message ready ──► Delivered   (send already cleaned up)
//!   Registered ────────┼─► cancelled ──────► Cancelled   (withdraw)
//!                      ├─► timeout ────────► TimedOut    (withdraw)
//!                      └─► closed ─────────► Superseded  (register already cleaned up)
//! ```
//!
//! Exactly one branch runs, and only the timeout and cancellation branches
//! touch the registry afterwards.

use core::time::Duration;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    DEFAULT_POLL_TIMEOUT_SECS, client_id::ClientId, error::Closed, mailbox::Mailbox,
    registry::Registry,
};

/// Terminal state of a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A payload arrived.
    Delivered(T),

    /// The wait window elapsed with no payload.
    TimedOut,

    /// The caller went away first.
    Cancelled,

    /// The registration was closed from outside, normally by a newer wait
    /// for the same ID.
    Superseded,
}

impl<T> Outcome<T> {
    /// Short lowercase label, used for log fields and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Delivered(_) => "delivered",
            Outcome::TimedOut => "timed_out",
            Outcome::Cancelled => "cancelled",
            Outcome::Superseded => "superseded",
        }
    }

    /// The delivered payload, if any.
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        match self {
            Outcome::Delivered(payload) => Some(payload),
            Outcome::TimedOut | Outcome::Cancelled | Outcome::Superseded => None,
        }
    }
}

/// Runs long-poll waits against a shared [`Registry`].
#[derive(Debug)]
pub struct WaitCoordinator<T> {
    registry: Arc<Registry<T>>,
    poll_timeout: Duration,
}

impl<T> WaitCoordinator<T> {
    /// Create a coordinator with the default wait window.
    #[must_use]
    pub const fn new(registry: Arc<Registry<T>>) -> Self {
        Self {
            registry,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }

    /// Set the wait window.
    #[must_use]
    pub const fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// The registry waits are registered in.
    #[must_use]
    pub const fn registry(&self) -> &Arc<Registry<T>> {
        &self.registry
    }

    /// The wait window.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Register a wait for `id` and block until it resolves.
    ///
    /// Cancelling `cancel` resolves the wait as [`Outcome::Cancelled`]; the
    /// registration is withdrawn either way, so a late send is dropped.
    pub async fn wait(&self, id: ClientId, cancel: &CancellationToken) -> Outcome<T> {
        #[cfg(feature = "metrics")]
        let started = tokio::time::Instant::now();

        let mut mailbox = self.registry.register(id).await;

        let outcome = tokio::select! {
            biased;

            res = &mut mailbox => match res {
                Ok(payload) => Outcome::Delivered(payload),
                Err(Closed) => Outcome::Superseded,
            },
            () = cancel.cancelled() => {
                if !self.registry.withdraw(&mailbox).await {
                    tracing::debug!(client_id = %mailbox.client_id(), "cancelled after entry was already gone");
                }
                Outcome::Cancelled
            }
            () = tokio::time::sleep(self.poll_timeout) => self.expire(&mut mailbox).await,
        };

        tracing::debug!(
            client_id = %mailbox.client_id(),
            ticket = %mailbox.ticket(),
            outcome = outcome.as_str(),
            "wait resolved"
        );

        #[cfg(feature = "metrics")]
        crate::metrics::wait_resolved(&outcome, started.elapsed().as_secs_f64());

        outcome
    }

    /// Timeout branch: withdraw, unless a send got there first.
    ///
    /// `send` fills the mailbox while holding the registry lock, so if the
    /// entry is already gone by the time we hold the lock, any payload is
    /// already in the mailbox.
    async fn expire(&self, mailbox: &mut Mailbox<T>) -> Outcome<T> {
        if self.registry.withdraw(mailbox).await {
            return Outcome::TimedOut;
        }

        match mailbox.try_recv() {
            Ok(Some(payload)) => Outcome::Delivered(payload),
            Ok(None) | Err(Closed) => Outcome::TimedOut,
        }
    }
}

impl<T> Clone for WaitCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            poll_timeout: self.poll_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Delivery;
    use testresult::TestResult;

    const WINDOW: Duration = Duration::from_secs(30);

    fn coordinator() -> WaitCoordinator<&'static str> {
        WaitCoordinator::new(Arc::new(Registry::new())).with_poll_timeout(WINDOW)
    }

    async fn until_registered<T>(registry: &Registry<T>, id: &ClientId) {
        while !registry.contains(id).await {
            tokio::task::yield_now().await;
        }
    }

    fn spawn_wait(
        coordinator: &WaitCoordinator<&'static str>,
        id: &str,
        cancel: &CancellationToken,
    ) -> tokio::task::JoinHandle<Outcome<&'static str>> {
        let coordinator = coordinator.clone();
        let id = ClientId::from(id);
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.wait(id, &cancel).await })
    }

    #[tokio::test(start_paused = true)]
    async fn send_before_timeout_delivers() -> TestResult {
        let coordinator = coordinator();
        let waiter = spawn_wait(&coordinator, "A", &CancellationToken::new());
        until_registered(coordinator.registry(), &ClientId::from("A")).await;

        let delivery = coordinator.registry().send(&ClientId::from("A"), "hello").await;

        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(waiter.await?, Outcome::Delivered("hello"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn no_send_times_out_and_cleans_up() -> TestResult {
        let coordinator = coordinator();
        let started = tokio::time::Instant::now();

        let outcome = coordinator
            .wait(ClientId::from("B"), &CancellationToken::new())
            .await;

        assert_eq!(outcome, Outcome::TimedOut);
        assert!(started.elapsed() >= WINDOW);
        assert!(coordinator.registry().is_empty().await);

        let late = coordinator.registry().send(&ClientId::from("B"), "late").await;
        assert_eq!(late, Delivery::NoWaiter);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_withdraws_entry() -> TestResult {
        let coordinator = coordinator();
        let cancel = CancellationToken::new();
        let waiter = spawn_wait(&coordinator, "C", &cancel);
        until_registered(coordinator.registry(), &ClientId::from("C")).await;

        cancel.cancel();

        assert_eq!(waiter.await?, Outcome::Cancelled);
        assert!(!coordinator.registry().contains(&ClientId::from("C")).await);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_resolves_immediately() {
        let coordinator = coordinator();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = coordinator.wait(ClientId::from("C"), &cancel).await;

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(coordinator.registry().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_wait_supersedes_older() -> TestResult {
        let coordinator = coordinator();
        let id = ClientId::from("A");

        let first = spawn_wait(&coordinator, "A", &CancellationToken::new());
        until_registered(coordinator.registry(), &id).await;

        let second = coordinator.registry().register(id.clone()).await;
        assert_eq!(first.await?, Outcome::Superseded);

        coordinator.registry().send(&id, "for second").await;
        assert_eq!(second.await, Ok("for second"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_wait_never_evicts_its_replacement() {
        let coordinator = coordinator();
        let id = ClientId::from("A");

        let mut first = coordinator.registry().register(id.clone()).await;
        let _second = coordinator.registry().register(id.clone()).await;

        assert_eq!(coordinator.expire(&mut first).await, Outcome::TimedOut);
        assert!(coordinator.registry().contains(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn payload_that_beats_cleanup_is_delivered() {
        let coordinator = coordinator();
        let id = ClientId::from("A");

        let mut mailbox = coordinator.registry().register(id.clone()).await;
        coordinator.registry().send(&id, "just in time").await;

        assert_eq!(
            coordinator.expire(&mut mailbox).await,
            Outcome::Delivered("just in time")
        );
    }

    #[test]
    fn outcome_payload_only_for_delivery() {
        assert_eq!(Outcome::Delivered(7).into_payload(), Some(7));
        assert_eq!(Outcome::<u8>::TimedOut.into_payload(), None);
        assert_eq!(Outcome::<u8>::Cancelled.as_str(), "cancelled");
    }
}
