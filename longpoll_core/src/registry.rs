//! The rendezvous registry.
//!
//! Maps each [`ClientId`] to at most one live [`Slot`]. Every operation takes
//! the map lock for a single lookup/mutation and never waits while holding
//! it; all suspension happens in the reader's [`Mailbox`].

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;

use async_lock::Mutex;

use crate::{
    client_id::ClientId,
    mailbox::{self, Mailbox, Slot, Ticket},
};

/// What happened to a payload handed to [`Registry::send`].
///
/// Informational only. The send itself always succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// A waiter was registered and its mailbox now holds the payload.
    Delivered,

    /// Nobody was registered under the ID; the payload was dropped.
    NoWaiter,

    /// An entry existed but its waiter had already gone away; the payload
    /// was dropped and the entry removed.
    Abandoned,
}

impl Delivery {
    /// Short lowercase label, used for log fields and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Delivery::Delivered => "delivered",
            Delivery::NoWaiter => "no_waiter",
            Delivery::Abandoned => "abandoned",
        }
    }
}

/// Thread-safe map from [`ClientId`] to the single outstanding wait for it.
#[derive(Debug)]
pub struct Registry<T> {
    entries: Mutex<BTreeMap<ClientId, Slot<T>>>,
    next_ticket: AtomicU64,
}

impl<T> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Open a wait for `id`, returning the mailbox to wait on.
    ///
    /// An existing registration for the same ID is closed and removed first;
    /// whoever holds its mailbox sees [`Closed`](crate::Closed).
    pub async fn register(&self, id: ClientId) -> Mailbox<T> {
        let ticket = Ticket::new(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let (slot, mailbox) = mailbox::pair(id.clone(), ticket);

        let mut entries = self.entries.lock().await;
        if let Some(old) = entries.remove(&id) {
            tracing::debug!(client_id = %id, old = %old.ticket(), new = %ticket, "superseding waiter");
            old.close();

            #[cfg(feature = "metrics")]
            crate::metrics::waiter_superseded();
        }
        entries.insert(id, slot);

        #[cfg(feature = "metrics")]
        crate::metrics::set_waiters_active(entries.len());

        drop(entries);

        tracing::debug!(client_id = %mailbox.client_id(), ticket = %ticket, "registered waiter");
        mailbox
    }

    /// Hand `payload` to whoever is waiting on `id`.
    ///
    /// If nobody is, this does nothing. Otherwise the payload is written into
    /// the waiter's mailbox without blocking and the entry is removed, so an
    /// entry is delivered to at most once.
    pub async fn send(&self, id: &ClientId, payload: T) -> Delivery {
        let mut entries = self.entries.lock().await;

        let delivery = match entries.remove(id) {
            None => Delivery::NoWaiter,
            Some(slot) => match slot.fill(payload) {
                Ok(()) => Delivery::Delivered,
                Err(_dropped) => Delivery::Abandoned,
            },
        };

        #[cfg(feature = "metrics")]
        crate::metrics::set_waiters_active(entries.len());

        drop(entries);

        #[cfg(feature = "metrics")]
        crate::metrics::message_sent(delivery);

        tracing::debug!(client_id = %id, delivery = delivery.as_str(), "send");
        delivery
    }

    /// Close and remove the registration for `id`, if any.
    ///
    /// Returns whether an entry was removed. Calling it again, or for an ID
    /// that was never registered, is a no-op.
    pub async fn remove(&self, id: &ClientId) -> bool {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(id).map(Slot::close).is_some();

        #[cfg(feature = "metrics")]
        crate::metrics::set_waiters_active(entries.len());

        drop(entries);

        if removed {
            tracing::debug!(client_id = %id, "removed waiter");
        }
        removed
    }

    /// Remove the registration that issued `mailbox`, if it is still current.
    ///
    /// Unlike [`remove`](Self::remove), this leaves a newer registration for
    /// the same ID alone. Returns whether an entry was removed.
    pub async fn withdraw(&self, mailbox: &Mailbox<T>) -> bool {
        let id = mailbox.client_id();
        let mut entries = self.entries.lock().await;

        let current = entries
            .get(id)
            .is_some_and(|slot| slot.ticket() == mailbox.ticket());
        if current {
            if let Some(slot) = entries.remove(id) {
                slot.close();
            }
        }

        #[cfg(feature = "metrics")]
        crate::metrics::set_waiters_active(entries.len());

        drop(entries);

        tracing::debug!(client_id = %id, ticket = %mailbox.ticket(), removed = current, "withdrew waiter");
        current
    }

    /// Whether a wait is currently registered for `id`.
    pub async fn contains(&self, id: &ClientId) -> bool {
        self.entries.lock().await.contains_key(id)
    }

    /// Number of outstanding waits.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether there are no outstanding waits.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
