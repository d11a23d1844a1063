//! Single-slot mailboxes.
//!
//! A mailbox is split in two: the [`Slot`] the registry keeps and writes into
//! at most once, and the [`Mailbox`] a waiter resolves. Dropping or filling
//! the slot closes it, so the waiter always ends in exactly one of "got a
//! payload" or [`Closed`].

use core::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{FutureExt, channel::oneshot};

use crate::{client_id::ClientId, error::Closed};

/// Generation number of a registration.
///
/// Every call to [`Registry::register`](crate::Registry::register) issues a
/// fresh ticket, so two registrations under the same [`ClientId`] can be
/// told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) const fn new(n: u64) -> Self {
        Self(n)
    }

    /// The raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Create a connected slot/mailbox pair.
pub(crate) fn pair<T>(client_id: ClientId, ticket: Ticket) -> (Slot<T>, Mailbox<T>) {
    let (tx, rx) = oneshot::channel();
    (Slot { ticket, tx }, Mailbox { client_id, ticket, rx })
}

/// The writing half of a mailbox, owned by the registry.
pub(crate) struct Slot<T> {
    ticket: Ticket,
    tx: oneshot::Sender<T>,
}

impl<T> Slot<T> {
    pub(crate) const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Write `payload` and close the slot.
    ///
    /// Never blocks. Hands the payload back if the waiter is gone.
    pub(crate) fn fill(self, payload: T) -> Result<(), T> {
        self.tx.send(payload)
    }

    /// Close the slot without writing.
    pub(crate) fn close(self) {
        drop(self.tx);
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("ticket", &self.ticket)
            .field("abandoned", &self.tx.is_canceled())
            .finish()
    }
}

/// The reading half of a mailbox.
///
/// Resolves (as a [`Future`]) to the delivered payload, or to [`Closed`] if
/// the registration ended without one.
pub struct Mailbox<T> {
    client_id: ClientId,
    ticket: Ticket,
    rx: oneshot::Receiver<T>,
}

impl<T> Mailbox<T> {
    /// The ID this mailbox was registered under.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The registration this mailbox belongs to.
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Check for a payload without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Closed`] if the slot was closed without a payload.
    pub fn try_recv(&mut self) -> Result<Option<T>, Closed> {
        self.rx.try_recv().map_err(|_| Closed)
    }
}

impl<T> Future for Mailbox<T> {
    type Output = Result<T, Closed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|res| res.map_err(|_| Closed))
    }
}

impl<T> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("client_id", &self.client_id)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pair() -> (Slot<&'static str>, Mailbox<&'static str>) {
        pair(ClientId::from("a"), Ticket::new(1))
    }

    #[tokio::test]
    async fn filled_slot_resolves_mailbox() {
        let (slot, mailbox) = test_pair();
        assert_eq!(slot.fill("hello"), Ok(()));
        assert_eq!(mailbox.await, Ok("hello"));
    }

    #[tokio::test]
    async fn closed_slot_resolves_to_closed() {
        let (slot, mailbox) = test_pair();
        slot.close();
        assert_eq!(mailbox.await, Err(Closed));
    }

    #[test]
    fn fill_after_waiter_dropped_hands_payload_back() {
        let (slot, mailbox) = test_pair();
        drop(mailbox);
        assert_eq!(slot.fill("late"), Err("late"));
    }

    #[test]
    fn try_recv_reports_empty_then_payload() {
        let (slot, mut mailbox) = test_pair();
        assert_eq!(mailbox.try_recv(), Ok(None));

        assert_eq!(slot.fill("x"), Ok(()));
        assert_eq!(mailbox.try_recv(), Ok(Some("x")));
    }

    #[test]
    fn ticket_displays_with_hash() {
        assert_eq!(format!("{}", Ticket::new(42)), "#42");
    }
}
