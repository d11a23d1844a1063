//! # Long-Poll Core
//!
//! The rendezvous between one waiting reader and one later writer, keyed by
//! an opaque [`ClientId`].
//!
//! ```text
//!   reader                      Registry                      writer
//!     │  register(id) ─────────► [id → Slot]                     │
//!     │ ◄──────── Mailbox                                        │
//!     │                                                          │
//!     │        wait: message | timeout | cancel                  │
//!     │                          [id → Slot] ◄──── send(id, msg) │
//!     │ ◄──────── msg ───────────  (removed)                     │
//! ```
//!
//! The [`Registry`] owns the writing half of every mailbox. A reader only
//! holds the [`Mailbox`] it got back from [`Registry::register`], and the
//! [`WaitCoordinator`] resolves that mailbox against a timeout and a
//! cancellation token, withdrawing the registration on the losing branches.

pub mod client_id;
pub mod error;
pub mod mailbox;
pub mod registry;
pub mod wait;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use client_id::ClientId;
pub use error::Closed;
pub use mailbox::{Mailbox, Ticket};
pub use registry::{Delivery, Registry};
pub use wait::{Outcome, WaitCoordinator};

/// Default long-poll wait window (30 seconds).
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
