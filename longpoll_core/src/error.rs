//! Error types for the rendezvous core.

use thiserror::Error;

/// The mailbox was closed before a message arrived.
///
/// Happens when a newer registration replaced this one, or when the entry
/// was removed without being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mailbox closed before a message arrived")]
pub struct Closed;
