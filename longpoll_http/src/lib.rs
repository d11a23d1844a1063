//! # Long-Poll HTTP
//!
//! Axum endpoints around the [`longpoll_core`] rendezvous.
//!
//! ```text
//! ┌──────────┐                              ┌──────────┐                ┌──────────┐
//! │  Reader  │                              │  Server  │                │  Writer  │
//! └────┬─────┘                              └────┬─────┘                └────┬─────┘
//!      │  GET /poll/{id}                         │                           │
//!      │ ──────────────────────────────────────► │                           │
//!      │           ... (blocks) ...              │  POST /send/{id}          │
//!      │                                         │  {"message": "hi"}        │
//!      │                                         │ ◄──────────────────────── │
//!      │                                         │  200 {"status": ...}      │
//!      │  200 {"message": "hi"}                  │ ────────────────────────► │
//!      │ ◄────────────────────────────────────── │                           │
//! ```
//!
//! A poll that sees no message within the wait window gets `504`. A poll
//! replaced by a newer poll for the same ID gets `409`. A reader that hangs
//! up gets nothing, but its registration is still withdrawn.

pub mod api;
pub mod error;
pub mod server;

pub use longpoll_core::DEFAULT_POLL_TIMEOUT_SECS;

/// Default maximum `/send` request body size (64 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Acknowledgement returned by `/send`, whether or not anyone was waiting.
pub const SEND_ACK: &str = "message sent";
