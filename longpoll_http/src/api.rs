//! JSON bodies exchanged with the endpoints.

use serde::{Deserialize, Serialize};

/// `POST /send/{id}` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// The payload handed to the waiting reader. Empty when absent.
    #[serde(default)]
    pub message: String,
}

/// `POST /send/{id}` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Always [`SEND_ACK`](crate::SEND_ACK).
    pub status: String,
}

/// `GET /poll/{id}` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    /// The delivered payload.
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}
