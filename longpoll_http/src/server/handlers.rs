//! HTTP request handlers for the long-polling server.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use longpoll_core::{ClientId, Outcome};
use tracing::{debug, warn};

use super::state::LongPollState;
use crate::{
    SEND_ACK,
    api::{PollResponse, SendRequest, SendResponse},
    error::ApiError,
};

/// Create the Axum router for HTTP long-polling.
pub fn router(state: Arc<LongPollState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_size());

    Router::new()
        .route("/poll/{id}", get(handle_poll))
        .route("/send/{id}", post(handle_send))
        .layer(body_limit)
        .with_state(state)
}

/// Handle poll requests (block until a message, the timeout, or disconnect).
async fn handle_poll(
    State(state): State<Arc<LongPollState>>,
    Path(id): Path<String>,
) -> Response {
    let id = ClientId::from(id);
    debug!(client_id = %id, "GET /poll: waiting");

    // Hyper drops this future when the client hangs up. The wait runs in its
    // own task so it can still withdraw; the guard turns the drop into a
    // cancellation it observes.
    let cancel = state.shutdown.child_token();
    let _disconnect = cancel.clone().drop_guard();

    let coordinator = state.coordinator.clone();
    let wait = tokio::spawn(async move { coordinator.wait(id, &cancel).await });

    let outcome = match wait.await {
        Ok(outcome) => outcome,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match outcome {
        Outcome::Delivered(message) => Json(PollResponse { message }).into_response(),
        Outcome::TimedOut => ApiError::Timeout.into_response(),
        Outcome::Superseded => ApiError::Superseded.into_response(),
        Outcome::Cancelled if state.is_shutting_down() => ApiError::ShuttingDown.into_response(),
        // Nobody is left to read this.
        Outcome::Cancelled => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Handle send requests (hand a message to whoever is polling `id`).
///
/// The body is decoded as JSON whatever its `Content-Type`.
async fn handle_send(
    State(state): State<Arc<LongPollState>>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let body = body.map_err(|e| {
        warn!(client_id = %id, error = %e, "POST /send: failed to read body");
        ApiError::InvalidRequest
    })?;

    let SendRequest { message } = serde_json::from_slice::<SendRequest>(&body).map_err(|e| {
        warn!(client_id = %id, error = %e, "POST /send: failed to decode body");
        ApiError::InvalidRequest
    })?;

    let id = ClientId::from(id);
    let delivery = state.registry().send(&id, message).await;
    debug!(client_id = %id, delivery = delivery.as_str(), "POST /send");

    Ok(Json(SendResponse {
        status: SEND_ACK.to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    use longpoll_core::Registry;
    use tokio_util::sync::CancellationToken;

    fn test_state(poll_timeout: Duration) -> Arc<LongPollState> {
        Arc::new(LongPollState::new(
            Arc::new(Registry::new()),
            poll_timeout,
            crate::DEFAULT_MAX_BODY_SIZE,
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn dropped_poll_withdraws_its_registration() {
        let state = test_state(Duration::from_secs(30));
        let id = ClientId::from("C");

        let poll = handle_poll(State(state.clone()), Path("C".to_owned()));
        let abandoned = tokio::time::timeout(Duration::from_millis(50), poll).await;
        assert!(abandoned.is_err(), "poll should still be pending");

        tokio::time::timeout(Duration::from_secs(5), async {
            while state.registry().contains(&id).await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("registration withdrawn after disconnect");
    }

    #[tokio::test]
    async fn shutdown_resolves_pending_poll_with_unavailable() {
        let shutdown = CancellationToken::new();
        let state = Arc::new(LongPollState::new(
            Arc::new(Registry::new()),
            Duration::from_secs(30),
            crate::DEFAULT_MAX_BODY_SIZE,
            shutdown.clone(),
        ));

        let poll = tokio::spawn(handle_poll(State(state.clone()), Path("S".to_owned())));
        while !state.registry().contains(&ClientId::from("S")).await {
            tokio::task::yield_now().await;
        }
        shutdown.cancel();

        let response = poll.await.expect("poll task");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(state.registry().is_empty().await);
    }

    #[tokio::test]
    async fn send_acknowledges_without_waiter() {
        let state = test_state(Duration::from_secs(30));

        let body = Ok(Bytes::from_static(br#"{"message":"x"}"#));
        let Json(ack) = handle_send(State(state.clone()), Path("D".to_owned()), body)
            .await
            .expect("send");

        assert_eq!(ack.status, SEND_ACK);
        assert!(state.registry().is_empty().await);
    }

    #[tokio::test]
    async fn send_decodes_body_without_json_content_type() {
        let state = test_state(Duration::from_secs(30));
        let mut mailbox = state.registry().register(ClientId::from("A")).await;

        let body = Ok(Bytes::from_static(br#"{"message":"hi"}"#));
        handle_send(State(state.clone()), Path("A".to_owned()), body)
            .await
            .expect("send");

        assert_eq!(mailbox.try_recv(), Ok(Some("hi".to_owned())));
    }

    #[tokio::test]
    async fn send_rejects_non_json_body() {
        let state = test_state(Duration::from_secs(30));

        let body = Ok(Bytes::from_static(b"message=hi"));
        let err = handle_send(State(state), Path("A".to_owned()), body)
            .await
            .expect_err("non-JSON body");

        assert!(matches!(err, ApiError::InvalidRequest));
    }
}
