//! Server-Sent Events (SSE) feed of session changes.
//!
//! Each subscriber first receives the current phase, so a page rendered just
//! before an operation finished still learns about it.

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::extract::State;
use futures_core::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppEvent, SharedState};

pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let phase = state.session.read().await.phase();

    let initial = tokio_stream::once(AppEvent::SessionChanged { phase: phase.as_str().to_string() });
    let updates = BroadcastStream::new(rx).filter_map(|item| match item {
        Ok(event) => Some(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "SSE subscriber lagged behind");
            None
        }
    });

    let stream = initial
        .chain(updates)
        .filter_map(|event| Event::default().json_data(&event).ok())
        .map(Ok);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
