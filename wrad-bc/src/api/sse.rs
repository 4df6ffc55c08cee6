//! Server-Sent Events: the live listener feed
//!
//! Each connection is one hub subscription. The stream owns the
//! `Subscription`, so when axum drops the stream (client gone) the listener
//! is unsubscribed.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

use crate::AppState;

/// GET /radio/events
///
/// Frames are named after the event kind (`connected`, `snapshot`,
/// `track-change`, `counters-update`, `heartbeat`) and carry the JSON event.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.scheduler.subscribe().await;
    debug!("SSE listener {} connected", subscription.id());

    let stream = async_stream::stream! {
        while let Some(event) = subscription.recv().await {
            match Event::default().event(event.kind()).json_data(&*event) {
                Ok(frame) => yield Ok(frame),
                Err(e) => warn!("Failed to serialize {} event: {}", event.kind(), e),
            }
        }
        // Hub dropped us (stalled); ending the stream makes the client reconnect
        debug!("SSE listener {} stream ended", subscription.id());
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
