use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the shared event stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events().subscribe()
}

/// Convert a broadcast receiver into an SSE response for `owner_id`.
///
/// The first event is a handshake carrying `offline`; after that only events
/// addressed to everyone or to `owner_id` are forwarded.
pub fn to_sse_stream(
    offline: bool,
    mut receiver: broadcast::Receiver<ServerEvent>,
    owner_id: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let handshake = handshake_event(offline, &owner_id);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(event) = handshake {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !payload.is_visible_to(&owner_id) {
                                continue;
                            }

                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            warn!(owner_id = %owner_id, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(owner_id = %owner_id, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn handshake_event(offline: bool, owner_id: &str) -> Option<Event> {
    let handshake = Handshake {
        owner_id: owner_id.to_string(),
        message: "event stream connected".into(),
        offline,
    };
    match serde_json::to_string(&handshake) {
        Ok(data) => Some(Event::default().event(EVENT_HANDSHAKE).data(data)),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}
