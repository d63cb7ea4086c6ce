use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{events, room_service},
    state::SharedState,
};

/// Live event feed of one room, starting with its current snapshot.
pub struct RoomFeed {
    /// Normalized room code.
    pub code: String,
    /// Snapshot sent before any live event.
    pub initial: Option<ServerEvent>,
    /// Live events of the room.
    pub receiver: broadcast::Receiver<ServerEvent>,
}

/// Subscribe to the events of the room stored under `code`, loading it if needed.
pub async fn subscribe_room(state: &SharedState, code: &str) -> Result<RoomFeed, ServiceError> {
    let replica = room_service::load_replica(state, code).await?;
    // Subscribe before reading the snapshot so no update falls in between.
    let receiver = replica.events().subscribe();
    let initial = replica
        .room()
        .await
        .and_then(|room| events::room_snapshot_event(&room));

    Ok(RoomFeed {
        code: replica.code().to_string(),
        initial,
        receiver,
    })
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a room feed into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(feed: RoomFeed) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let RoomFeed {
        code,
        initial,
        mut receiver,
    } = feed;
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(initial) = initial {
            if tx.send(Ok(to_event(initial))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            debug!(code = %code, skipped, "room SSE stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(code = %code, "room SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
