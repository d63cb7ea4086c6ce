use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{error::AppError, services::sse_service, state::SharedState};

/// Configure the room SSE routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/rooms/{code}/events", get(room_stream))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Room events stream (`room`, `cue`, `steal.started`)", content_type = "text/event-stream", body = String),
        (status = 404, description = "Room not found")
    )
)]
/// Follow a room: its snapshots, sound cues and steal countdowns.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let feed = sse_service::subscribe_room(&state, &code).await?;
    Ok(sse_service::to_sse_stream(feed))
}
