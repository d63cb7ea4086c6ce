use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::room::{
        CreateRoomRequest, JoinRoomRequest, LeaveRequest, PauseRequest, PauseResponse,
        SessionResponse, SubmitActionRequest,
    },
    error::AppError,
    services::{room_service, session_service},
    state::{SharedState, reducer::Action, room::GameRoom},
};

/// Routes driving the room lifecycle and gameplay.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/actions", post(submit_action))
        .route("/rooms/{code}/pause", post(set_paused))
        .route("/rooms/{code}/leave", post(leave_room))
        .route("/session", get(current_session))
}

/// Open the room as its host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = SessionResponse),
        (status = 503, description = "Room store unavailable or write failed")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = room_service::create_room(&state, &payload.nickname).await?;
    Ok(Json(session))
}

/// Enter an existing room as a player.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = SessionResponse),
        (status = 404, description = "Room not found or code mismatch")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = room_service::join_room(&state, &code, &payload.nickname).await?;
    Ok(Json(session))
}

/// Current room snapshot.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Room snapshot", body = GameRoom),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameRoom>, AppError> {
    let room = room_service::get_room(&state, &code).await?;
    Ok(Json(room))
}

/// Submit a game action. Unknown or malformed actions leave the room unchanged.
#[utoipa::path(
    post,
    path = "/rooms/{code}/actions",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = SubmitActionRequest,
    responses(
        (status = 200, description = "Room after the action", body = GameRoom),
        (status = 409, description = "Room is paused"),
        (status = 503, description = "Applied locally but replication failed")
    )
)]
pub async fn submit_action(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SubmitActionRequest>>,
) -> Result<Json<GameRoom>, AppError> {
    let action = Action::from_submission(&payload.kind, payload.payload);
    let room = room_service::submit_action(&state, &code, action).await?;
    Ok(Json(room))
}

/// Freeze or resume action submission from this process.
#[utoipa::path(
    post,
    path = "/rooms/{code}/pause",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = PauseRequest,
    responses(
        (status = 200, description = "Pause flag applied", body = PauseResponse)
    )
)]
pub async fn set_paused(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<PauseRequest>,
) -> Result<Json<PauseResponse>, AppError> {
    let paused = room_service::set_paused(&state, &code, payload.paused).await?;
    Ok(Json(PauseResponse { paused }))
}

/// Leave the room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = LeaveRequest,
    responses(
        (status = 204, description = "Left the room"),
        (status = 404, description = "Unknown room or user")
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<LeaveRequest>>,
) -> Result<StatusCode, AppError> {
    room_service::leave_room(&state, &code, &payload.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session saved on this device, if its user is still in the room.
#[utoipa::path(
    get,
    path = "/session",
    tag = "rooms",
    responses(
        (status = 200, description = "Saved session", body = SessionResponse),
        (status = 404, description = "No saved session")
    )
)]
pub async fn current_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_service::current_session(&state).await?;
    Ok(Json(session))
}
