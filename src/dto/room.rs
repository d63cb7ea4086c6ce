use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_nickname,
    state::room::{GameRoom, User},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload used to open the room as its host.
pub struct CreateRoomRequest {
    /// Display name, 1 to 32 characters once trimmed.
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload used by a player to enter an existing room.
pub struct JoinRoomRequest {
    /// Display name, 1 to 32 characters once trimmed.
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Identity assigned to the caller together with the room they are in.
pub struct SessionResponse {
    /// The caller's identity.
    pub user: User,
    /// Current room snapshot.
    pub room: GameRoom,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Intent submitted by a presentation layer, e.g. `{"type": "REVEAL_ANSWER", "payload": {"answerId": 3}}`.
pub struct SubmitActionRequest {
    /// Action name such as `START_ROUND`.
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub kind: String,
    /// Action fields; absent for actions without any.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Freeze or resume local action submission.
pub struct PauseRequest {
    /// Requested pause flag.
    pub paused: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Pause flag after the request was applied.
pub struct PauseResponse {
    /// Current pause flag.
    pub paused: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
/// Participant leaving the room.
pub struct LeaveRequest {
    /// Identifier of the leaving user.
    #[validate(length(min = 1))]
    pub user_id: String,
}
