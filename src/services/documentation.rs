use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Feud Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::submit_action,
        crate::routes::rooms::set_paused,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::current_session,
        crate::routes::events::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::SessionResponse,
            crate::dto::room::SubmitActionRequest,
            crate::dto::room::PauseRequest,
            crate::dto::room::PauseResponse,
            crate::dto::room::LeaveRequest,
            crate::dto::sse::CueEvent,
            crate::dto::sse::StealStartedEvent,
            crate::state::room::GameRoom,
            crate::state::room::GameState,
            crate::state::room::Team,
            crate::state::room::User,
            crate::state::room::Question,
            crate::state::room::Answer,
            crate::state::reducer::Cue,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle and game actions"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
