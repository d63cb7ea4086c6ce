use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::{session::SessionError, storage::StorageError},
    state::session::JoinError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No room document exists under the requested code.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// The code typed by a player does not match the live room.
    #[error("room code `{0}` does not match the live room")]
    CodeMismatch(String),
    /// The room was updated locally but the shared write failed.
    #[error("failed to replicate room")]
    ReplicationWriteFailure(#[source] StorageError),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Nothing is loaded under the requested code.
    #[error("no room loaded for `{0}`")]
    NoRoom(String),
    /// Local submissions are frozen.
    #[error("room `{0}` is paused")]
    Paused(String),
    /// Local session slot could not be updated.
    #[error("failed to update local session")]
    Session(#[source] SessionError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<JoinError> for ServiceError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::RoomNotFound { code } => ServiceError::RoomNotFound(code),
            JoinError::CodeMismatch { code } => ServiceError::CodeMismatch(code),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        ServiceError::Session(err)
    }
}

/// Application-level errors that are converted to HTTP responses.
///
/// Messages are shown to players as-is, so they stay short.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("{0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RoomNotFound(_) => AppError::NotFound("room not found".into()),
            ServiceError::CodeMismatch(_) => AppError::NotFound("invalid room code".into()),
            ServiceError::ReplicationWriteFailure(_) => {
                AppError::ServiceUnavailable("sync failed".into())
            }
            ServiceError::Unavailable(_) => AppError::ServiceUnavailable("storage unavailable".into()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NoRoom(_) => AppError::NotFound("room not found".into()),
            ServiceError::Paused(_) => AppError::Conflict("game is paused".into()),
            ServiceError::Session(_) => AppError::Internal("session update failed".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn join_failures_are_not_found() {
        let err: ServiceError = JoinError::CodeMismatch {
            code: "XX".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::CodeMismatch(_)));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn write_failure_reads_as_sync_failed() {
        let err = ServiceError::ReplicationWriteFailure(StorageError::missing("DZ-OR"));
        let app = AppError::from(err);
        assert_eq!(app.to_string(), "sync failed");
        assert_eq!(app.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn paused_room_is_a_conflict() {
        assert_eq!(
            status_of(ServiceError::Paused("DZ-OR".into())),
            StatusCode::CONFLICT
        );
    }
}
