//! Restoring the local participant's identity across restarts.

use tracing::{info, warn};

use crate::{
    dao::models::RoomDocument,
    dto::room::SessionResponse,
    error::ServiceError,
    services::room_service,
    state::{SharedState, room::normalize_code},
};

/// Session persisted on this device, if its user is still part of the configured room.
///
/// A saved user who no longer belongs to the room is forgotten.
pub async fn current_session(state: &SharedState) -> Result<SessionResponse, ServiceError> {
    let Some(saved) = state.sessions().load_user().await else {
        return Err(ServiceError::NotFound("no saved session".into()));
    };

    let code = normalize_code(&state.config().room_settings().code);
    let room = match room_service::get_room(state, &code).await {
        Ok(room) => room,
        Err(ServiceError::NoRoom(_)) => {
            info!(code = %code, user = %saved.id, "saved session points to a missing room; forgetting it");
            state.sessions().clear_user().await?;
            return Err(ServiceError::NotFound("no saved session".into()));
        }
        Err(err) => return Err(err),
    };

    match room.user(&saved.id).cloned() {
        Some(user) => Ok(SessionResponse { user, room }),
        None => {
            info!(code = %code, user = %saved.id, "saved user left the room; forgetting session");
            state.sessions().clear_user().await?;
            Err(ServiceError::NotFound("no saved session".into()))
        }
    }
}

/// Bring back the previous room and session once a room store is installed.
pub async fn restore(state: &SharedState) {
    if state.mirrors_room_locally() {
        restore_room(state).await;
    }

    match current_session(state).await {
        Ok(session) => info!(
            code = %session.room.code,
            user = %session.user.id,
            host = session.user.is_host,
            "restored local session"
        ),
        Err(ServiceError::NotFound(reason)) => info!(%reason, "no local session to restore"),
        Err(err) => warn!(error = %err, "failed to restore local session"),
    }
}

/// Seed the memory store with the room mirrored on disk before the last shutdown.
async fn restore_room(state: &SharedState) {
    let Some(room) = state.sessions().load_room().await else {
        return;
    };
    let code = normalize_code(&state.config().room_settings().code);
    if normalize_code(&room.code) != code {
        info!(saved = %room.code, code = %code, "saved room belongs to another code; forgetting it");
        if let Err(err) = state.sessions().clear_room().await {
            warn!(error = %err, "failed to clear stale room slot");
        }
        return;
    }
    let store = match state.require_room_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "cannot restore room without a store");
            return;
        }
    };

    match store.fetch_room(&room.code).await {
        Ok(Some(_)) => info!(code = %room.code, "room already present in store; keeping it"),
        Ok(None) => {
            let code = room.code.clone();
            match store.upsert_room(&code, RoomDocument::anonymous(room)).await {
                Ok(()) => info!(code = %code, "restored room from local slot"),
                Err(err) => warn!(code = %code, error = %err, "failed to restore room"),
            }
        }
        Err(err) => warn!(code = %room.code, error = %err, "failed to look up room to restore"),
    }
}
