//! Host loop: reduce intents locally, replicate the result, and follow other participants' writes.

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::RoomDocument,
        room_store::{RoomStore, RoomSubscription},
    },
    dto::room::SessionResponse,
    error::ServiceError,
    services::events,
    state::{
        AppState, RoomReplica, SharedState,
        reducer::{Action, Cue},
        room::{GameRoom, GameState, User, normalize_code},
        session,
    },
};

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Upsert,
    Update,
}

/// Open the configured room with `nickname` as its host, replacing any previous game.
pub async fn create_room(
    state: &SharedState,
    nickname: &str,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let (host, room) = session::create_room(
        nickname,
        state.config().room_settings(),
        state.reducer().bank(),
    );
    if room.code.is_empty() {
        return Err(ServiceError::InvalidInput("room code must not be blank".into()));
    }

    let replica = state.replica(&room.code);
    follow(state, &replica, store.as_ref()).await?;

    {
        let _gate = replica.lock_submissions().await;
        replica.replace(room.clone()).await;
        events::broadcast_room(&replica, &room);
        events::play_cues(&replica, &[Cue::Tada]);
        write_room(state, store.as_ref(), &replica, &room, WriteMode::Upsert).await?;
    }

    info!(code = %room.code, host = %host.id, "room created");
    remember_user(state, &host).await;
    Ok(SessionResponse { user: host, room })
}

/// Add a player named `nickname` to the room they typed the code of.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    nickname: &str,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let code = normalize_code(code);
    let existing = store.fetch_room(&code).await?;
    let (user, joined) =
        session::join_room(existing.as_ref().map(|doc| &doc.room), nickname, &code)?;

    let replica = state.replica(&code);
    follow(state, &replica, store.as_ref()).await?;

    let room = {
        let _gate = replica.lock_submissions().await;
        // Append to the freshest copy we know of; the fetched one may already be stale.
        let room = match replica.room().await {
            Some(mut cached) => {
                cached.users.push(user.clone());
                cached
            }
            None => joined,
        };

        replica.replace(room.clone()).await;
        events::broadcast_room(&replica, &room);
        write_room(state, store.as_ref(), &replica, &room, WriteMode::Update).await?;
        room
    };

    info!(code = %code, user = %user.id, nickname = %user.nickname, "player joined room");
    remember_user(state, &user).await;
    Ok(SessionResponse { user, room })
}

/// Current snapshot of the room stored under `code`.
pub async fn get_room(state: &SharedState, code: &str) -> Result<GameRoom, ServiceError> {
    let replica = load_replica(state, code).await?;
    replica
        .room()
        .await
        .ok_or_else(|| ServiceError::NoRoom(replica.code().to_string()))
}

/// Reduce `action` against the cached room and replicate the result.
///
/// On a failed write the reduced room stays cached and broadcast locally, and the
/// caller receives [`ServiceError::ReplicationWriteFailure`].
pub async fn submit_action(
    state: &SharedState,
    code: &str,
    action: Action,
) -> Result<GameRoom, ServiceError> {
    let replica = load_replica(state, code).await?;
    let store = state.require_room_store().await?;

    let _gate = replica.lock_submissions().await;
    if replica.is_paused() {
        debug!(code = %replica.code(), action = action.name(), "rejecting action while paused");
        return Err(ServiceError::Paused(replica.code().to_string()));
    }
    let current = replica
        .room()
        .await
        .ok_or_else(|| ServiceError::NoRoom(replica.code().to_string()))?;

    let reduction = state.reducer().reduce(&current, &action);
    if reduction.is_noop() {
        debug!(code = %replica.code(), action = action.name(), "action had no effect");
        return Ok(current);
    }

    events::play_cues(&replica, &reduction.cues);
    if !reduction.changed() {
        return Ok(current);
    }

    let room = reduction.room;
    let previous = replica.replace(room.clone()).await;
    events::broadcast_room(&replica, &room);
    if room.state == GameState::Steal && previous != Some(GameState::Steal) {
        events::broadcast_steal_started(&replica, state.config().steal_countdown_secs());
    }

    write_room(state, store.as_ref(), &replica, &room, WriteMode::Update).await?;
    info!(
        code = %replica.code(),
        action = action.name(),
        state = ?room.state,
        round_score = room.round_score,
        strikes = room.strikes,
        "action applied"
    );
    Ok(room)
}

/// Freeze or resume local submissions for the room under `code`.
pub async fn set_paused(
    state: &SharedState,
    code: &str,
    paused: bool,
) -> Result<bool, ServiceError> {
    let replica = load_replica(state, code).await?;
    if replica.set_paused(paused) != paused {
        info!(code = %replica.code(), paused, "room pause toggled");
    }
    Ok(paused)
}

/// Remove a participant. The host stays in the room; only their saved session is dropped.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<(), ServiceError> {
    let room = get_room(state, code).await?;
    let Some(user) = room.user(user_id) else {
        return Err(ServiceError::NotFound(format!("user `{user_id}`")));
    };

    if user.is_host {
        forget_user(state, user_id).await?;
        info!(code = %room.code, user = %user_id, "host left");
        return Ok(());
    }

    submit_action(
        state,
        &room.code,
        Action::DisconnectUser {
            user_id: user_id.to_string(),
        },
    )
    .await?;

    forget_user(state, user_id).await?;
    info!(code = %room.code, user = %user_id, "player left room");
    Ok(())
}

/// Clear the session slot only when it still holds `user_id`.
async fn forget_user(state: &AppState, user_id: &str) -> Result<(), ServiceError> {
    let saved = state.sessions().load_user().await;
    if saved.is_some_and(|saved| saved.id == user_id) {
        state.sessions().clear_user().await?;
        debug!(user = %user_id, "local session cleared");
    }
    Ok(())
}

/// Replica of `code` with a cached room, fetching it from the store on first use.
pub async fn load_replica(
    state: &SharedState,
    code: &str,
) -> Result<Arc<RoomReplica>, ServiceError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(ServiceError::InvalidInput("room code must not be blank".into()));
    }

    if let Some(replica) = state.existing_replica(&code) {
        if replica.room().await.is_some() {
            return Ok(replica);
        }
    }

    let store = state.require_room_store().await?;
    let Some(document) = store.fetch_room(&code).await? else {
        return Err(ServiceError::NoRoom(code));
    };

    let replica = state.replica(&code);
    follow(state, &replica, store.as_ref()).await?;
    // A snapshot delivered since subscribing is newer than the fetched one.
    if replica.room().await.is_none() {
        replica.replace(document.room).await;
    }
    Ok(replica)
}

/// Start applying snapshots written by other participants, once per replica.
async fn follow(
    state: &SharedState,
    replica: &RoomReplica,
    store: &dyn RoomStore,
) -> Result<(), ServiceError> {
    if replica.is_listening().await {
        return Ok(());
    }

    let subscription = store.subscribe(replica.code()).await?;
    let handle = tokio::spawn(listen(
        Arc::downgrade(state),
        replica.code().to_string(),
        subscription,
    ));
    replica.set_listener(handle).await;
    debug!(code = %replica.code(), "following room");
    Ok(())
}

async fn listen(state: Weak<AppState>, code: String, mut subscription: RoomSubscription) {
    while let Some(document) = subscription.next().await {
        let Some(state) = state.upgrade() else {
            break;
        };
        let Some(replica) = state.existing_replica(&code) else {
            break;
        };
        apply_remote(&state, &replica, document).await;
    }
    debug!(code = %code, "stopped following room");
}

async fn apply_remote(state: &AppState, replica: &RoomReplica, document: RoomDocument) {
    let Some(update) = replica.accept_remote(document).await else {
        debug!(code = %replica.code(), "dropping echo of own write");
        return;
    };

    debug!(code = %replica.code(), state = ?update.room.state, "applied remote room snapshot");
    events::broadcast_room(replica, &update.room);
    if update.entered_steal() {
        events::broadcast_steal_started(replica, state.config().steal_countdown_secs());
    }
    mirror_locally(state, &update.room).await;
}

async fn write_room(
    state: &AppState,
    store: &dyn RoomStore,
    replica: &RoomReplica,
    room: &GameRoom,
    mode: WriteMode,
) -> Result<(), ServiceError> {
    let document = RoomDocument::written_by(room.clone(), replica.echo().next_write_id());
    let result = match mode {
        WriteMode::Upsert => store.upsert_room(replica.code(), document).await,
        WriteMode::Update => store.update_room(replica.code(), document).await,
    };
    mirror_locally(state, room).await;

    result.map_err(|err| {
        warn!(code = %replica.code(), error = %err, "failed to replicate room; keeping local state");
        ServiceError::ReplicationWriteFailure(err)
    })
}

/// Keep the room slot current when there is no shared store to restore from.
async fn mirror_locally(state: &AppState, room: &GameRoom) {
    if !state.mirrors_room_locally() {
        return;
    }
    if let Err(err) = state.sessions().save_room(room).await {
        warn!(code = %room.code, error = %err, "failed to persist room locally");
    }
}

async fn remember_user(state: &AppState, user: &User) {
    if let Err(err) = state.sessions().save_user(user).await {
        warn!(user = %user.id, error = %err, "failed to persist local session");
    }
}
