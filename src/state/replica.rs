//! One participant's cached copy of a shared room.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::{
    sync::{Mutex, MutexGuard, RwLock},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    dao::models::{RoomDocument, WriteId},
    state::{
        room::{GameRoom, GameState},
        sse::SseHub,
    },
};

const ROOM_EVENTS_CAPACITY: usize = 64;

/// Tags outgoing writes and recognizes them when the store echoes them back.
#[derive(Debug)]
pub struct EchoGuard {
    origin: Uuid,
    last_sent: AtomicU64,
}

impl EchoGuard {
    /// Guard with a fresh random origin.
    pub fn new() -> Self {
        Self::with_origin(Uuid::new_v4())
    }

    /// Guard tagging writes with `origin`.
    pub fn with_origin(origin: Uuid) -> Self {
        Self {
            origin,
            last_sent: AtomicU64::new(0),
        }
    }

    /// Identifier of this participant's writes.
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Reserve the marker of the next outgoing write.
    pub fn next_write_id(&self) -> WriteId {
        let seq = self.last_sent.fetch_add(1, Ordering::SeqCst) + 1;
        WriteId {
            origin: self.origin,
            seq,
        }
    }

    /// True when `write_id` belongs to a write this guard already issued.
    pub fn is_echo(&self, write_id: Option<&WriteId>) -> bool {
        match write_id {
            Some(id) => id.origin == self.origin && id.seq <= self.last_sent.load(Ordering::SeqCst),
            None => false,
        }
    }
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot from another participant that replaced the cached room.
#[derive(Debug, Clone)]
pub struct RemoteUpdate {
    /// State of the cached room before the update, if one was cached.
    pub previous: Option<GameState>,
    /// Snapshot now cached.
    pub room: GameRoom,
}

impl RemoteUpdate {
    /// True when the update moved the room into its steal phase.
    pub fn entered_steal(&self) -> bool {
        self.room.state == GameState::Steal && self.previous != Some(GameState::Steal)
    }
}

/// Cached room plus everything needed to submit to and follow it.
pub struct RoomReplica {
    code: String,
    room: RwLock<Option<GameRoom>>,
    paused: AtomicBool,
    echo: EchoGuard,
    events: SseHub,
    gate: Mutex<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RoomReplica {
    /// Empty replica following the room stored under the normalized `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            room: RwLock::new(None),
            paused: AtomicBool::new(false),
            echo: EchoGuard::new(),
            events: SseHub::new(ROOM_EVENTS_CAPACITY),
            gate: Mutex::new(()),
            listener: Mutex::new(None),
        }
    }

    /// Normalized code of the followed room.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Current cached room, if one was loaded.
    pub async fn room(&self) -> Option<GameRoom> {
        self.room.read().await.clone()
    }

    /// Overwrite the cached room, returning the state it replaced.
    pub async fn replace(&self, room: GameRoom) -> Option<GameState> {
        let mut guard = self.room.write().await;
        guard.replace(room).map(|previous| previous.state)
    }

    /// Apply a snapshot received from the store unless it echoes one of our own writes.
    pub async fn accept_remote(&self, document: RoomDocument) -> Option<RemoteUpdate> {
        if self.echo.is_echo(document.write_id.as_ref()) || document.room.code != self.code {
            return None;
        }

        let previous = self.replace(document.room.clone()).await;
        Some(RemoteUpdate {
            previous,
            room: document.room,
        })
    }

    /// Whether local submissions are frozen.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Set the pause flag, returning the previous value.
    pub fn set_paused(&self, paused: bool) -> bool {
        self.paused.swap(paused, Ordering::SeqCst)
    }

    /// Marker source for this replica's writes.
    pub fn echo(&self) -> &EchoGuard {
        &self.echo
    }

    /// Hub fanning room, cue and steal events out to SSE subscribers.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Serialize local submissions so each reduction starts from the previous result.
    pub async fn lock_submissions(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Whether a task is currently applying snapshots from the store.
    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Install the task following the store, stopping any previous one.
    pub async fn set_listener(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.listener.lock().await.replace(handle) {
            previous.abort();
        }
    }
}
