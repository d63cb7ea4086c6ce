pub mod questions;
pub mod reducer;
pub mod replica;
pub mod room;
pub mod session;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::{
    config::{AppConfig, StoreKind},
    dao::{room_store::RoomStore, session::SessionSlots},
    error::ServiceError,
};

pub use self::replica::RoomReplica;
pub use self::sse::SseHub;
use self::reducer::RoomReducer;

/// Shared handle passed to services and route handlers.
pub type SharedState = Arc<AppState>;

/// Central application state holding the room store, cached rooms and local session slots.
pub struct AppState {
    config: AppConfig,
    reducer: RoomReducer,
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    replicas: DashMap<String, Arc<RoomReplica>>,
    sessions: SessionSlots,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a room store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            reducer: RoomReducer::new(config.questions()),
            sessions: SessionSlots::new(config.session_dir().clone()),
            config,
            room_store: RwLock::new(None),
            replicas: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Reducer seeded with the configured question bank.
    pub fn reducer(&self) -> &RoomReducer {
        &self.reducer
    }

    /// Local "current user" and "current room" slots.
    pub fn sessions(&self) -> &SessionSlots {
        &self.sessions
    }

    /// Whether rooms are mirrored into the local session slots.
    pub fn mirrors_room_locally(&self) -> bool {
        self.config.store() == StoreKind::Memory
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with [`ServiceError::Degraded`].
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn set_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Replica of the room stored under the normalized `code`, created on first use.
    pub fn replica(&self, code: &str) -> Arc<RoomReplica> {
        self.replicas
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(RoomReplica::new(code)))
            .clone()
    }

    /// Replica of `code` if this process already follows it.
    pub fn existing_replica(&self, code: &str) -> Option<Arc<RoomReplica>> {
        self.replicas.get(code).map(|entry| entry.clone())
    }
}
