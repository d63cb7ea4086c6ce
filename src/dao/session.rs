//! Local, durable key-value slots remembering who this participant is.
//!
//! Each slot is one JSON file named after its versioned key inside the session directory.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::room::{GameRoom, User};

/// Slot holding the current user.
pub const SESSION_KEY: &str = "feud_session_v3";
/// Slot holding the current room when no shared store is available.
pub const ROOM_KEY: &str = "feud_room_v3";

/// Failures while writing or clearing a session slot.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Filesystem failure on a slot file.
    #[error("failed to access session slot `{path}`")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// Slot value could not be serialized.
    #[error("failed to encode session slot `{key}`")]
    Encode {
        /// Slot being written.
        key: &'static str,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed session slots.
#[derive(Debug, Clone)]
pub struct SessionSlots {
    dir: PathBuf,
}

impl SessionSlots {
    /// Slots stored under `dir`, created lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Last user persisted by this participant.
    pub async fn load_user(&self) -> Option<User> {
        self.load(SESSION_KEY).await
    }

    /// Persist `user` as this participant's identity.
    pub async fn save_user(&self, user: &User) -> Result<(), SessionError> {
        self.save(SESSION_KEY, user).await
    }

    /// Forget the saved identity.
    pub async fn clear_user(&self) -> Result<(), SessionError> {
        self.clear(SESSION_KEY).await
    }

    /// Last room snapshot persisted for the memory-store fallback.
    pub async fn load_room(&self) -> Option<GameRoom> {
        self.load(ROOM_KEY).await
    }

    /// Persist the latest room snapshot.
    pub async fn save_room(&self, room: &GameRoom) -> Result<(), SessionError> {
        self.save(ROOM_KEY, room).await
    }

    /// Forget the saved room snapshot.
    pub async fn clear_room(&self) -> Result<(), SessionError> {
        self.clear(ROOM_KEY).await
    }

    /// Read a slot; unreadable or corrupted content counts as "no prior session".
    async fn load<T: DeserializeOwned>(&self, key: &'static str) -> Option<T> {
        let path = self.path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(slot = key, "no persisted session slot");
                return None;
            }
            Err(err) => {
                warn!(slot = key, path = %path.display(), error = %err, "failed to read session slot");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(slot = key, path = %path.display(), error = %err, "ignoring corrupted session slot");
                None
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &'static str, value: &T) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|source| SessionError::Encode { key, source })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SessionError::Io {
                path: self.dir.clone(),
                source,
            })?;

        // Write then rename so a crash never leaves a half-written slot behind.
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|source| SessionError::Io {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| SessionError::Io { path, source })
    }

    async fn clear(&self, key: &'static str) -> Result<(), SessionError> {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }
}
