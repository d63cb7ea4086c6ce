use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::room::GameRoom;

/// Causality marker attached to every write of a room document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteId {
    /// Replica that issued the write.
    pub origin: Uuid,
    /// Per-replica sequence number, strictly increasing.
    pub seq: u64,
}

/// Snapshot of a room as persisted and fanned out by the shared store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    /// The full authoritative room.
    pub room: GameRoom,
    /// Writer of this snapshot; absent for documents restored from a local session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_id: Option<WriteId>,
}

impl RoomDocument {
    /// Wrap a room written by the given replica.
    pub fn written_by(room: GameRoom, write_id: WriteId) -> Self {
        Self {
            room,
            write_id: Some(write_id),
        }
    }

    /// Wrap a room with no known writer.
    pub fn anonymous(room: GameRoom) -> Self {
        Self {
            room,
            write_id: None,
        }
    }

    /// Normalized code the document is keyed by.
    pub fn code(&self) -> &str {
        &self.room.code
    }
}
