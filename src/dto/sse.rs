use serde::Serialize;
use utoipa::ToSchema;

use crate::state::reducer::Cue;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; `None` for the default `message` event.
    pub event: Option<String>,
    /// JSON-encoded payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Sound to play on every screen following the room.
pub struct CueEvent {
    /// Cue to play.
    pub cue: Cue,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when the opposing team gets its steal attempt.
pub struct StealStartedEvent {
    /// Length of the on-screen countdown. Nothing expires server-side.
    pub countdown_secs: u64,
}
