use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    dto::sse::{CueEvent, ServerEvent, StealStartedEvent},
    state::{RoomReplica, reducer::Cue, room::GameRoom},
};

/// Full room snapshot.
pub const EVENT_ROOM: &str = "room";
/// Sound or animation cue.
pub const EVENT_CUE: &str = "cue";
/// Start of the steal countdown.
pub const EVENT_STEAL_STARTED: &str = "steal.started";

/// Broadcast the full room snapshot to everyone following it.
pub fn broadcast_room(replica: &RoomReplica, room: &GameRoom) {
    send_room_event(replica, EVENT_ROOM, room);
}

/// Play cues on every screen. Delivery is best effort: nobody listening is not an error.
pub fn play_cues(replica: &RoomReplica, cues: &[Cue]) {
    for &cue in cues {
        debug!(
            code = %replica.code(),
            cue = cue.name(),
            listeners = replica.events().subscriber_count(),
            "playing cue"
        );
        send_room_event(replica, EVENT_CUE, &CueEvent { cue });
    }
}

/// Announce the steal attempt and the countdown screens should display.
pub fn broadcast_steal_started(replica: &RoomReplica, countdown_secs: u64) {
    send_room_event(
        replica,
        EVENT_STEAL_STARTED,
        &StealStartedEvent { countdown_secs },
    );
}

/// Room event currently describing the cached room, sent first on every new stream.
pub fn room_snapshot_event(room: &GameRoom) -> Option<ServerEvent> {
    match ServerEvent::json(Some(EVENT_ROOM.to_string()), room) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(code = %room.code, error = %err, "failed to serialize room snapshot");
            None
        }
    }
}

fn send_room_event(replica: &RoomReplica, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => replica.events().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize room SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cues_are_sent_in_order() {
        let replica = RoomReplica::new("DZ-OR");
        let mut receiver = replica.events().subscribe();
        play_cues(&replica, &[Cue::Buzzer, Cue::Tada]);

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.event.as_deref(), Some(EVENT_CUE));
        assert_eq!(first.data, r#"{"cue":"buzzer"}"#);
        assert_eq!(receiver.try_recv().unwrap().data, r#"{"cue":"tada"}"#);
    }

    #[test]
    fn steal_event_carries_countdown() {
        let replica = RoomReplica::new("DZ-OR");
        let mut receiver = replica.events().subscribe();
        broadcast_steal_started(&replica, 30);

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_STEAL_STARTED));
        assert_eq!(event.data, r#"{"countdownSecs":30}"#);
    }

    #[test]
    fn cues_without_listeners_are_dropped_silently() {
        let replica = RoomReplica::new("DZ-OR");
        play_cues(&replica, &[Cue::Ding]);
    }
}
