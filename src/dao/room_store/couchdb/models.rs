use serde::{Deserialize, Serialize};

use crate::dao::models::RoomDocument;

pub const ROOM_PREFIX: &str = "room::";

/// Document id of the room stored under `code`.
pub fn room_doc_id(code: &str) -> String {
    format!("{ROOM_PREFIX}{code}")
}

/// Room document as stored in CouchDB, with its bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoomDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: RoomDocument,
}

impl CouchRoomDocument {
    pub fn new(code: &str, body: RoomDocument, rev: Option<String>) -> Self {
        Self {
            id: room_doc_id(code),
            rev,
            body,
        }
    }
}

/// Minimal projection used to detect new revisions without decoding the room.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{questions::QuestionBank, session};

    #[test]
    fn room_body_is_flattened_next_to_couch_fields() {
        let (_, room) = session::create_room(
            "Host",
            &session::RoomSettings::default(),
            &QuestionBank::builtin(),
        );
        let doc = CouchRoomDocument::new("DZ-OR", RoomDocument::anonymous(room), None);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["_id"], json!("room::DZ-OR"));
        assert!(value.get("_rev").is_none());
        assert_eq!(value["room"]["code"], json!("DZ-OR"));

        let mut with_rev = value.clone();
        with_rev["_rev"] = json!("1-abc");
        let parsed: CouchRoomDocument = serde_json::from_value(with_rev).unwrap();
        assert_eq!(parsed.rev.as_deref(), Some("1-abc"));
        assert_eq!(parsed.body, doc.body);
    }
}
