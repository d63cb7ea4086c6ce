//! Creation of users and rooms when a host opens a room or a player joins it.

use indexmap::IndexMap;
use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

use crate::state::{
    questions::QuestionBank,
    room::{GameRoom, GameState, Team, User, normalize_code},
};

const ID_SUFFIX_LENGTH: usize = 9;
const HOST_ID_PREFIX: &str = "host";
const USER_ID_PREFIX: &str = "user";

/// Reasons a player cannot enter a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Nobody has opened a room under this code yet.
    #[error("room `{code}` has not been opened yet")]
    RoomNotFound { code: String },
    /// The code does not match the live room.
    #[error("room code `{code}` does not match any live room")]
    CodeMismatch { code: String },
}

/// Identity and labels of a room being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    /// Room identifier, normalized on use.
    pub code: String,
    /// Display name of team A.
    pub team_a_name: String,
    /// Display name of team B.
    pub team_b_name: String,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            code: "DZ-OR".into(),
            team_a_name: "Famille A".into(),
            team_b_name: "Famille B".into(),
        }
    }
}

/// Allocate an opaque id such as `user-k3v9x0q2a`.
pub fn new_user_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LENGTH)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("{prefix}-{suffix}")
}

fn new_user(nickname: &str, is_host: bool) -> User {
    let prefix = if is_host { HOST_ID_PREFIX } else { USER_ID_PREFIX };
    User {
        id: new_user_id(prefix),
        nickname: nickname.trim().to_string(),
        team: Team::None,
        is_captain: false,
        is_host,
        score: 0,
    }
}

/// Open a room hosted by `nickname`, seeded with a fresh copy of the bank.
pub fn create_room(
    nickname: &str,
    settings: &RoomSettings,
    bank: &QuestionBank,
) -> (User, GameRoom) {
    let host = new_user(nickname, true);
    let room = GameRoom {
        code: normalize_code(&settings.code),
        state: GameState::Lobby,
        host_id: host.id.clone(),
        team_a_name: settings.team_a_name.clone(),
        team_b_name: settings.team_b_name.clone(),
        team_a_score: 0,
        team_b_score: 0,
        round_score: 0,
        strikes: 0,
        current_question_id: 1,
        active_team: Team::None,
        dice_results: IndexMap::new(),
        users: vec![host.clone()],
        active_questions: bank.reset_questions(),
    };
    (host, room)
}

/// Add a player named `nickname` to `room`, checking the code they typed.
///
/// `room` is the document found under the normalized code, if any.
pub fn join_room(
    room: Option<&GameRoom>,
    nickname: &str,
    code: &str,
) -> Result<(User, GameRoom), JoinError> {
    let code = normalize_code(code);
    let Some(room) = room else {
        return Err(JoinError::RoomNotFound { code });
    };
    if room.code != code {
        return Err(JoinError::CodeMismatch { code });
    }

    let user = new_user(nickname, false);
    let mut next = room.clone();
    next.users.push(user.clone());
    Ok((user, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (User, GameRoom) {
        create_room("Samir", &RoomSettings::default(), &QuestionBank::builtin())
    }

    #[test]
    fn ids_are_prefixed_and_distinct() {
        let first = new_user_id("user");
        let second = new_user_id("user");
        assert!(first.starts_with("user-"));
        assert_eq!(first.len(), "user-".len() + ID_SUFFIX_LENGTH);
        assert_ne!(first, second);
    }

    #[test]
    fn created_room_starts_in_lobby_with_single_host() {
        let (host, room) = open();
        assert!(host.is_host);
        assert!(host.id.starts_with("host-"));
        assert_eq!(host.team, Team::None);
        assert!(!host.is_captain);
        assert_eq!(host.score, 0);

        assert_eq!(room.code, "DZ-OR");
        assert_eq!(room.state, GameState::Lobby);
        assert_eq!(room.host_id, host.id);
        assert_eq!(room.users, vec![host]);
        assert_eq!(room.current_question_id, 1);
        assert!(room.dice_results.is_empty());
        assert_eq!((room.team_a_score, room.team_b_score), (0, 0));
        assert_eq!(room.active_questions.len(), 3);
        assert!(
            room.active_questions
                .iter()
                .flat_map(|q| &q.answers)
                .all(|a| !a.revealed)
        );
    }

    #[test]
    fn room_code_is_configurable() {
        let settings = RoomSettings {
            code: "party-42".into(),
            ..RoomSettings::default()
        };
        let (_, room) = create_room("Host", &settings, &QuestionBank::builtin());
        assert_eq!(room.code, "PARTY-42");
    }

    #[test]
    fn join_is_case_insensitive_and_appends_player() {
        let (host, room) = open();
        let (player, next) = join_room(Some(&room), " Lina ", "dz-or").unwrap();
        assert!(!player.is_host);
        assert!(player.id.starts_with("user-"));
        assert_eq!(player.nickname, "Lina");
        assert_eq!(next.users.len(), 2);
        assert_eq!(next.users[0], host);
        assert_eq!(next.users[1], player);
    }

    #[test]
    fn join_fails_without_room() {
        assert_eq!(
            join_room(None, "Lina", "dz-or"),
            Err(JoinError::RoomNotFound {
                code: "DZ-OR".into()
            })
        );
    }

    #[test]
    fn join_fails_on_code_mismatch() {
        let (_, room) = open();
        assert_eq!(
            join_room(Some(&room), "Lina", "xx-yy"),
            Err(JoinError::CodeMismatch {
                code: "XX-YY".into()
            })
        );
    }
}
