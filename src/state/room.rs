use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Phases a room moves through during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// Between rounds; players pick teams and captains.
    Lobby,
    /// Captains roll dice to win the floor.
    Duel,
    /// The team holding the floor guesses answers.
    Round,
    /// The opposing team gets a single guess to steal the round.
    Steal,
    /// Every question has been played.
    Finished,
}

/// One of the two competing families, or no team at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Team {
    /// First family.
    A,
    /// Second family.
    B,
    /// Spectator / unassigned sentinel. Never a scoring target.
    #[serde(rename = "NONE", other)]
    None,
}

impl Team {
    /// The team facing this one. `None` has no opponent.
    pub fn opposite(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
            Team::None => Team::None,
        }
    }

    /// Whether the team can hold the floor and score points.
    pub fn is_playing(self) -> bool {
        !matches!(self, Team::None)
    }
}

/// A ranked answer of a survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Identifier, unique within its question.
    pub id: u32,
    /// Text shown on the board once revealed.
    pub text: String,
    /// Points banked into the round score when revealed.
    pub points: u32,
    /// Whether the card has been flipped.
    pub revealed: bool,
}

/// A survey question with its ranked answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier; also defines the play order (1-based).
    pub id: u32,
    /// Short category label.
    pub theme: String,
    /// The question read out by the host.
    pub question_text: String,
    /// Answers ranked by points, highest first.
    pub answers: Vec<Answer>,
}

/// A participant connected to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque identifier, unique within the room.
    pub id: String,
    /// Display name chosen on the lobby screen.
    pub nickname: String,
    /// Team the user plays for.
    pub team: Team,
    /// Whether the user rolls the duel die for their team.
    pub is_captain: bool,
    /// Whether the user drives the game.
    pub is_host: bool,
    /// Reserved for a per-player scoring mode; no transition mutates it.
    pub score: i32,
}

/// Authoritative state of a room, replicated wholesale to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameRoom {
    /// Upper-case room identifier.
    pub code: String,
    /// Current phase.
    pub state: GameState,
    /// Identifier of the hosting user.
    pub host_id: String,
    /// Display name of team A.
    pub team_a_name: String,
    /// Display name of team B.
    pub team_b_name: String,
    /// Points banked by team A.
    pub team_a_score: u32,
    /// Points banked by team B.
    pub team_b_score: u32,
    /// Points accumulated in the current round, not yet banked.
    pub round_score: u32,
    /// Wrong guesses in the current round, capped at [`MAX_STRIKES`].
    pub strikes: u8,
    /// Identifier of the question being played.
    pub current_question_id: u32,
    /// Team holding the floor.
    pub active_team: Team,
    /// Duel rolls keyed by captain id.
    #[schema(value_type = std::collections::HashMap<String, u8>)]
    pub dice_results: IndexMap<String, u8>,
    /// Participants in join order.
    pub users: Vec<User>,
    /// Room-local copy of the question bank with evolving reveal flags.
    pub active_questions: Vec<Question>,
}

/// Number of strikes that hands the round over to the opposing team.
pub const MAX_STRIKES: u8 = 3;

impl GameRoom {
    /// Question currently on the board, if the pointer is still in range.
    pub fn current_question(&self) -> Option<&Question> {
        self.active_questions
            .iter()
            .find(|question| question.id == self.current_question_id)
    }

    /// Mutable access to the question currently on the board.
    pub fn current_question_mut(&mut self) -> Option<&mut Question> {
        let id = self.current_question_id;
        self.active_questions
            .iter_mut()
            .find(|question| question.id == id)
    }

    /// Look up a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// The hosting user.
    pub fn host(&self) -> Option<&User> {
        self.user(&self.host_id)
    }

    /// Captain of the given team, if one has been designated.
    pub fn captain_of(&self, team: Team) -> Option<&User> {
        if !team.is_playing() {
            return None;
        }
        self.users
            .iter()
            .find(|user| user.is_captain && user.team == team)
    }
}

/// Canonicalize a room code: surrounding whitespace is dropped and letters are upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
