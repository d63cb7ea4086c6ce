//! Pure state-transition engine encoding the rules of a Family Feud game.
//!
//! [`RoomReducer::reduce`] takes the current [`GameRoom`] and an [`Action`] and
//! returns the complete next room together with the audio [`Cue`]s the
//! transition triggers. The input room is never mutated and malformed or
//! out-of-range actions leave the room untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use utoipa::ToSchema;

use crate::state::{
    questions::QuestionBank,
    room::{GameRoom, GameState, MAX_STRIKES, Team},
};

/// Faces of the duel die.
const DIE_FACES: std::ops::RangeInclusive<u8> = 1..=6;

/// Intents submitted by the host or players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Remove a participant from the room.
    #[serde(rename_all = "camelCase")]
    DisconnectUser { user_id: String },
    /// Move a participant to a team, optionally changing their captain flag.
    #[serde(rename_all = "camelCase")]
    JoinTeam {
        user_id: String,
        team: Team,
        #[serde(default)]
        is_captain: Option<bool>,
    },
    /// Open a new duel between the two captains.
    StartDuel,
    /// Hand the floor to a team.
    #[serde(rename_all = "camelCase")]
    SetActiveTeam { team: Team },
    /// Record a captain's duel roll.
    #[serde(rename_all = "camelCase")]
    RollDice { roller_id: String, value: u8 },
    /// Start guessing the current question.
    StartRound,
    /// Flip an answer card of the current question.
    #[serde(rename_all = "camelCase")]
    RevealAnswer { answer_id: u32 },
    /// Record a wrong guess.
    AddStrike,
    /// Give the opposing team its steal attempt.
    TriggerSteal,
    /// Bank the round score and move to the next question.
    #[serde(rename_all = "camelCase")]
    EndRound { winner_team: Team },
    /// Start over with a fresh question bank, keeping participants.
    ResetGame,
    /// Any unrecognized or malformed action.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Build an action from the `(type, payload)` pair sent by a presentation layer.
    ///
    /// Payloads that do not match the declared type degrade to [`Action::Unknown`].
    pub fn from_submission(kind: &str, payload: Value) -> Self {
        let mut fields = match payload {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                debug!(kind, payload = %other, "action payload is not an object; ignoring");
                return Action::Unknown;
            }
        };
        fields.insert("type".into(), Value::String(kind.to_string()));

        serde_json::from_value(Value::Object(fields)).unwrap_or_else(|err| {
            debug!(kind, error = %err, "malformed action payload; ignoring");
            Action::Unknown
        })
    }

    /// Wire name of the action, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::DisconnectUser { .. } => "DISCONNECT_USER",
            Action::JoinTeam { .. } => "JOIN_TEAM",
            Action::StartDuel => "START_DUEL",
            Action::SetActiveTeam { .. } => "SET_ACTIVE_TEAM",
            Action::RollDice { .. } => "ROLL_DICE",
            Action::StartRound => "START_ROUND",
            Action::RevealAnswer { .. } => "REVEAL_ANSWER",
            Action::AddStrike => "ADD_STRIKE",
            Action::TriggerSteal => "TRIGGER_STEAL",
            Action::EndRound { .. } => "END_ROUND",
            Action::ResetGame => "RESET_GAME",
            Action::Unknown => "UNKNOWN",
        }
    }
}

/// Sound cues emitted alongside transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Answer revealed or floor handed over.
    Ding,
    /// Wrong guess.
    Buzzer,
    /// Round resolved or room created.
    Tada,
    /// A captain rolled the duel die.
    DiceRoll,
}

impl Cue {
    /// Name of the sound asset.
    pub fn name(self) -> &'static str {
        match self {
            Cue::Ding => "ding",
            Cue::Buzzer => "buzzer",
            Cue::Tada => "tada",
            Cue::DiceRoll => "dice_roll",
        }
    }
}

/// Outcome of reducing one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// The complete next room.
    pub room: GameRoom,
    /// Cues to play, in emission order.
    pub cues: Vec<Cue>,
    changed: bool,
}

impl Reduction {
    /// True when the action neither changed the room nor emitted a cue.
    pub fn is_noop(&self) -> bool {
        !self.changed && self.cues.is_empty()
    }

    /// True when the next room differs from the input room.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

/// Applies actions to rooms; holds the question bank used by resets.
#[derive(Debug, Clone)]
pub struct RoomReducer {
    bank: Arc<QuestionBank>,
}

impl RoomReducer {
    /// Create a reducer resetting rooms from `bank`.
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }

    /// Template catalog backing resets.
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Compute the room following `action`.
    pub fn reduce(&self, room: &GameRoom, action: &Action) -> Reduction {
        let mut next = room.clone();
        let mut cues = Vec::new();

        match action {
            Action::DisconnectUser { user_id } => disconnect_user(&mut next, user_id),
            Action::JoinTeam {
                user_id,
                team,
                is_captain,
            } => join_team(&mut next, user_id, *team, *is_captain),
            Action::StartDuel => start_duel(&mut next),
            Action::SetActiveTeam { team } => {
                next.active_team = *team;
                cues.push(Cue::Ding);
            }
            Action::RollDice { roller_id, value } => {
                roll_dice(&mut next, roller_id, *value, &mut cues)
            }
            Action::StartRound => start_round(&mut next),
            Action::RevealAnswer { answer_id } => reveal_answer(&mut next, *answer_id, &mut cues),
            Action::AddStrike => add_strike(&mut next, &mut cues),
            Action::TriggerSteal => next.state = GameState::Steal,
            Action::EndRound { winner_team } => end_round(&mut next, *winner_team, &mut cues),
            Action::ResetGame => self.reset_game(&mut next),
            Action::Unknown => {}
        }

        let changed = next != *room;
        Reduction {
            room: next,
            cues,
            changed,
        }
    }

    fn reset_game(&self, room: &mut GameRoom) {
        room.active_questions = self.bank.reset_questions();
        room.team_a_score = 0;
        room.team_b_score = 0;
        room.current_question_id = 1;
        room.dice_results.clear();
        room.strikes = 0;
        room.round_score = 0;
        room.active_team = Team::None;
        room.state = GameState::Lobby;
    }
}

fn disconnect_user(room: &mut GameRoom, user_id: &str) {
    // The host owns the room and leaves by tearing down their session instead.
    if room.host_id == user_id {
        return;
    }
    room.users.retain(|user| user.id != user_id);
    room.dice_results.shift_remove(user_id);
}

fn join_team(room: &mut GameRoom, user_id: &str, team: Team, is_captain: Option<bool>) {
    let Some(user) = room.users.iter_mut().find(|user| user.id == user_id) else {
        return;
    };

    user.team = team;
    if let Some(flag) = is_captain {
        user.is_captain = flag;
    }

    // At most one captain per playing team: the newcomer takes over the role.
    if user.is_captain && team.is_playing() {
        for other in room
            .users
            .iter_mut()
            .filter(|other| other.id != user_id && other.team == team)
        {
            other.is_captain = false;
        }
    }

    // Only sitting captains keep a duel roll.
    let captains: Vec<String> = room
        .users
        .iter()
        .filter(|user| user.is_captain && user.team.is_playing())
        .map(|user| user.id.clone())
        .collect();
    room.dice_results.retain(|roller, _| captains.iter().any(|id| id == roller));
}

fn start_duel(room: &mut GameRoom) {
    if room.state == GameState::Finished {
        return;
    }
    room.state = GameState::Duel;
    room.dice_results.clear();
    room.active_team = Team::None;
}

fn roll_dice(room: &mut GameRoom, roller_id: &str, value: u8, cues: &mut Vec<Cue>) {
    if room.state != GameState::Duel || !DIE_FACES.contains(&value) {
        return;
    }

    let is_team_captain = room
        .user(roller_id)
        .is_some_and(|user| user.is_captain && user.team.is_playing());
    // A recorded roll stands until the next duel, ties included.
    if !is_team_captain || room.dice_results.contains_key(roller_id) {
        return;
    }

    room.dice_results.insert(roller_id.to_string(), value);
    cues.push(Cue::DiceRoll);
    resolve_duel(room);
}

fn resolve_duel(room: &mut GameRoom) {
    let all_rolled = room
        .users
        .iter()
        .filter(|user| user.is_captain && user.team.is_playing())
        .all(|captain| room.dice_results.contains_key(&captain.id));
    if !all_rolled {
        return;
    }

    let roll_of = |team| {
        room.captain_of(team)
            .and_then(|captain| room.dice_results.get(&captain.id).copied())
    };

    match (roll_of(Team::A), roll_of(Team::B)) {
        (Some(a), Some(b)) if a > b => room.active_team = Team::A,
        (Some(a), Some(b)) if b > a => room.active_team = Team::B,
        _ => {}
    }
}

fn start_round(room: &mut GameRoom) {
    if room.state == GameState::Finished {
        return;
    }
    room.state = GameState::Round;
    room.strikes = 0;
    room.round_score = 0;
}

fn reveal_answer(room: &mut GameRoom, answer_id: u32, cues: &mut Vec<Cue>) {
    let stealing = match room.state {
        GameState::Round => false,
        GameState::Steal => true,
        _ => return,
    };

    let Some(answer) = room
        .current_question_mut()
        .and_then(|question| question.answers.iter_mut().find(|a| a.id == answer_id))
    else {
        return;
    };
    if answer.revealed {
        return;
    }

    answer.revealed = true;
    let points = answer.points;
    room.round_score = room.round_score.saturating_add(points);
    cues.push(Cue::Ding);

    if stealing {
        let thief = room.active_team.opposite();
        end_round(room, thief, cues);
    }
}

fn add_strike(room: &mut GameRoom, cues: &mut Vec<Cue>) {
    let before = room.strikes;
    room.strikes = before.saturating_add(1).min(MAX_STRIKES);
    cues.push(Cue::Buzzer);

    if before < MAX_STRIKES && room.strikes == MAX_STRIKES {
        room.state = GameState::Steal;
    }
}

fn end_round(room: &mut GameRoom, winner: Team, cues: &mut Vec<Cue>) {
    if room.state == GameState::Finished {
        return;
    }

    match winner {
        Team::A => room.team_a_score = room.team_a_score.saturating_add(room.round_score),
        Team::B => room.team_b_score = room.team_b_score.saturating_add(room.round_score),
        Team::None => {}
    }

    room.current_question_id = room.current_question_id.saturating_add(1);
    room.round_score = 0;
    room.strikes = 0;
    room.active_team = Team::None;
    room.state = if room.current_question_id as usize > room.active_questions.len() {
        GameState::Finished
    } else {
        GameState::Lobby
    };
    cues.push(Cue::Tada);
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::state::room::User;

    fn user(id: &str, team: Team, is_captain: bool, is_host: bool) -> User {
        User {
            id: id.into(),
            nickname: id.into(),
            team,
            is_captain,
            is_host,
            score: 0,
        }
    }

    fn reducer() -> RoomReducer {
        RoomReducer::new(Arc::new(QuestionBank::builtin()))
    }

    fn room() -> GameRoom {
        GameRoom {
            code: "DZ-OR".into(),
            state: GameState::Lobby,
            host_id: "host".into(),
            team_a_name: "Famille A".into(),
            team_b_name: "Famille B".into(),
            team_a_score: 0,
            team_b_score: 0,
            round_score: 0,
            strikes: 0,
            current_question_id: 1,
            active_team: Team::None,
            dice_results: IndexMap::new(),
            users: vec![
                user("host", Team::None, false, true),
                user("cap-a", Team::A, true, false),
                user("cap-b", Team::B, true, false),
                user("player", Team::A, false, false),
            ],
            active_questions: QuestionBank::builtin().reset_questions(),
        }
    }

    fn apply(room: &GameRoom, action: Action) -> GameRoom {
        reducer().reduce(room, &action).room
    }

    fn apply_all(room: &GameRoom, actions: impl IntoIterator<Item = Action>) -> GameRoom {
        let reducer = reducer();
        actions
            .into_iter()
            .fold(room.clone(), |room, action| reducer.reduce(&room, &action).room)
    }

    fn in_round(active: Team) -> GameRoom {
        let mut room = apply(&room(), Action::StartRound);
        room.active_team = active;
        room
    }

    fn duel() -> GameRoom {
        apply(&room(), Action::StartDuel)
    }

    fn roll(roller: &str, value: u8) -> Action {
        Action::RollDice {
            roller_id: roller.into(),
            value,
        }
    }

    fn reveal(answer_id: u32) -> Action {
        Action::RevealAnswer { answer_id }
    }

    #[test]
    fn unknown_action_leaves_room_untouched() {
        let before = in_round(Team::A);
        let reduction = reducer().reduce(&before, &Action::Unknown);
        assert_eq!(reduction.room, before);
        assert!(reduction.is_noop());
    }

    #[test]
    fn unrecognized_wire_type_parses_as_unknown() {
        let action: Action = serde_json::from_value(json!({"type": "NOT_A_REAL_ACTION"})).unwrap();
        assert_eq!(action, Action::Unknown);
        assert_eq!(
            Action::from_submission("NOT_A_REAL_ACTION", json!({})),
            Action::Unknown
        );
    }

    #[test]
    fn submission_parses_payload_fields() {
        assert_eq!(
            Action::from_submission(
                "JOIN_TEAM",
                json!({"userId": "u1", "team": "B", "isCaptain": true})
            ),
            Action::JoinTeam {
                user_id: "u1".into(),
                team: Team::B,
                is_captain: Some(true),
            }
        );
        assert_eq!(
            Action::from_submission("ROLL_DICE", json!({"rollerId": "c", "value": 4})),
            roll("c", 4)
        );
        assert_eq!(Action::from_submission("ADD_STRIKE", Value::Null), Action::AddStrike);
        assert_eq!(
            Action::from_submission("END_ROUND", json!({"winnerTeam": "NONE"})),
            Action::EndRound {
                winner_team: Team::None
            }
        );
    }

    #[test]
    fn malformed_payload_degrades_to_unknown() {
        assert_eq!(
            Action::from_submission("REVEAL_ANSWER", json!({"answerId": "three"})),
            Action::Unknown
        );
        assert_eq!(
            Action::from_submission("ROLL_DICE", json!({"rollerId": "c"})),
            Action::Unknown
        );
        assert_eq!(Action::from_submission("START_DUEL", json!(42)), Action::Unknown);
    }

    #[test]
    fn reduce_does_not_mutate_input() {
        let before = in_round(Team::A);
        let snapshot = before.clone();
        let _ = reducer().reduce(&before, &reveal(1));
        assert_eq!(before, snapshot);
    }

    #[test]
    fn disconnect_removes_user_and_their_roll() {
        let mut room = duel();
        room.dice_results.insert("cap-a".into(), 4);
        let next = apply(
            &room,
            Action::DisconnectUser {
                user_id: "cap-a".into(),
            },
        );
        assert!(next.user("cap-a").is_none());
        assert!(!next.dice_results.contains_key("cap-a"));
        assert_eq!(next.users.len(), 3);
    }

    #[test]
    fn disconnect_keeps_the_host() {
        let before = room();
        let next = apply(
            &before,
            Action::DisconnectUser {
                user_id: "host".into(),
            },
        );
        assert_eq!(next, before);
    }

    #[test]
    fn join_team_keeps_captain_flag_when_absent() {
        let next = apply(
            &room(),
            Action::JoinTeam {
                user_id: "cap-a".into(),
                team: Team::A,
                is_captain: None,
            },
        );
        assert!(next.user("cap-a").unwrap().is_captain);
    }

    #[test]
    fn new_captain_demotes_previous_one() {
        let next = apply(
            &room(),
            Action::JoinTeam {
                user_id: "player".into(),
                team: Team::A,
                is_captain: Some(true),
            },
        );
        assert!(next.user("player").unwrap().is_captain);
        assert!(!next.user("cap-a").unwrap().is_captain);
        assert!(next.user("cap-b").unwrap().is_captain);
        assert_eq!(next.captain_of(Team::A).unwrap().id, "player");
    }

    #[test]
    fn captain_switching_teams_takes_over_the_new_team() {
        let next = apply(
            &room(),
            Action::JoinTeam {
                user_id: "cap-a".into(),
                team: Team::B,
                is_captain: None,
            },
        );
        assert_eq!(next.captain_of(Team::B).unwrap().id, "cap-a");
        assert!(!next.user("cap-b").unwrap().is_captain);
        assert!(next.captain_of(Team::A).is_none());
    }

    #[test]
    fn demoted_captain_loses_their_roll() {
        let rolled = apply(&duel(), roll("cap-a", 5));
        assert_eq!(rolled.dice_results.get("cap-a"), Some(&5));

        let next = apply(
            &rolled,
            Action::JoinTeam {
                user_id: "player".into(),
                team: Team::A,
                is_captain: Some(true),
            },
        );
        assert!(!next.user("cap-a").unwrap().is_captain);
        assert!(next.dice_results.is_empty());
        assert!(next.dice_results.keys().all(|id| {
            next.user(id)
                .is_some_and(|user| user.is_captain && user.team.is_playing())
        }));
    }

    #[test]
    fn captain_leaving_for_spectators_drops_their_roll() {
        let rolled = apply(&duel(), roll("cap-a", 4));
        let next = apply(
            &rolled,
            Action::JoinTeam {
                user_id: "cap-a".into(),
                team: Team::None,
                is_captain: None,
            },
        );
        assert!(!next.dice_results.contains_key("cap-a"));

        let stays = apply(
            &rolled,
            Action::JoinTeam {
                user_id: "player".into(),
                team: Team::B,
                is_captain: None,
            },
        );
        assert_eq!(stays.dice_results.get("cap-a"), Some(&4));
    }

    #[test]
    fn start_duel_clears_previous_duel() {
        let mut room = room();
        room.dice_results.insert("cap-a".into(), 2);
        room.active_team = Team::A;
        let next = apply(&room, Action::StartDuel);
        assert_eq!(next.state, GameState::Duel);
        assert!(next.dice_results.is_empty());
        assert_eq!(next.active_team, Team::None);
    }

    #[test]
    fn set_active_team_chimes() {
        let reduction = reducer().reduce(&room(), &Action::SetActiveTeam { team: Team::B });
        assert_eq!(reduction.room.active_team, Team::B);
        assert_eq!(reduction.cues, vec![Cue::Ding]);
    }

    #[test]
    fn higher_roll_wins_the_floor() {
        let next = apply_all(&duel(), [roll("cap-a", 3), roll("cap-b", 5)]);
        assert_eq!(next.active_team, Team::B);

        let next = apply_all(&duel(), [roll("cap-b", 2), roll("cap-a", 6)]);
        assert_eq!(next.active_team, Team::A);
    }

    #[test]
    fn single_roll_does_not_resolve() {
        let reduction = reducer().reduce(&duel(), &roll("cap-a", 6));
        assert_eq!(reduction.room.dice_results.get("cap-a"), Some(&6));
        assert_eq!(reduction.room.active_team, Team::None);
        assert_eq!(reduction.cues, vec![Cue::DiceRoll]);
    }

    #[test]
    fn tie_keeps_floor_open_until_new_duel() {
        let tied = apply_all(&duel(), [roll("cap-a", 4), roll("cap-b", 4)]);
        assert_eq!(tied.active_team, Team::None);
        assert_eq!(tied.dice_results.len(), 2);

        let rerolled = apply(&tied, roll("cap-a", 6));
        assert_eq!(rerolled, tied);

        let fresh = apply_all(&tied, [Action::StartDuel, roll("cap-a", 6), roll("cap-b", 1)]);
        assert_eq!(fresh.active_team, Team::A);
    }

    #[test]
    fn invalid_rolls_are_ignored() {
        let duel = duel();
        assert_eq!(apply(&duel, roll("cap-a", 0)), duel);
        assert_eq!(apply(&duel, roll("cap-a", 7)), duel);
        assert_eq!(apply(&duel, roll("player", 3)), duel);
        assert_eq!(apply(&duel, roll("ghost", 3)), duel);
        assert_eq!(apply(&room(), roll("cap-a", 3)), room());
    }

    #[test]
    fn start_round_resets_counters() {
        let mut room = room();
        room.strikes = 2;
        room.round_score = 40;
        let next = apply(&room, Action::StartRound);
        assert_eq!(next.state, GameState::Round);
        assert_eq!(next.strikes, 0);
        assert_eq!(next.round_score, 0);
    }

    #[test]
    fn reveal_adds_points_once() {
        let room = in_round(Team::A);
        let reduction = reducer().reduce(&room, &reveal(2));
        assert_eq!(reduction.room.round_score, 25);
        assert_eq!(reduction.cues, vec![Cue::Ding]);
        assert!(reduction.room.current_question().unwrap().answers[1].revealed);

        let again = reducer().reduce(&reduction.room, &reveal(2));
        assert_eq!(again.room.round_score, 25);
        assert!(again.is_noop());
    }

    #[test]
    fn reveal_ignores_unknown_answer_and_idle_phases() {
        let round = in_round(Team::A);
        assert_eq!(apply(&round, reveal(99)), round);
        assert_eq!(apply(&room(), reveal(1)), room());
    }

    #[test]
    fn reveal_only_touches_current_question() {
        let next = apply(&in_round(Team::A), reveal(1));
        assert!(next.active_questions[0].answers[0].revealed);
        assert!(!next.active_questions[1].answers[0].revealed);
    }

    #[test]
    fn strikes_are_capped_and_trigger_steal() {
        let mut room = in_round(Team::A);
        room.strikes = 2;
        let reduction = reducer().reduce(&room, &Action::AddStrike);
        assert_eq!(reduction.room.strikes, 3);
        assert_eq!(reduction.room.state, GameState::Steal);
        assert_eq!(reduction.cues, vec![Cue::Buzzer]);

        let next = apply(&reduction.room, Action::AddStrike);
        assert_eq!(next.strikes, 3);
        assert_eq!(next.state, GameState::Steal);
    }

    #[test]
    fn manual_steal_ignores_strike_count() {
        let next = apply(&in_round(Team::B), Action::TriggerSteal);
        assert_eq!(next.state, GameState::Steal);
        assert_eq!(next.strikes, 0);
    }

    #[test]
    fn end_round_banks_score_for_winner() {
        let mut room = in_round(Team::A);
        room.round_score = 70;
        let reduction = reducer().reduce(
            &room,
            &Action::EndRound {
                winner_team: Team::A,
            },
        );
        let next = reduction.room;
        assert_eq!(next.team_a_score, 70);
        assert_eq!(next.team_b_score, 0);
        assert_eq!(next.state, GameState::Lobby);
        assert_eq!(next.current_question_id, 2);
        assert_eq!(next.round_score, 0);
        assert_eq!(next.strikes, 0);
        assert_eq!(next.active_team, Team::None);
        assert_eq!(reduction.cues, vec![Cue::Tada]);
    }

    #[test]
    fn end_round_without_winner_still_advances() {
        let mut room = in_round(Team::A);
        room.round_score = 30;
        let next = apply(
            &room,
            Action::EndRound {
                winner_team: Team::None,
            },
        );
        assert_eq!(next.team_a_score + next.team_b_score, 0);
        assert_eq!(next.current_question_id, 2);
    }

    #[test]
    fn last_round_finishes_the_game() {
        let mut room = in_round(Team::B);
        room.current_question_id = 3;
        let next = apply(
            &room,
            Action::EndRound {
                winner_team: Team::B,
            },
        );
        assert_eq!(next.current_question_id, 4);
        assert_eq!(next.state, GameState::Finished);

        assert_eq!(apply(&next, Action::StartDuel), next);
        assert_eq!(apply(&next, Action::StartRound), next);
        assert_eq!(
            apply(
                &next,
                Action::EndRound {
                    winner_team: Team::A
                }
            ),
            next
        );
    }

    #[test]
    fn end_round_saturates_question_counter() {
        let mut room = in_round(Team::A);
        room.current_question_id = u32::MAX;
        let next = apply(
            &room,
            Action::EndRound {
                winner_team: Team::A,
            },
        );
        assert_eq!(next.current_question_id, u32::MAX);
        assert_eq!(next.state, GameState::Finished);
    }

    #[test]
    fn reset_restores_a_fresh_game() {
        let played = apply_all(
            &in_round(Team::A),
            [
                reveal(1),
                reveal(3),
                Action::EndRound {
                    winner_team: Team::A,
                },
                Action::StartRound,
                reveal(2),
                Action::AddStrike,
            ],
        );
        assert_eq!(played.team_a_score, 60);

        let mut played = played;
        played.dice_results.insert("cap-a".into(), 3);
        let next = apply(&played, Action::ResetGame);
        assert!(next
            .active_questions
            .iter()
            .flat_map(|question| &question.answers)
            .all(|answer| !answer.revealed));
        assert_eq!(next.team_a_score, 0);
        assert_eq!(next.team_b_score, 0);
        assert_eq!(next.current_question_id, 1);
        assert_eq!(next.strikes, 0);
        assert_eq!(next.round_score, 0);
        assert_eq!(next.state, GameState::Lobby);
        assert!(next.dice_results.is_empty());
        assert_eq!(next.users, played.users);
    }

    #[test]
    fn happy_path_with_successful_steal() {
        let reducer = reducer();
        let mut room = room();
        assert_eq!(room.current_question_id, 1);
        assert_eq!(room.state, GameState::Lobby);

        for action in [Action::StartDuel, roll("cap-a", 3), roll("cap-b", 5)] {
            room = reducer.reduce(&room, &action).room;
        }
        assert_eq!(room.active_team, Team::B);

        room = reducer.reduce(&room, &Action::StartRound).room;
        assert_eq!((room.strikes, room.round_score), (0, 0));

        room = reducer.reduce(&room, &reveal(1)).room;
        assert_eq!(room.round_score, 45);

        for _ in 0..3 {
            room = reducer.reduce(&room, &Action::AddStrike).room;
        }
        assert_eq!(room.state, GameState::Steal);

        let reduction = reducer.reduce(&room, &reveal(2));
        assert_eq!(reduction.cues, vec![Cue::Ding, Cue::Tada]);
        let room = reduction.room;
        assert_eq!(room.team_a_score, 70);
        assert_eq!(room.team_b_score, 0);
        assert_eq!(room.state, GameState::Lobby);
        assert_eq!(room.current_question_id, 2);
        assert_eq!(room.round_score, 0);
    }

    proptest! {
        #[test]
        fn strikes_never_exceed_cap(count in 3usize..20) {
            let room = apply_all(&in_round(Team::A), std::iter::repeat_n(Action::AddStrike, count));
            prop_assert_eq!(room.strikes, MAX_STRIKES);
            prop_assert_eq!(room.state, GameState::Steal);
        }

        #[test]
        fn round_score_sums_revealed_points(
            start in 0u32..500,
            ids in proptest::sample::subsequence(vec![1u32, 2, 3, 4, 5], 0..=5),
        ) {
            let mut room = in_round(Team::A);
            room.round_score = start;
            let expected: u32 = room.active_questions[0]
                .answers
                .iter()
                .filter(|answer| ids.contains(&answer.id))
                .map(|answer| answer.points)
                .sum();
            let room = apply_all(&room, ids.iter().map(|&id| reveal(id)));
            prop_assert_eq!(room.round_score, start + expected);
        }

        #[test]
        fn end_round_always_advances_by_one(winner in prop_oneof![Just(Team::A), Just(Team::B), Just(Team::None)]) {
            let room = in_round(Team::A);
            let next = apply(&room, Action::EndRound { winner_team: winner });
            prop_assert_eq!(next.current_question_id, room.current_question_id + 1);
        }

        #[test]
        fn distinct_rolls_pick_the_higher_team(a in 1u8..=6, b in 1u8..=6) {
            let room = apply_all(&duel(), [roll("cap-a", a), roll("cap-b", b)]);
            let expected = match a.cmp(&b) {
                std::cmp::Ordering::Greater => Team::A,
                std::cmp::Ordering::Less => Team::B,
                std::cmp::Ordering::Equal => Team::None,
            };
            prop_assert_eq!(room.active_team, expected);
        }
    }
}
