//! Application-level configuration loading, including the room identity and question catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    questions::QuestionBank,
    room::{Answer, Question},
    session::RoomSettings,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FEUD_BACK_CONFIG_PATH";
/// Environment variable selecting the room store backend.
const STORE_ENV: &str = "FEUD_STORE";

const DEFAULT_STEAL_COUNTDOWN_SECS: u64 = 30;
const DEFAULT_SESSION_DIR: &str = "data/session";
const DEFAULT_COUCH_POLL_INTERVAL_MS: u64 = 500;

/// Backend holding the shared room documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process store; the room is also mirrored into the local session slots.
    #[default]
    Memory,
    /// CouchDB database configured through `COUCH_*` variables.
    Couch,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "couch" | "couchdb" => Ok(StoreKind::Couch),
            other => Err(format!("unknown store `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    room: RoomSettings,
    steal_countdown_secs: u64,
    session_dir: PathBuf,
    couch_poll_interval: Duration,
    store: StoreKind,
    questions: Arc<QuestionBank>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        code = %app_config.room.code,
                        questions = app_config.questions.len(),
                        "loaded room configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_store_from_env()
    }

    /// Parse the JSON configuration format.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    fn with_store_from_env(mut self) -> Self {
        if let Ok(value) = env::var(STORE_ENV) {
            match value.parse() {
                Ok(store) => self.store = store,
                Err(err) => warn!(var = STORE_ENV, error = %err, "ignoring store override"),
            }
        }
        self
    }

    /// Identity of the rooms created by this process.
    pub fn room_settings(&self) -> &RoomSettings {
        &self.room
    }

    /// Length of the presentational steal countdown.
    pub fn steal_countdown_secs(&self) -> u64 {
        self.steal_countdown_secs
    }

    /// Directory holding the session slots.
    pub fn session_dir(&self) -> &PathBuf {
        &self.session_dir
    }

    /// Interval between CouchDB revision polls.
    pub fn couch_poll_interval(&self) -> Duration {
        self.couch_poll_interval
    }

    /// Configured room store backend.
    pub fn store(&self) -> StoreKind {
        self.store
    }

    /// Catalog rooms are seeded and reset from.
    pub fn questions(&self) -> Arc<QuestionBank> {
        self.questions.clone()
    }

    /// Use a different store backend.
    pub fn with_store(mut self, store: StoreKind) -> Self {
        self.store = store;
        self
    }

    /// Keep session slots under `dir`.
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room: RoomSettings::default(),
            steal_countdown_secs: DEFAULT_STEAL_COUNTDOWN_SECS,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            couch_poll_interval: Duration::from_millis(DEFAULT_COUCH_POLL_INTERVAL_MS),
            store: StoreKind::default(),
            questions: Arc::new(QuestionBank::builtin()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    room_code: Option<String>,
    team_a_name: Option<String>,
    team_b_name: Option<String>,
    steal_countdown_secs: Option<u64>,
    session_dir: Option<PathBuf>,
    couch_poll_interval_ms: Option<u64>,
    store: Option<StoreKind>,
    questions: Option<Vec<RawQuestion>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let room = RoomSettings {
            code: value.room_code.unwrap_or(defaults.room.code),
            team_a_name: value.team_a_name.unwrap_or(defaults.room.team_a_name),
            team_b_name: value.team_b_name.unwrap_or(defaults.room.team_b_name),
        };

        let questions = match value.questions {
            Some(raw) => {
                let questions = raw.into_iter().map(Into::into).collect();
                match QuestionBank::new(questions) {
                    Ok(bank) => Arc::new(bank),
                    Err(err) => {
                        warn!(error = %err, "invalid question catalog; using built-in questions");
                        defaults.questions
                    }
                }
            }
            None => defaults.questions,
        };

        Self {
            room,
            steal_countdown_secs: value
                .steal_countdown_secs
                .unwrap_or(defaults.steal_countdown_secs),
            session_dir: value.session_dir.unwrap_or(defaults.session_dir),
            couch_poll_interval: value
                .couch_poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.couch_poll_interval),
            store: value.store.unwrap_or(defaults.store),
            questions,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single survey question inside the configuration file.
struct RawQuestion {
    id: u32,
    theme: String,
    question: String,
    answers: Vec<RawAnswer>,
}

#[derive(Debug, Deserialize)]
/// Answers are numbered from 1 in the order they are listed.
struct RawAnswer {
    text: String,
    points: u32,
}

impl From<RawQuestion> for Question {
    fn from(value: RawQuestion) -> Self {
        Self {
            id: value.id,
            theme: value.theme,
            question_text: value.question,
            answers: value
                .answers
                .into_iter()
                .zip(1..)
                .map(|(answer, id)| Answer {
                    id,
                    text: answer.text,
                    points: answer.points,
                    revealed: false,
                })
                .collect(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.room_settings(), &RoomSettings::default());
        assert_eq!(config.steal_countdown_secs(), 30);
        assert_eq!(config.session_dir(), &PathBuf::from("data/session"));
        assert_eq!(config.couch_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.store(), StoreKind::Memory);
        assert_eq!(config.questions().len(), 3);
    }

    #[test]
    fn overrides_room_identity_and_timings() {
        let config = AppConfig::from_json(
            r#"{
                "room_code": "SALLE-2",
                "team_a_name": "Les Bleus",
                "steal_countdown_secs": 45,
                "couch_poll_interval_ms": 250,
                "store": "couch"
            }"#,
        )
        .unwrap();
        assert_eq!(config.room_settings().code, "SALLE-2");
        assert_eq!(config.room_settings().team_a_name, "Les Bleus");
        assert_eq!(config.room_settings().team_b_name, "Famille B");
        assert_eq!(config.steal_countdown_secs(), 45);
        assert_eq!(config.couch_poll_interval(), Duration::from_millis(250));
        assert_eq!(config.store(), StoreKind::Couch);
    }

    #[test]
    fn custom_questions_replace_the_catalog() {
        let config = AppConfig::from_json(
            r#"{
                "questions": [
                    {"id": 1, "theme": "Sport", "question": "Un sport d'équipe ?",
                     "answers": [{"text": "Football", "points": 60}, {"text": "Handball", "points": 40}]}
                ]
            }"#,
        )
        .unwrap();
        let bank = config.questions();
        assert_eq!(bank.len(), 1);
        let question = &bank.questions()[0];
        assert_eq!(question.question_text, "Un sport d'équipe ?");
        assert_eq!(question.answers[1].id, 2);
        assert_eq!(question.answers[1].points, 40);
    }

    #[test]
    fn invalid_questions_fall_back_to_builtin() {
        let config = AppConfig::from_json(
            r#"{"questions": [{"id": 2, "theme": "x", "question": "y", "answers": []}]}"#,
        )
        .unwrap();
        assert_eq!(config.questions().len(), 3);
    }

    #[test]
    fn store_kind_parses_aliases() {
        assert_eq!("memory".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert_eq!(" CouchDB ".parse::<StoreKind>(), Ok(StoreKind::Couch));
        assert!("redis".parse::<StoreKind>().is_err());
    }
}
