//! Application-level configuration loading, including engine tuning and seed data.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::models::QUESTIONS_PER_MATCH;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_DUEL_CONFIG_PATH";
/// Bounded time given to the slower player once the faster one finishes.
const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(10);
/// Period of the finisher sweep.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Grace window armed when the first player completes the question set.
    pub grace_window: Duration,
    /// Period between finisher sweeps.
    pub sweep_interval: Duration,
    /// Questions bound to every match at pairing time.
    pub questions_per_match: usize,
    /// Seeded trivia questions loaded into the in-memory catalog.
    pub questions: Vec<SeedQuestion>,
    /// Seeded accounts for the in-memory user directory; empty means every
    /// user id is accepted.
    pub users: Vec<SeedUser>,
}

/// Question seed entry from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuestion {
    /// Question text shown to players.
    pub body: String,
    /// Answers counted as correct.
    pub accepted_answers: Vec<String>,
    /// Whether the question is eligible for matches.
    #[serde(default = "default_published")]
    pub published: bool,
}

/// Account seed entry from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    /// Stable identifier, referenced by connect/answer calls.
    pub id: Uuid,
    /// Name shown on leaderboards and match views.
    pub display_name: String,
}

fn default_published() -> bool {
    true
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        questions = config.questions.len(),
                        users = config.users.len(),
                        "loaded configuration"
                    );
                    config
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
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grace_window: DEFAULT_GRACE_WINDOW,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            questions_per_match: QUESTIONS_PER_MATCH,
            questions: default_questions(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    grace_window_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    questions_per_match: Option<usize>,
    #[serde(default)]
    questions: Vec<SeedQuestion>,
    #[serde(default)]
    users: Vec<SeedUser>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            grace_window: raw
                .grace_window_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GRACE_WINDOW),
            sweep_interval: raw
                .sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            questions_per_match: raw
                .questions_per_match
                .filter(|count| *count > 0)
                .unwrap_or(QUESTIONS_PER_MATCH),
            questions: if raw.questions.is_empty() {
                defaults.questions
            } else {
                raw.questions
            },
            users: raw.users,
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

/// Built-in question set shipped with the binary so the engine works out of the box.
fn default_questions() -> Vec<SeedQuestion> {
    let entries: [(&str, &[&str]); 8] = [
        ("What is the capital of France?", &["Paris"]),
        ("How many continents are there?", &["7", "seven"]),
        ("What is the chemical symbol for gold?", &["Au"]),
        (
            "Which planet is known as the Red Planet?",
            &["Mars"],
        ),
        ("What is the largest ocean on Earth?", &["Pacific", "Pacific Ocean"]),
        ("In which year did World War II end?", &["1945"]),
        ("What is the square root of 144?", &["12", "twelve"]),
        (
            "Who painted the Mona Lisa?",
            &["Leonardo da Vinci", "da Vinci", "Leonardo"],
        ),
    ];

    entries
        .into_iter()
        .map(|(body, answers)| SeedQuestion {
            body: body.to_string(),
            accepted_answers: answers.iter().map(|answer| answer.to_string()).collect(),
            published: true,
        })
        .collect()
}
