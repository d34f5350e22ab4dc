//! Run configuration.
//!
//! Layers, later wins: built-in defaults, an optional TOML file, the
//! `DEBATE_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use coordination::debate::{DebateConfig, TurnPolicy, DEFAULT_TOTAL_ROUNDS, MAX_TOTAL_ROUNDS};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_ROUNDS: &str = "DEBATE_ROUNDS";
pub const ENV_SEED: &str = "DEBATE_SEED";
pub const ENV_LOG_PATH: &str = "DEBATE_LOG_PATH";
pub const ENV_PERSONAS: &str = "DEBATE_PERSONAS";

/// Configuration problems. The binary exits with code 2 on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings as they may appear in a TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rounds: Option<u32>,
    pub participants: Option<Vec<String>>,
    pub personas: Option<Vec<String>>,
    pub policy: Option<String>,
    pub seed: Option<u64>,
    pub log_path: Option<PathBuf>,
    pub persona_dir: Option<PathBuf>,
    pub context_window: Option<usize>,
    pub max_turn_retries: Option<u32>,
    pub topic: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Overrides from the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rounds: Option<u32>,
    pub participants: Option<String>,
    pub personas: Option<String>,
    pub policy: Option<String>,
    pub seed: Option<u64>,
    pub log_path: Option<PathBuf>,
    pub persona_dir: Option<PathBuf>,
    pub context_window: Option<usize>,
    pub max_turn_retries: Option<u32>,
    pub topic: Option<String>,
    pub checkpoint: Option<PathBuf>,
    pub resume: Option<PathBuf>,
}

/// Fully resolved settings for one debate run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub rounds: u32,
    pub participants: [String; 2],
    pub personas: [String; 2],
    pub policy: TurnPolicy,
    pub seed: Option<u64>,
    /// `None` means a timestamped file in the working directory.
    pub log_path: Option<PathBuf>,
    pub persona_dir: Option<PathBuf>,
    pub context_window: usize,
    pub max_turn_retries: u32,
    /// Skip the interactive prompt.
    pub topic: Option<String>,
    /// Where to save a checkpoint if the run is interrupted.
    pub checkpoint: Option<PathBuf>,
    /// Checkpoint to resume from instead of starting fresh.
    pub resume: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let debate = DebateConfig::default();
        Self {
            rounds: DEFAULT_TOTAL_ROUNDS,
            participants: [
                debate.participants[0].to_string(),
                debate.participants[1].to_string(),
            ],
            personas: ["scientist".to_string(), "philosopher".to_string()],
            policy: debate.policy,
            seed: None,
            log_path: None,
            persona_dir: None,
            context_window: debate.context_window,
            max_turn_retries: debate.max_turn_retries,
            topic: None,
            checkpoint: None,
            resume: None,
        }
    }
}

impl RunConfig {
    /// Resolve every layer and validate the result.
    pub fn resolve(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = file {
            config.apply_file(FileConfig::load(path)?)?;
        }
        config.apply_env(env)?;
        config.apply_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// [`resolve`](Self::resolve) against the process environment.
    pub fn from_process(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(rounds) = file.rounds {
            self.rounds = rounds;
        }
        if let Some(ids) = file.participants {
            self.participants = pair("participants", ids)?;
        }
        if let Some(personas) = file.personas {
            self.personas = pair("personas", personas)?;
        }
        if let Some(policy) = file.policy {
            self.policy = parse_policy(&policy)?;
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        if file.log_path.is_some() {
            self.log_path = file.log_path;
        }
        if file.persona_dir.is_some() {
            self.persona_dir = file.persona_dir;
        }
        if let Some(window) = file.context_window {
            self.context_window = window;
        }
        if let Some(retries) = file.max_turn_retries {
            self.max_turn_retries = retries;
        }
        if file.topic.is_some() {
            self.topic = file.topic;
        }
        Ok(())
    }

    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = env(ENV_ROUNDS) {
            self.rounds = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_ROUNDS,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = env(ENV_SEED) {
            let seed = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_SEED,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
            self.seed = Some(seed);
        }
        if let Some(raw) = env(ENV_LOG_PATH).filter(|p| !p.trim().is_empty()) {
            self.log_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = env(ENV_PERSONAS) {
            self.personas = parse_pair(ENV_PERSONAS, &raw)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, o: &Overrides) -> Result<(), ConfigError> {
        if let Some(rounds) = o.rounds {
            self.rounds = rounds;
        }
        if let Some(raw) = &o.participants {
            self.participants = parse_pair("--participants", raw)?;
        }
        if let Some(raw) = &o.personas {
            self.personas = parse_pair("--persona-config", raw)?;
        }
        if let Some(raw) = &o.policy {
            self.policy = parse_policy(raw)?;
        }
        if o.seed.is_some() {
            self.seed = o.seed;
        }
        if o.log_path.is_some() {
            self.log_path = o.log_path.clone();
        }
        if o.persona_dir.is_some() {
            self.persona_dir = o.persona_dir.clone();
        }
        if let Some(window) = o.context_window {
            self.context_window = window;
        }
        if let Some(retries) = o.max_turn_retries {
            self.max_turn_retries = retries;
        }
        if o.topic.is_some() {
            self.topic = o.topic.clone();
        }
        if o.checkpoint.is_some() {
            self.checkpoint = o.checkpoint.clone();
        }
        if o.resume.is_some() {
            self.resume = o.resume.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::Invalid("rounds must be at least 1".into()));
        }
        if self.rounds > MAX_TOTAL_ROUNDS {
            return Err(ConfigError::Invalid(format!(
                "rounds must be at most {MAX_TOTAL_ROUNDS}, got {}",
                self.rounds
            )));
        }
        if self.participants[0] == self.participants[1] {
            return Err(ConfigError::Invalid(format!(
                "participants must differ, both are {:?}",
                self.participants[0]
            )));
        }
        Ok(())
    }

    /// Settings handed to the orchestrator.
    pub fn debate_config(&self) -> DebateConfig {
        DebateConfig {
            participants: [
                self.participants[0].as_str().into(),
                self.participants[1].as_str().into(),
            ],
            total_rounds: self.rounds,
            policy: self.policy.clone(),
            context_window: self.context_window,
            max_turn_retries: self.max_turn_retries,
        }
    }
}

fn pair(key: &'static str, items: Vec<String>) -> Result<[String; 2], ConfigError> {
    let items: Vec<String> = items.into_iter().map(|s| s.trim().to_string()).collect();
    match <[String; 2]>::try_from(items) {
        Ok(pair) if pair.iter().all(|s| !s.is_empty()) => Ok(pair),
        Ok(pair) => Err(ConfigError::InvalidValue {
            key,
            value: pair.join(","),
            reason: "entries must not be empty".into(),
        }),
        Err(items) => Err(ConfigError::InvalidValue {
            key,
            value: items.join(","),
            reason: format!("must specify exactly 2 entries, got {}", items.len()),
        }),
    }
}

fn parse_pair(key: &'static str, raw: &str) -> Result<[String; 2], ConfigError> {
    pair(key, raw.split(',').map(str::to_string).collect())
}

fn parse_policy(raw: &str) -> Result<TurnPolicy, ConfigError> {
    TurnPolicy::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
        key: "policy",
        value: raw.to_string(),
        reason: "expected alternating, second-opens, or a seat pattern like ABBA".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::resolve(None, no_env, &Overrides::default()).unwrap();
        assert_eq!(config.rounds, 8);
        assert_eq!(config.participants, ["AgentA", "AgentB"]);
        assert_eq!(config.personas, ["scientist", "philosopher"]);
        assert_eq!(config.policy, TurnPolicy::Alternating);
        assert_eq!(config.debate_config(), DebateConfig::default());
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("debate.toml");
        std::fs::write(
            &file,
            "rounds = 4\nseed = 1\npersonas = [\"generic\", \"generic\"]\ncontext_window = 2\n",
        )
        .unwrap();

        let env = env_of(&[(ENV_SEED, "2"), (ENV_PERSONAS, "philosopher, scientist")]);
        let overrides = Overrides {
            seed: Some(3),
            ..Overrides::default()
        };
        let config = RunConfig::resolve(Some(&file), env, &overrides).unwrap();

        assert_eq!(config.rounds, 4);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.personas, ["philosopher", "scientist"]);
        assert_eq!(config.context_window, 2);
        assert_eq!(config.debate_config().total_rounds, 4);
    }

    #[test]
    fn test_env_values_are_parsed() {
        let env = env_of(&[(ENV_ROUNDS, " 6 "), (ENV_LOG_PATH, "logs/run.jsonl")]);
        let config = RunConfig::resolve(None, env, &Overrides::default()).unwrap();
        assert_eq!(config.rounds, 6);
        assert_eq!(config.log_path, Some(PathBuf::from("logs/run.jsonl")));

        let bad = env_of(&[(ENV_ROUNDS, "six")]);
        let err = RunConfig::resolve(None, bad, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_ROUNDS, .. }));
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let overrides = Overrides {
            rounds: Some(0),
            ..Overrides::default()
        };
        let err = RunConfig::resolve(None, no_env, &overrides).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_rejects_oversized_rounds() {
        let env = env_of(&[(ENV_ROUNDS, "4294967295")]);
        let err = RunConfig::resolve(None, env, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("at most"));

        let overrides = Overrides {
            rounds: Some(MAX_TOTAL_ROUNDS),
            ..Overrides::default()
        };
        assert!(RunConfig::resolve(None, no_env, &overrides).is_ok());
    }

    #[test]
    fn test_rejects_identical_participants() {
        let overrides = Overrides {
            participants: Some("Solo,Solo".into()),
            ..Overrides::default()
        };
        assert!(matches!(
            RunConfig::resolve(None, no_env, &overrides),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_persona_list_needs_two_entries() {
        for raw in ["scientist", "a,b,c", "scientist,"] {
            let overrides = Overrides {
                personas: Some(raw.into()),
                ..Overrides::default()
            };
            assert!(
                RunConfig::resolve(None, no_env, &overrides).is_err(),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_policy_parsing() {
        let overrides = Overrides {
            rounds: Some(4),
            policy: Some("abba".into()),
            ..Overrides::default()
        };
        let config = RunConfig::resolve(None, no_env, &overrides).unwrap();
        assert_eq!(config.policy.to_string(), "ABBA");
        assert_eq!(config.debate_config().policy, config.policy);

        let junk = Overrides {
            policy: Some("zigzag".into()),
            ..Overrides::default()
        };
        assert!(RunConfig::resolve(None, no_env, &junk).is_err());
    }

    #[test]
    fn test_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            RunConfig::resolve(Some(&missing), no_env, &Overrides::default()),
            Err(ConfigError::Read { .. })
        ));

        let typo = dir.path().join("typo.toml");
        std::fs::write(&typo, "roundz = 3\n").unwrap();
        assert!(matches!(
            RunConfig::resolve(Some(&typo), no_env, &Overrides::default()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
