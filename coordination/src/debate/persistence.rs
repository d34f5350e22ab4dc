//! Debate persistence — checkpoint and resume for interrupted debates.
//!
//! Supports serialization of debate state to JSON for checkpointing,
//! and restoration with integrity validation to prevent semantic drift.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::orchestrator::DebateConfig;
use super::schedule::Turn;
use super::state::{DebatePhase, DebateTransition};
use super::transcript::Contribution;

/// A complete debate checkpoint for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateCheckpoint {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Configuration the debate was started with.
    pub config: DebateConfig,
    /// `None` while still awaiting a topic.
    pub topic: Option<String>,
    pub phase: DebatePhase,
    /// Coordinator cursor into `schedule`.
    pub cursor: usize,
    pub schedule: Vec<Turn>,
    pub transcript: Vec<Contribution>,
    pub transitions: Vec<DebateTransition>,
    /// Monotonic checkpoint sequence number.
    pub sequence: u32,
    /// Checkpoint reason.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl DebateCheckpoint {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| PersistenceError::DeserializeFailed {
                reason: e.to_string(),
            })?;

        if checkpoint.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Parse and validate, refusing corrupted checkpoints.
    pub fn restore(json: &str) -> Result<(Self, IntegrityStatus), PersistenceError> {
        let checkpoint = Self::from_json(json)?;
        let status = validate_checkpoint(&checkpoint);

        if let IntegrityStatus::Corrupted { ref errors } = status {
            return Err(PersistenceError::IntegrityCheckFailed {
                reason: errors.join("; "),
            });
        }

        Ok((checkpoint, status))
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        std::fs::write(path, json).map_err(|e| PersistenceError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Read from `path` and [`restore`](Self::restore).
    pub fn load(path: &Path) -> Result<(Self, IntegrityStatus), PersistenceError> {
        let json = std::fs::read_to_string(path).map_err(|e| PersistenceError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::restore(&json)
    }

    /// Number of contributions already recorded.
    pub fn recorded(&self) -> usize {
        self.transcript.len()
    }
}

/// Error during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Serialization failed.
    SerializeFailed { reason: String },
    /// Deserialization failed.
    DeserializeFailed { reason: String },
    /// Schema version mismatch.
    VersionMismatch { expected: u32, found: u32 },
    /// Integrity check failed on restore.
    IntegrityCheckFailed { reason: String },
    /// Checkpoint was taken after the debate ended.
    TerminalCheckpoint { phase: String },
    /// Reading or writing the checkpoint file failed.
    Io { path: String, reason: String },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeFailed { reason } => write!(f, "serialize failed: {}", reason),
            Self::DeserializeFailed { reason } => write!(f, "deserialize failed: {}", reason),
            Self::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Self::IntegrityCheckFailed { reason } => {
                write!(f, "integrity check failed: {}", reason)
            }
            Self::TerminalCheckpoint { phase } => {
                write!(f, "checkpoint is in terminal phase {}", phase)
            }
            Self::Io { path, reason } => write!(f, "checkpoint i/o on {}: {}", path, reason),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Integrity check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Checkpoint is valid and can be resumed.
    Valid,
    /// Checkpoint has minor issues but is recoverable.
    Recoverable { warnings: Vec<String> },
    /// Checkpoint is corrupted and cannot be used.
    Corrupted { errors: Vec<String> },
}

impl IntegrityStatus {
    /// Whether resume is safe.
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Valid | Self::Recoverable { .. })
    }
}

/// Validate a checkpoint's integrity before resuming.
pub fn validate_checkpoint(checkpoint: &DebateCheckpoint) -> IntegrityStatus {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if checkpoint.version > DebateCheckpoint::CURRENT_VERSION {
        errors.push(format!(
            "version {} > current {}",
            checkpoint.version,
            DebateCheckpoint::CURRENT_VERSION
        ));
    }

    if checkpoint.schedule.is_empty() {
        errors.push("schedule is empty".to_string());
    }

    if checkpoint.cursor > checkpoint.schedule.len() {
        errors.push(format!(
            "cursor {} is past the end of a {}-turn schedule",
            checkpoint.cursor,
            checkpoint.schedule.len()
        ));
    }

    // Store and coordinator must agree on how far the debate got.
    if checkpoint.transcript.len() != checkpoint.cursor {
        errors.push(format!(
            "transcript holds {} contributions but cursor is {}",
            checkpoint.transcript.len(),
            checkpoint.cursor
        ));
    }

    // Recorded turns must be a prefix of the schedule.
    for (i, entry) in checkpoint.transcript.iter().enumerate() {
        match checkpoint.schedule.get(i) {
            Some(turn) if turn.round == entry.round && turn.participant == entry.participant => {}
            Some(turn) => errors.push(format!(
                "contribution {} is round {} by {}, schedule expects {}",
                i + 1,
                entry.round,
                entry.participant,
                turn
            )),
            None => errors.push(format!("contribution {} has no scheduled turn", i + 1)),
        }
    }

    if let Some(stranger) = checkpoint
        .schedule
        .iter()
        .find(|t| !checkpoint.config.participants.contains(&t.participant))
    {
        errors.push(format!(
            "schedule seats {} who is not a configured participant",
            stranger.participant
        ));
    }

    match checkpoint.transitions.last() {
        Some(last) if last.to != checkpoint.phase => {
            errors.push(format!(
                "last transition target {} doesn't match current phase {}",
                last.to, checkpoint.phase
            ));
        }
        None if checkpoint.phase != DebatePhase::AwaitingTopic => {
            warnings.push(format!(
                "no transition history for phase {}",
                checkpoint.phase
            ));
        }
        _ => {}
    }

    if checkpoint.topic.is_none() && checkpoint.phase != DebatePhase::AwaitingTopic {
        errors.push(format!("phase {} has no topic", checkpoint.phase));
    }

    if checkpoint.schedule.len() != checkpoint.config.total_rounds as usize {
        warnings.push(format!(
            "schedule has {} turns but config asks for {} rounds",
            checkpoint.schedule.len(),
            checkpoint.config.total_rounds
        ));
    }

    if checkpoint.sequence == 0 {
        warnings.push("checkpoint sequence is 0".to_string());
    }

    if !errors.is_empty() {
        IntegrityStatus::Corrupted { errors }
    } else if !warnings.is_empty() {
        IntegrityStatus::Recoverable { warnings }
    } else {
        IntegrityStatus::Valid
    }
}
