//! Error taxonomy for the debate core.
//!
//! Turn violations are recoverable signals from the coordinator; everything
//! in [`DebateError`] either aborts a step or halts the debate.

use thiserror::Error;

use super::persistence::PersistenceError;
use super::schedule::ParticipantId;
use super::state::TransitionError;

/// Why the coordinator rejected a requested turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnViolation {
    #[error("Debate has concluded. No more turns allowed.")]
    ScheduleExhausted,

    #[error("Wrong round. Expected round {expected}, got round {actual}.")]
    WrongRound { expected: u32, actual: u32 },

    #[error("Out of turn. Expected {expected}, got {actual} in round {round}.")]
    OutOfTurn {
        expected: ParticipantId,
        actual: ParticipantId,
        round: u32,
    },
}

impl TurnViolation {
    /// Machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ScheduleExhausted => "SCHEDULE_EXHAUSTED",
            Self::WrongRound { .. } => "WRONG_ROUND",
            Self::OutOfTurn { .. } => "OUT_OF_TURN",
        }
    }
}

/// A participant could not produce text for its turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParticipantError {
    pub message: String,
}

impl ParticipantError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A log sink could not accept a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("log record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the debate driver.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error(transparent)]
    Turn(#[from] TurnViolation),

    #[error("malformed contribution: {reason}")]
    MalformedContribution { reason: String },

    #[error("invalid topic: {reason}")]
    InvalidTopic { reason: String },

    #[error("no topic supplied yet")]
    TopicRequired,

    #[error("no participant registered as {0}")]
    UnknownParticipant(ParticipantId),

    #[error("participant {0} registered more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("{participant} produced no usable contribution for round {round} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        participant: ParticipantId,
        round: u32,
        attempts: u32,
        last_error: String,
    },

    #[error("invariant violated: coordinator is at turn {cursor} but the transcript holds {recorded} contributions (expected {expected})")]
    InvariantViolation {
        cursor: usize,
        recorded: usize,
        expected: usize,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("debate already complete")]
    AlreadyComplete,

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("checkpoint unusable: {0}")]
    Checkpoint(#[from] PersistenceError),
}

impl DebateError {
    /// Machine-readable code, used in halt records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Turn(v) => v.code(),
            Self::MalformedContribution { .. } => "MALFORMED_CONTRIBUTION",
            Self::InvalidTopic { .. } => "INVALID_TOPIC",
            Self::TopicRequired => "TOPIC_REQUIRED",
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            Self::DuplicateParticipant(_) => "DUPLICATE_PARTICIPANT",
            Self::InvalidSchedule { .. } => "INVALID_SCHEDULE",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            Self::Transition(_) => "INVALID_TRANSITION",
            Self::AlreadyComplete => "ALREADY_COMPLETE",
            Self::Sink(_) => "SINK_FAILED",
            Self::Checkpoint(_) => "CHECKPOINT_INVALID",
        }
    }

    /// Whether the error indicates corrupted state or a programming error
    /// rather than expected input variance.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Turn(_)
                | Self::UnknownParticipant(_)
                | Self::DuplicateParticipant(_)
                | Self::InvalidSchedule { .. }
                | Self::InvariantViolation { .. }
                | Self::Transition(_)
                | Self::Sink(_)
                | Self::Checkpoint(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_violation_messages() {
        assert!(TurnViolation::ScheduleExhausted
            .to_string()
            .contains("concluded"));

        let wrong = TurnViolation::WrongRound {
            expected: 1,
            actual: 2,
        };
        assert!(wrong.to_string().contains("Wrong round"));
        assert_eq!(wrong.code(), "WRONG_ROUND");

        let out = TurnViolation::OutOfTurn {
            expected: "A".into(),
            actual: "B".into(),
            round: 1,
        };
        assert!(out.to_string().contains("Out of turn"));
        assert!(out.to_string().contains("Expected A, got B"));
    }

    #[test]
    fn test_debate_error_codes_and_fatality() {
        let err = DebateError::from(TurnViolation::ScheduleExhausted);
        assert_eq!(err.code(), "SCHEDULE_EXHAUSTED");
        assert!(err.is_fatal());

        let err = DebateError::MalformedContribution {
            reason: "empty text".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("empty text"));

        let err = DebateError::InvariantViolation {
            cursor: 3,
            recorded: 5,
            expected: 4,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("turn 3"));
    }
}
