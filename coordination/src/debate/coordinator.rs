//! Turn coordinator — deterministic scheduler over a fixed turn sequence.
//!
//! The coordinator owns the schedule and a monotonic cursor into it.
//! `validate` is the only gate protecting transcript ordering: the driver
//! must call it, and honour a failure, before appending anything.

use serde::{Deserialize, Serialize};

use super::error::{DebateError, TurnViolation};
use super::guardrails::{self, AnomalyWarning};
use super::schedule::{build_schedule, ParticipantId, Turn, TurnPolicy};
use super::transcript::Contribution;

/// Snapshot of coordinator progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub total_rounds: usize,
    pub completed_turns: usize,
    pub remaining_turns: usize,
    pub is_complete: bool,
    pub next_turn: Option<Turn>,
}

/// Scheduler enforcing strict turn order.
#[derive(Debug, Clone)]
pub struct TurnCoordinator {
    participants: [ParticipantId; 2],
    schedule: Vec<Turn>,
    cursor: usize,
}

impl TurnCoordinator {
    /// Build a coordinator for `total_rounds` rounds under `policy`.
    pub fn new(
        participants: [ParticipantId; 2],
        total_rounds: u32,
        policy: &TurnPolicy,
    ) -> Result<Self, DebateError> {
        let schedule = build_schedule(&participants, total_rounds, policy)?;
        Ok(Self {
            participants,
            schedule,
            cursor: 0,
        })
    }

    /// Rebuild a coordinator at a saved cursor position.
    pub fn restore(
        participants: [ParticipantId; 2],
        schedule: Vec<Turn>,
        cursor: usize,
    ) -> Result<Self, DebateError> {
        if schedule.is_empty() {
            return Err(DebateError::InvalidSchedule {
                reason: "schedule is empty".to_string(),
            });
        }
        if cursor > schedule.len() {
            return Err(DebateError::InvalidSchedule {
                reason: format!(
                    "cursor {} is past the end of a {}-turn schedule",
                    cursor,
                    schedule.len()
                ),
            });
        }
        if let Some(stranger) = schedule
            .iter()
            .find(|t| !participants.contains(&t.participant))
        {
            return Err(DebateError::UnknownParticipant(stranger.participant.clone()));
        }
        Ok(Self {
            participants,
            schedule,
            cursor,
        })
    }

    /// The turn that must be taken next, or `None` once the debate is over.
    pub fn next_turn(&self) -> Option<&Turn> {
        self.schedule.get(self.cursor)
    }

    /// Move past the current turn. No-op once the schedule is exhausted.
    pub fn advance(&mut self) {
        if self.cursor < self.schedule.len() {
            self.cursor += 1;
        }
    }

    /// Check that `participant` may speak in `round` right now.
    pub fn validate(&self, participant: &ParticipantId, round: u32) -> Result<(), TurnViolation> {
        let expected = self
            .schedule
            .get(self.cursor)
            .ok_or(TurnViolation::ScheduleExhausted)?;

        if round != expected.round {
            return Err(TurnViolation::WrongRound {
                expected: expected.round,
                actual: round,
            });
        }
        if participant != &expected.participant {
            return Err(TurnViolation::OutOfTurn {
                expected: expected.participant.clone(),
                actual: participant.clone(),
                round,
            });
        }
        Ok(())
    }

    /// `validate` in `(ok, reason)` form; the reason is empty on success.
    pub fn validate_reason(&self, participant: &ParticipantId, round: u32) -> (bool, String) {
        match self.validate(participant, round) {
            Ok(()) => (true, String::new()),
            Err(violation) => (false, violation.to_string()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.schedule.len()
    }

    /// Repeated-argument warnings for the given transcript.
    pub fn detect_repetition(&self, transcript: &[Contribution]) -> Vec<AnomalyWarning> {
        guardrails::detect_repetition(transcript)
    }

    /// Topic-drift warnings for the given transcript.
    pub fn detect_topic_drift(&self, transcript: &[Contribution]) -> Vec<AnomalyWarning> {
        guardrails::detect_topic_drift(transcript)
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            total_rounds: self.schedule.len(),
            completed_turns: self.cursor,
            remaining_turns: self.schedule.len() - self.cursor,
            is_complete: self.is_complete(),
            next_turn: self.next_turn().cloned(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn schedule(&self) -> &[Turn] {
        &self.schedule
    }

    pub fn participants(&self) -> &[ParticipantId; 2] {
        &self.participants
    }
}
