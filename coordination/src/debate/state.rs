//! Debate state machine — phases, transitions, and routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinator::TurnCoordinator;
use super::schedule::Turn;

/// Phase of the control-flow driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DebatePhase {
    /// Waiting for the topic provider.
    AwaitingTopic,
    /// Deciding what happens next.
    Coordinating,
    /// A participant is producing its contribution for this turn.
    ParticipantTurn(Turn),
    /// Schedule exhausted; the judge is scoring the transcript.
    Judging,
    /// Verdict produced and logged.
    Done,
    /// Halted before the schedule completed.
    Aborted,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Whether the machine may move from this phase to `to`.
    pub fn can_transition_to(&self, to: &DebatePhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(to, Self::Aborted) {
            return true;
        }
        matches!(
            (self, to),
            (Self::AwaitingTopic, Self::Coordinating)
                | (Self::Coordinating, Self::ParticipantTurn(_))
                | (Self::Coordinating, Self::Judging)
                | (Self::ParticipantTurn(_), Self::Coordinating)
                | (Self::Judging, Self::Done)
        )
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingTopic => "awaiting_topic",
            Self::Coordinating => "coordinating",
            Self::ParticipantTurn(_) => "participant_turn",
            Self::Judging => "judging",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParticipantTurn(turn) => write!(f, "participant_turn({})", turn),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateTransition {
    /// Previous phase.
    pub from: DebatePhase,
    /// New phase.
    pub to: DebatePhase,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for TransitionError {}

/// Where the driver goes after `Coordinating`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Turn(Turn),
    Judge,
}

impl Route {
    /// The phase this route leads to.
    pub fn phase(&self) -> DebatePhase {
        match self {
            Self::Turn(turn) => DebatePhase::ParticipantTurn(turn.clone()),
            Self::Judge => DebatePhase::Judging,
        }
    }
}

/// Routing predicate. Reads only `is_complete` and `next_turn`.
pub fn route(coordinator: &TurnCoordinator) -> Route {
    if coordinator.is_complete() {
        return Route::Judge;
    }
    match coordinator.next_turn() {
        Some(turn) => Route::Turn(turn.clone()),
        None => Route::Judge,
    }
}

/// Current phase plus the full transition history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMachine {
    phase: DebatePhase,
    transitions: Vec<DebateTransition>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: DebatePhase::AwaitingTopic,
            transitions: Vec::new(),
        }
    }

    /// Rebuild from a saved phase and history.
    pub fn restore(phase: DebatePhase, transitions: Vec<DebateTransition>) -> Self {
        Self { phase, transitions }
    }

    pub fn phase(&self) -> &DebatePhase {
        &self.phase
    }

    pub fn transitions(&self) -> &[DebateTransition] {
        &self.transitions
    }

    /// Move to `to`, recording the transition.
    pub fn transition(
        &mut self,
        to: DebatePhase,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<&DebateTransition, TransitionError> {
        if !self.phase.can_transition_to(&to) {
            let why = if self.phase.is_terminal() {
                "phase is terminal".to_string()
            } else {
                format!("{} cannot follow {}", to.label(), self.phase.label())
            };
            return Err(TransitionError {
                from: self.phase.clone(),
                to,
                reason: why,
            });
        }

        let from = std::mem::replace(&mut self.phase, to.clone());
        self.transitions.push(DebateTransition {
            from,
            to,
            timestamp: at,
            reason: reason.to_string(),
        });
        let idx = self.transitions.len() - 1;
        Ok(&self.transitions[idx])
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::schedule::TurnPolicy;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    #[test]
    fn test_full_cycle() {
        let mut machine = PhaseMachine::new();
        machine
            .transition(DebatePhase::Coordinating, "topic supplied", now())
            .unwrap();
        machine
            .transition(DebatePhase::ParticipantTurn(Turn::new(1, "A")), "route", now())
            .unwrap();
        machine
            .transition(DebatePhase::Coordinating, "recorded", now())
            .unwrap();
        machine
            .transition(DebatePhase::Judging, "schedule exhausted", now())
            .unwrap();
        machine
            .transition(DebatePhase::Done, "verdict logged", now())
            .unwrap();

        assert!(machine.is_terminal());
        assert_eq!(machine.transitions().len(), 5);
        assert_eq!(machine.transitions()[0].from, DebatePhase::AwaitingTopic);
        assert_eq!(machine.transitions()[4].to, DebatePhase::Done);
    }

    #[test]
    fn test_invalid_transition() {
        let mut machine = PhaseMachine::new();
        let err = machine
            .transition(DebatePhase::Judging, "skip", now())
            .unwrap_err();
        assert_eq!(err.from, DebatePhase::AwaitingTopic);
        assert_eq!(err.to, DebatePhase::Judging);
        assert!(machine.transitions().is_empty());
    }

    #[test]
    fn test_terminal_no_transitions() {
        for terminal in [DebatePhase::Done, DebatePhase::Aborted] {
            let mut machine = PhaseMachine::restore(terminal.clone(), Vec::new());
            let err = machine
                .transition(DebatePhase::Coordinating, "restart", now())
                .unwrap_err();
            assert_eq!(err.from, terminal);
            assert!(err.to_string().contains("terminal"));
            assert!(machine
                .transition(DebatePhase::Aborted, "again", now())
                .is_err());
        }
    }

    #[test]
    fn test_abort_from_any_live_phase() {
        let live = [
            DebatePhase::AwaitingTopic,
            DebatePhase::Coordinating,
            DebatePhase::ParticipantTurn(Turn::new(2, "B")),
            DebatePhase::Judging,
        ];
        for phase in live {
            assert!(phase.can_transition_to(&DebatePhase::Aborted), "{}", phase);
        }
    }

    #[test]
    fn test_route_follows_coordinator() {
        let mut coord =
            TurnCoordinator::new(["A".into(), "B".into()], 2, &TurnPolicy::Alternating).unwrap();
        assert_eq!(route(&coord), Route::Turn(Turn::new(1, "A")));
        coord.advance();
        assert_eq!(route(&coord), Route::Turn(Turn::new(2, "B")));
        coord.advance();
        assert_eq!(route(&coord), Route::Judge);
        assert_eq!(route(&coord).phase(), DebatePhase::Judging);
    }

    #[test]
    fn test_phase_display_and_serde() {
        assert_eq!(DebatePhase::AwaitingTopic.to_string(), "awaiting_topic");
        assert_eq!(
            DebatePhase::ParticipantTurn(Turn::new(3, "A")).to_string(),
            "participant_turn(round 3 (A))"
        );

        let json = serde_json::to_string(&DebatePhase::ParticipantTurn(Turn::new(3, "A"))).unwrap();
        assert!(json.contains("\"phase\":\"participant_turn\""));
        let back: DebatePhase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DebatePhase::ParticipantTurn(Turn::new(3, "A")));
    }
}
