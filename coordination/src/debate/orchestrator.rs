//! Debate orchestrator — drives the topic → turns → verdict cycle.
//!
//! Ties together the phase machine, turn coordinator, transcript store,
//! guardrails and judge. Each call to [`DebateOrchestrator::step`] performs
//! exactly one phase transition and returns a typed [`StepOutput`], which is
//! folded into the running [`DebateContext`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::coordinator::{CoordinatorStatus, TurnCoordinator};
use super::error::{DebateError, ParticipantError};
use super::guardrails::AnomalyWarning;
use super::judge::{Judge, Verdict};
use super::lexical::char_len;
use super::log::{HaltReport, LogRecord, LogSink};
use super::persistence::{validate_checkpoint, DebateCheckpoint, IntegrityStatus, PersistenceError};
use super::schedule::{ParticipantId, Turn, TurnPolicy, DEFAULT_TOTAL_ROUNDS};
use super::state::{route, DebatePhase, DebateTransition, PhaseMachine, Route};
use super::transcript::{Clock, Contribution, ContributionDraft, SystemClock, Transcript};

/// Halt code used when the debate is cancelled from outside.
pub const INTERRUPTED: &str = "INTERRUPTED";

/// What a participant sees when asked for its next contribution.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    pub topic: &'a str,
    /// Recent contributions by the other participant, oldest first.
    pub visible_context: &'a [Contribution],
    pub round: u32,
}

/// A debater. Text generation is entirely up to the implementation.
pub trait Participant: Send {
    fn id(&self) -> &ParticipantId;

    /// Produce argument text for `request.round`.
    fn contribute(&mut self, request: &TurnRequest<'_>) -> Result<String, ParticipantError>;

    /// Rebuild internal memory from this participant's own recorded
    /// contributions when a debate is resumed.
    fn restore_history(&mut self, _own: &[Contribution]) {}
}

/// Configuration for the debate orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// The two participants, first seat then second seat.
    pub participants: [ParticipantId; 2],
    pub total_rounds: u32,
    pub policy: TurnPolicy,
    /// How many of the other side's contributions a participant may read.
    pub context_window: usize,
    /// Extra attempts per turn after the first one fails.
    pub max_turn_retries: u32,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            participants: ["AgentA".into(), "AgentB".into()],
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            policy: TurnPolicy::Alternating,
            context_window: 5,
            max_turn_retries: 3,
        }
    }
}

/// Typed result of one driver step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    /// Topic accepted.
    Topic { topic: String },
    /// Routing decision, with the coordinator status it was based on.
    Coordinator { status: CoordinatorStatus, next: DebatePhase },
    /// A contribution was recorded.
    Turn {
        contribution: Contribution,
        warnings: Vec<AnomalyWarning>,
        attempts: u32,
    },
    /// Verdict produced (complete or partial transcript).
    Judgement { verdict: Verdict, summary: String },
    /// The debate stopped early.
    Halt(HaltReport),
}

/// Running debate context, built by folding step outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebateContext {
    pub topic: Option<String>,
    /// Round of the turn in progress or last recorded.
    pub round: Option<u32>,
    pub current_speaker: Option<ParticipantId>,
    pub last_recorded_round: Option<u32>,
    /// Warnings raised by the most recent contribution.
    pub latest_warnings: Vec<AnomalyWarning>,
    pub warning_count: usize,
    pub status: Option<CoordinatorStatus>,
    pub verdict: Option<Verdict>,
    pub summary: Option<String>,
    pub halt: Option<HaltReport>,
}

impl DebateContext {
    /// Merge one step's output into the context.
    pub fn apply(&mut self, output: &StepOutput) {
        match output {
            StepOutput::Topic { topic } => {
                self.topic = Some(topic.clone());
            }
            StepOutput::Coordinator { status, .. } => {
                if let Some(turn) = &status.next_turn {
                    self.round = Some(turn.round);
                    self.current_speaker = Some(turn.participant.clone());
                } else {
                    self.current_speaker = None;
                }
                self.status = Some(status.clone());
            }
            StepOutput::Turn {
                contribution,
                warnings,
                ..
            } => {
                self.round = Some(contribution.round);
                self.last_recorded_round = Some(contribution.round);
                self.current_speaker = Some(contribution.participant.clone());
                self.warning_count += warnings.len();
                self.latest_warnings = warnings.clone();
            }
            StepOutput::Judgement { verdict, summary } => {
                self.current_speaker = None;
                self.verdict = Some(verdict.clone());
                self.summary = Some(summary.clone());
            }
            StepOutput::Halt(report) => {
                self.current_speaker = None;
                self.halt = Some(report.clone());
            }
        }
    }
}

/// Outcome of a finished debate.
#[derive(Debug, Clone, PartialEq)]
pub struct DebateOutcome {
    /// `Done` or `Aborted`.
    pub terminal_phase: DebatePhase,
    pub topic: Option<String>,
    pub turns_completed: usize,
    pub turns_scheduled: usize,
    /// Present whenever at least one contribution was recorded.
    pub verdict: Option<Verdict>,
    pub summary: Option<String>,
    pub halt: Option<HaltReport>,
    pub transcript: Vec<Contribution>,
}

impl DebateOutcome {
    /// Whether the full schedule ran and a verdict was logged.
    pub fn is_success(&self) -> bool {
        self.terminal_phase == DebatePhase::Done
    }

    /// Whether the debate was cancelled from outside.
    pub fn was_interrupted(&self) -> bool {
        self.halt.as_ref().is_some_and(|h| h.code == INTERRUPTED)
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let status = if self.is_success() {
            "DONE"
        } else if self.was_interrupted() {
            "INTERRUPTED"
        } else {
            "ABORTED"
        };
        let mut line = format!(
            "[{}] {}/{} turns",
            status, self.turns_completed, self.turns_scheduled
        );
        if let Some(verdict) = &self.verdict {
            line.push_str(&format!(
                " | winner={} confidence={:.3}",
                verdict.winner_label(),
                verdict.confidence
            ));
        }
        if let Some(halt) = &self.halt {
            line.push_str(&format!(" | {}", halt.code));
        }
        line
    }
}

/// The debate orchestrator.
///
/// Usage:
/// 1. Create with `new()` (or `resume()` from a checkpoint)
/// 2. Call `supply_topic()`
/// 3. Call `step()` until `is_complete()`, or `run()` to do that in a loop
/// 4. Call `outcome()` to get the final result
pub struct DebateOrchestrator {
    config: DebateConfig,
    participants: Vec<Box<dyn Participant>>,
    coordinator: TurnCoordinator,
    transcript: Transcript,
    machine: PhaseMachine,
    context: DebateContext,
    judge: Judge,
    clock: Arc<dyn Clock>,
    sequence: u32,
}

impl DebateOrchestrator {
    /// Create an orchestrator awaiting its topic.
    ///
    /// `participants` must contain exactly the two configured ids.
    pub fn new(
        config: DebateConfig,
        participants: Vec<Box<dyn Participant>>,
    ) -> Result<Self, DebateError> {
        let coordinator = TurnCoordinator::new(
            config.participants.clone(),
            config.total_rounds,
            &config.policy,
        )?;
        let participants = seat_participants(&config, participants)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        info!(
            first = %config.participants[0],
            second = %config.participants[1],
            rounds = config.total_rounds,
            policy = %config.policy,
            "Debate created"
        );

        Ok(Self {
            transcript: Transcript::with_clock(Box::new(clock.clone())),
            config,
            participants,
            coordinator,
            machine: PhaseMachine::new(),
            context: DebateContext::default(),
            judge: Judge::new(),
            clock,
            sequence: 0,
        })
    }

    /// Rebuild an orchestrator from a checkpoint.
    pub fn resume(
        checkpoint: DebateCheckpoint,
        participants: Vec<Box<dyn Participant>>,
    ) -> Result<Self, DebateError> {
        if checkpoint.phase.is_terminal() {
            return Err(PersistenceError::TerminalCheckpoint {
                phase: checkpoint.phase.to_string(),
            }
            .into());
        }
        match validate_checkpoint(&checkpoint) {
            IntegrityStatus::Corrupted { errors } => {
                return Err(PersistenceError::IntegrityCheckFailed {
                    reason: errors.join("; "),
                }
                .into());
            }
            IntegrityStatus::Recoverable { warnings } => {
                for warning in &warnings {
                    warn!(warning = %warning, "Resuming from imperfect checkpoint");
                }
            }
            IntegrityStatus::Valid => {}
        }

        let DebateCheckpoint {
            config,
            topic,
            phase,
            cursor,
            schedule,
            transcript,
            transitions,
            sequence,
            ..
        } = checkpoint;

        let coordinator = TurnCoordinator::restore(config.participants.clone(), schedule, cursor)?;
        let mut participants = seat_participants(&config, participants)?;
        for participant in participants.iter_mut() {
            let own: Vec<Contribution> = transcript
                .iter()
                .filter(|c| &c.participant == participant.id())
                .cloned()
                .collect();
            participant.restore_history(&own);
        }

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let context = DebateContext {
            topic,
            round: transcript.last().map(|c| c.round),
            last_recorded_round: transcript.last().map(|c| c.round),
            status: Some(coordinator.status()),
            ..DebateContext::default()
        };

        info!(
            cursor,
            recorded = transcript.len(),
            phase = %phase,
            "Debate resumed from checkpoint"
        );

        Ok(Self {
            transcript: Transcript::from_entries(transcript, Box::new(clock.clone())),
            config,
            participants,
            coordinator,
            machine: PhaseMachine::restore(phase, transitions),
            context,
            judge: Judge::new(),
            clock,
            sequence,
        })
    }

    /// Use `clock` for contribution and transition timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let entries = std::mem::take(&mut self.transcript).all();
        self.transcript = Transcript::from_entries(entries, Box::new(clock.clone()));
        self.clock = clock;
        self
    }

    /// Accept the topic and start coordinating.
    pub fn supply_topic(
        &mut self,
        topic: &str,
        sink: &mut dyn LogSink,
    ) -> Result<StepOutput, DebateError> {
        if self.machine.is_terminal() {
            return Err(DebateError::AlreadyComplete);
        }
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DebateError::InvalidTopic {
                reason: "topic is empty".to_string(),
            });
        }

        self.move_to(DebatePhase::Coordinating, "topic supplied", sink)?;
        info!(topic = %topic, "Debate topic set");

        let output = StepOutput::Topic {
            topic: topic.to_string(),
        };
        self.context.apply(&output);
        Ok(output)
    }

    /// Perform exactly one phase transition.
    pub fn step(&mut self, sink: &mut dyn LogSink) -> Result<StepOutput, DebateError> {
        let output = match self.machine.phase().clone() {
            DebatePhase::AwaitingTopic => return Err(DebateError::TopicRequired),
            DebatePhase::Done | DebatePhase::Aborted => return Err(DebateError::AlreadyComplete),
            DebatePhase::Coordinating => self.coordinate(sink)?,
            DebatePhase::ParticipantTurn(turn) => self.take_turn(turn, sink)?,
            DebatePhase::Judging => self.conclude(sink)?,
        };
        self.context.apply(&output);
        Ok(output)
    }

    /// Step until terminal, checking `cancel` between steps.
    pub fn run(
        &mut self,
        sink: &mut dyn LogSink,
        cancel: &AtomicBool,
    ) -> Result<DebateOutcome, DebateError> {
        while !self.machine.is_terminal() {
            if cancel.load(Ordering::SeqCst) {
                return self.abort("cancelled by user", sink);
            }
            self.step(sink)?;
        }
        Ok(self.build_outcome())
    }

    /// Stop the debate now. A non-empty transcript still gets a partial
    /// verdict.
    pub fn abort(
        &mut self,
        reason: &str,
        sink: &mut dyn LogSink,
    ) -> Result<DebateOutcome, DebateError> {
        if self.machine.is_terminal() {
            return Err(DebateError::AlreadyComplete);
        }
        let report = self.halt_report(INTERRUPTED, reason, false);
        warn!(
            reason = %reason,
            recorded = report.recorded,
            "Debate interrupted"
        );
        sink.record(&LogRecord::Halt(report.clone()))?;
        self.context.apply(&StepOutput::Halt(report));
        self.move_to(DebatePhase::Aborted, reason, sink)?;
        self.partial_verdict(sink)?;
        Ok(self.build_outcome())
    }

    /// The final result, once the debate is terminal.
    pub fn outcome(&self) -> Option<DebateOutcome> {
        self.machine.is_terminal().then(|| self.build_outcome())
    }

    /// Snapshot the debate for later [`resume`](Self::resume).
    pub fn checkpoint(&mut self, reason: &str) -> DebateCheckpoint {
        self.sequence += 1;
        DebateCheckpoint {
            version: DebateCheckpoint::CURRENT_VERSION,
            config: self.config.clone(),
            topic: self.context.topic.clone(),
            phase: self.machine.phase().clone(),
            cursor: self.coordinator.cursor(),
            schedule: self.coordinator.schedule().to_vec(),
            transcript: self.transcript.all(),
            transitions: self.machine.transitions().to_vec(),
            sequence: self.sequence,
            reason: reason.to_string(),
            created_at: self.clock.now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.machine.is_terminal()
    }

    pub fn phase(&self) -> &DebatePhase {
        self.machine.phase()
    }

    pub fn transitions(&self) -> &[DebateTransition] {
        self.machine.transitions()
    }

    pub fn context(&self) -> &DebateContext {
        &self.context
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn coordinator(&self) -> &TurnCoordinator {
        &self.coordinator
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    fn coordinate(&mut self, sink: &mut dyn LogSink) -> Result<StepOutput, DebateError> {
        let status = self.coordinator.status();
        sink.record(&LogRecord::Status(status.clone()))?;

        let next = route(&self.coordinator);
        let reason = match &next {
            Route::Turn(turn) => format!("{} scheduled", turn),
            Route::Judge => "schedule exhausted".to_string(),
        };
        let phase = next.phase();
        self.move_to(phase.clone(), &reason, sink)?;

        Ok(StepOutput::Coordinator { status, next: phase })
    }

    fn take_turn(&mut self, turn: Turn, sink: &mut dyn LogSink) -> Result<StepOutput, DebateError> {
        let Some(idx) = self
            .participants
            .iter()
            .position(|p| p.id() == &turn.participant)
        else {
            return Err(self.halt(DebateError::UnknownParticipant(turn.participant), sink));
        };
        let topic = self.context.topic.clone().unwrap_or_default();
        let visible = self
            .transcript
            .slice_excluding(&turn.participant, self.config.context_window);

        let max_attempts = self.config.max_turn_retries.saturating_add(1);
        let mut attempts = 0;
        let mut last_error = String::new();
        let mut accepted = None;

        while attempts < max_attempts {
            attempts += 1;
            let request = TurnRequest {
                topic: &topic,
                visible_context: &visible,
                round: turn.round,
            };
            let rejection = match self.participants[idx].contribute(&request) {
                Ok(text) => {
                    let length = char_len(&text);
                    let draft = ContributionDraft::new(turn.round, turn.participant.clone(), text)
                        .with_metadata("argument_length", length);
                    match draft.validate() {
                        Ok(()) => {
                            accepted = Some(draft);
                            break;
                        }
                        Err(err) => (err.code(), err.to_string()),
                    }
                }
                Err(err) => ("PARTICIPANT_FAILED", err.to_string()),
            };

            let (code, reason) = rejection;
            warn!(
                participant = %turn.participant,
                round = turn.round,
                attempt = attempts,
                code,
                reason = %reason,
                "Contribution rejected"
            );
            sink.record(&LogRecord::Rejection {
                participant: turn.participant.clone(),
                round: turn.round,
                attempt: attempts,
                code: code.to_string(),
                reason: reason.clone(),
            })?;
            last_error = reason;
        }

        let Some(draft) = accepted else {
            return Err(self.halt(
                DebateError::RetriesExhausted {
                    participant: turn.participant,
                    round: turn.round,
                    attempts,
                    last_error,
                },
                sink,
            ));
        };

        if let Err(violation) = self.coordinator.validate(&draft.participant, draft.round) {
            return Err(self.halt(violation.into(), sink));
        }
        if let Err(err) = self.check_alignment() {
            return Err(self.halt(err, sink));
        }

        // Store and cursor move together; nothing below may leave them apart.
        let contribution = self.transcript.append(draft);
        self.coordinator.advance();
        if let Err(err) = self.check_alignment() {
            return Err(self.halt(err, sink));
        }
        info!(
            round = contribution.round,
            participant = %contribution.participant,
            chars = char_len(&contribution.text),
            "Contribution recorded"
        );

        let warnings = self.new_warnings(&contribution);
        if let Err(err) = self.publish_turn(&contribution, &warnings, sink) {
            return Err(self.halt(err, sink));
        }

        Ok(StepOutput::Turn {
            contribution,
            warnings,
            attempts,
        })
    }

    /// Log an accepted turn and hand control back to the coordinator.
    fn publish_turn(
        &mut self,
        contribution: &Contribution,
        warnings: &[AnomalyWarning],
        sink: &mut dyn LogSink,
    ) -> Result<(), DebateError> {
        sink.record(&LogRecord::Contribution(contribution.clone()))?;
        for warning in warnings {
            warn!(warning = %warning, "Guardrail warning");
            sink.record(&LogRecord::Warning(warning.clone()))?;
        }
        let reason = format!("round {} recorded", contribution.round);
        self.move_to(DebatePhase::Coordinating, &reason, sink)
    }

    fn conclude(&mut self, sink: &mut dyn LogSink) -> Result<StepOutput, DebateError> {
        let topic = self.context.topic.clone().unwrap_or_default();
        let verdict = self.judge.decide(self.transcript.entries());
        let summary = self.judge.summary(self.transcript.entries(), &topic);

        info!(
            winner = %verdict.winner_label(),
            confidence = verdict.confidence,
            "Verdict reached"
        );
        sink.record(&LogRecord::Verdict(verdict.clone()))?;
        self.move_to(DebatePhase::Done, "verdict logged", sink)?;
        sink.flush()?;

        Ok(StepOutput::Judgement { verdict, summary })
    }

    /// Warnings triggered by `latest`, the contribution just appended.
    fn new_warnings(&self, latest: &Contribution) -> Vec<AnomalyWarning> {
        let entries = self.transcript.entries();
        let mut warnings: Vec<AnomalyWarning> = self
            .coordinator
            .detect_repetition(entries)
            .into_iter()
            .filter(|w| match w {
                AnomalyWarning::Repetition { rounds, .. } => rounds[1] == latest.round,
                _ => false,
            })
            .collect();
        warnings.extend(
            self.coordinator
                .detect_topic_drift(entries)
                .into_iter()
                .filter(|w| match w {
                    AnomalyWarning::TopicDrift { round, .. } => *round == latest.round,
                    _ => false,
                }),
        );
        warnings
    }

    /// Store and coordinator must agree on how many turns were taken.
    fn check_alignment(&self) -> Result<(), DebateError> {
        let cursor = self.coordinator.cursor();
        let recorded = self.transcript.len();
        if recorded != cursor {
            return Err(DebateError::InvariantViolation {
                cursor,
                recorded,
                expected: cursor,
            });
        }
        Ok(())
    }

    fn move_to(
        &mut self,
        to: DebatePhase,
        reason: &str,
        sink: &mut dyn LogSink,
    ) -> Result<(), DebateError> {
        let at = self.clock.now();
        let transition = self.machine.transition(to, reason, at)?.clone();
        debug!(
            from = %transition.from,
            to = %transition.to,
            reason = %transition.reason,
            "Phase transition"
        );
        sink.record(&LogRecord::Transition(transition))?;
        Ok(())
    }

    fn halt_report(&self, code: &str, reason: &str, fatal: bool) -> HaltReport {
        HaltReport {
            code: code.to_string(),
            reason: reason.to_string(),
            phase: self.machine.phase().clone(),
            last_recorded_round: self.transcript.last_round(),
            cursor: self.coordinator.cursor(),
            recorded: self.transcript.len(),
            fatal,
        }
    }

    /// Record a halt, move to `Aborted` and hand back `err` for the caller
    /// to return. Sink failures here are logged and otherwise ignored.
    fn halt(&mut self, err: DebateError, sink: &mut dyn LogSink) -> DebateError {
        let report = self.halt_report(err.code(), &err.to_string(), err.is_fatal());
        if report.fatal {
            error!(
                code = %report.code,
                cursor = report.cursor,
                recorded = report.recorded,
                "Debate halted: {}",
                report.reason
            );
        } else {
            warn!(code = %report.code, "Debate halted: {}", report.reason);
        }

        if let Err(sink_err) = sink.record(&LogRecord::Halt(report.clone())) {
            warn!(error = %sink_err, "Failed to log halt record");
        }
        self.context.apply(&StepOutput::Halt(report));

        if let Err(move_err) = self.move_to(DebatePhase::Aborted, &err.to_string(), sink) {
            warn!(error = %move_err, "Failed to record abort transition");
        }
        if let Err(verdict_err) = self.partial_verdict(sink) {
            warn!(error = %verdict_err, "Failed to log partial verdict");
        }
        err
    }

    /// Judge whatever was recorded so far; no-op on an empty transcript.
    fn partial_verdict(&mut self, sink: &mut dyn LogSink) -> Result<(), DebateError> {
        if self.transcript.is_empty() {
            return Ok(());
        }
        let topic = self.context.topic.clone().unwrap_or_default();
        let verdict = self.judge.decide(self.transcript.entries());
        let summary = self.judge.summary(self.transcript.entries(), &topic);
        info!(
            winner = %verdict.winner_label(),
            recorded = self.transcript.len(),
            "Partial verdict reached"
        );
        sink.record(&LogRecord::Verdict(verdict.clone()))?;
        sink.flush()?;
        self.context
            .apply(&StepOutput::Judgement { verdict, summary });
        Ok(())
    }

    fn build_outcome(&self) -> DebateOutcome {
        DebateOutcome {
            terminal_phase: self.machine.phase().clone(),
            topic: self.context.topic.clone(),
            turns_completed: self.coordinator.cursor(),
            turns_scheduled: self.coordinator.schedule().len(),
            verdict: self.context.verdict.clone(),
            summary: self.context.summary.clone(),
            halt: self.context.halt.clone(),
            transcript: self.transcript.all(),
        }
    }
}

/// Order `participants` to match the configured seats.
fn seat_participants(
    config: &DebateConfig,
    mut participants: Vec<Box<dyn Participant>>,
) -> Result<Vec<Box<dyn Participant>>, DebateError> {
    for (i, p) in participants.iter().enumerate() {
        if participants[..i].iter().any(|q| q.id() == p.id()) {
            return Err(DebateError::DuplicateParticipant(p.id().clone()));
        }
        if !config.participants.contains(p.id()) {
            return Err(DebateError::UnknownParticipant(p.id().clone()));
        }
    }

    let mut seated = Vec::with_capacity(2);
    for id in &config.participants {
        let idx = participants
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| DebateError::UnknownParticipant(id.clone()))?;
        seated.push(participants.remove(idx));
    }
    Ok(seated)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::debate::log::MemorySink;
    use crate::debate::transcript::ManualClock;

    type Seen = Arc<Mutex<Vec<Vec<ParticipantId>>>>;

    /// Replays a fixed list of responses, one per call.
    struct Scripted {
        id: ParticipantId,
        replies: Vec<Result<String, ParticipantError>>,
        calls: usize,
        seen: Seen,
    }

    impl Scripted {
        fn new(id: &str, replies: &[&str]) -> Self {
            Self::with_replies(id, replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn with_replies(id: &str, replies: Vec<Result<String, ParticipantError>>) -> Self {
            Self {
                id: id.into(),
                replies,
                calls: 0,
                seen: Seen::default(),
            }
        }
    }

    impl Participant for Scripted {
        fn id(&self) -> &ParticipantId {
            &self.id
        }

        fn contribute(&mut self, request: &TurnRequest<'_>) -> Result<String, ParticipantError> {
            self.seen.lock().unwrap().push(
                request
                    .visible_context
                    .iter()
                    .map(|c| c.participant.clone())
                    .collect(),
            );
            let reply = self
                .replies
                .get(self.calls)
                .cloned()
                .unwrap_or_else(|| Err(ParticipantError::new("script exhausted")));
            self.calls += 1;
            reply
        }
    }

    fn config(rounds: u32) -> DebateConfig {
        DebateConfig {
            participants: ["A".into(), "B".into()],
            total_rounds: rounds,
            ..DebateConfig::default()
        }
    }

    fn orchestrator(rounds: u32, a: Scripted, b: Scripted) -> DebateOrchestrator {
        DebateOrchestrator::new(config(rounds), vec![Box::new(a), Box::new(b)])
            .unwrap()
            .with_clock(Arc::new(ManualClock::from_epoch()))
    }

    #[test]
    fn test_full_debate() {
        let mut orch = orchestrator(
            4,
            Scripted::new("A", &["sci one", "sci two"]),
            Scripted::new("B", &["phil one", "phil two"]),
        );
        let mut sink = MemorySink::new();
        orch.supply_topic("Is science enough?", &mut sink).unwrap();
        let outcome = orch.run(&mut sink, &AtomicBool::new(false)).unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.transcript.len(), 4);
        assert_eq!(outcome.turns_completed, 4);
        let verdict = outcome.verdict.unwrap();
        assert!(verdict.winner.is_some());
        assert!((0.5..=1.0).contains(&verdict.confidence));
        assert!(sink.warnings().iter().all(|w| w.category() != "repetition"));
        assert_eq!(sink.verdict(), Some(&verdict));
        assert_eq!(orch.phase(), &DebatePhase::Done);
    }

    #[test]
    fn test_step_sequence_and_reducer() {
        let mut orch = orchestrator(
            2,
            Scripted::new("A", &["first words"]),
            Scripted::new("B", &["second words"]),
        );
        let mut sink = MemorySink::new();

        assert!(matches!(orch.step(&mut sink), Err(DebateError::TopicRequired)));
        orch.supply_topic("  A fine topic  ", &mut sink).unwrap();
        assert_eq!(orch.context().topic.as_deref(), Some("A fine topic"));

        let out = orch.step(&mut sink).unwrap();
        assert!(matches!(out, StepOutput::Coordinator { .. }));
        assert_eq!(orch.context().current_speaker, Some("A".into()));
        assert_eq!(orch.phase(), &DebatePhase::ParticipantTurn(Turn::new(1, "A")));

        let out = orch.step(&mut sink).unwrap();
        match out {
            StepOutput::Turn { contribution, attempts, .. } => {
                assert_eq!(contribution.text, "first words");
                assert_eq!(contribution.metadata["argument_length"], 11);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected step output: {:?}", other),
        }
        assert_eq!(orch.context().last_recorded_round, Some(1));

        orch.step(&mut sink).unwrap();
        orch.step(&mut sink).unwrap();
        let out = orch.step(&mut sink).unwrap();
        assert!(matches!(out, StepOutput::Coordinator { next: DebatePhase::Judging, .. }));
        let out = orch.step(&mut sink).unwrap();
        assert!(matches!(out, StepOutput::Judgement { .. }));
        assert!(orch.context().summary.is_some());

        assert!(matches!(orch.step(&mut sink), Err(DebateError::AlreadyComplete)));
    }

    #[test]
    fn test_context_window_excludes_own_text() {
        let a = Scripted::new("A", &["a1", "a2", "a3"]);
        let b = Scripted::new("B", &["b1", "b2", "b3"]);
        let seen_by_a = a.seen.clone();
        let mut cfg = config(6);
        cfg.context_window = 2;
        let mut orch = DebateOrchestrator::new(cfg, vec![Box::new(a), Box::new(b)]).unwrap();
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        orch.run(&mut sink, &AtomicBool::new(false)).unwrap();

        let seen = seen_by_a.lock().unwrap();
        let sizes: Vec<usize> = seen.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![0, 1, 2]);
        assert!(seen.iter().flatten().all(|id| id == "B"));
    }

    #[test]
    fn test_retry_then_success() {
        let a = Scripted::with_replies(
            "A",
            vec![
                Err(ParticipantError::new("model offline")),
                Ok("   ".to_string()),
                Ok("finally an argument".to_string()),
            ],
        );
        let b = Scripted::new("B", &["reply"]);
        let mut orch = orchestrator(2, a, b);
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        orch.step(&mut sink).unwrap();
        let out = orch.step(&mut sink).unwrap();

        assert!(matches!(out, StepOutput::Turn { attempts: 3, .. }));
        let rejections: Vec<_> = sink
            .records()
            .iter()
            .filter(|r| r.kind() == "rejection")
            .collect();
        assert_eq!(rejections.len(), 2);
        assert_eq!(orch.transcript().len(), 1);
    }

    #[test]
    fn test_retries_exhausted_halts_with_partial_verdict() {
        let a = Scripted::new("A", &["opening argument"]);
        let b = Scripted::with_replies("B", vec![]);
        let mut cfg = config(4);
        cfg.max_turn_retries = 1;
        let mut orch = DebateOrchestrator::new(cfg, vec![Box::new(a), Box::new(b)]).unwrap();
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();

        let err = orch.run(&mut sink, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, DebateError::RetriesExhausted { attempts: 2, round: 2, .. }));

        let outcome = orch.outcome().unwrap();
        assert_eq!(outcome.terminal_phase, DebatePhase::Aborted);
        let halt = outcome.halt.unwrap();
        assert_eq!(halt.code, "RETRIES_EXHAUSTED");
        assert_eq!(halt.last_recorded_round, Some(1));
        assert!(!halt.fatal);
        assert_eq!(outcome.verdict.unwrap().winner, Some("A".into()));
        assert_eq!(orch.transcript().len(), 1);
    }

    /// Fails the first contribution it is handed, then behaves like memory.
    #[derive(Default)]
    struct FlakySink {
        inner: MemorySink,
        tripped: bool,
    }

    impl LogSink for FlakySink {
        fn record(&mut self, record: &LogRecord) -> Result<(), crate::debate::SinkError> {
            if matches!(record, LogRecord::Contribution(_)) && !self.tripped {
                self.tripped = true;
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.record(record)
        }
    }

    #[test]
    fn test_sink_failure_after_append_halts_cleanly() {
        let mut orch = orchestrator(
            4,
            Scripted::new("A", &["sci one", "sci two"]),
            Scripted::new("B", &["phil one", "phil two"]),
        );
        let mut sink = FlakySink::default();
        orch.supply_topic("Is science enough?", &mut sink).unwrap();

        let err = orch.run(&mut sink, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, DebateError::Sink(_)));

        let outcome = orch.outcome().unwrap();
        assert_eq!(outcome.terminal_phase, DebatePhase::Aborted);
        let halt = outcome.halt.unwrap();
        assert_eq!(halt.code, "SINK_FAILED");
        assert_eq!(halt.cursor, 1);
        assert_eq!(halt.recorded, 1);
        assert_eq!(orch.transcript().len(), 1);
        assert!(sink
            .inner
            .records()
            .iter()
            .all(|r| !matches!(r, LogRecord::Halt(h) if h.code == "INVARIANT_VIOLATION")));
        assert!(sink.inner.verdict().is_some());
    }

    #[test]
    fn test_cancel_before_first_turn() {
        let mut orch = orchestrator(
            4,
            Scripted::new("A", &["x"]),
            Scripted::new("B", &["y"]),
        );
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        let outcome = orch.run(&mut sink, &AtomicBool::new(true)).unwrap();

        assert!(outcome.was_interrupted());
        assert!(outcome.verdict.is_none());
        assert!(outcome.transcript.is_empty());
        assert!(outcome.summary_line().starts_with("[INTERRUPTED] 0/4"));
    }

    #[test]
    fn test_abort_after_turns_reports_partial_verdict() {
        let mut orch = orchestrator(
            4,
            Scripted::new("A", &["sci one", "sci two"]),
            Scripted::new("B", &["phil one", "phil two"]),
        );
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        for _ in 0..4 {
            orch.step(&mut sink).unwrap();
        }
        assert_eq!(orch.transcript().len(), 2);

        let outcome = orch.abort("operator stop", &mut sink).unwrap();
        assert_eq!(outcome.terminal_phase, DebatePhase::Aborted);
        assert_eq!(outcome.turns_completed, 2);
        let verdict = outcome.verdict.unwrap();
        assert!(verdict.participants.iter().all(|p| p == "A" || p == "B"));

        assert!(matches!(
            orch.abort("again", &mut sink),
            Err(DebateError::AlreadyComplete)
        ));
    }

    #[test]
    fn test_topic_rules() {
        let mut orch = orchestrator(2, Scripted::new("A", &[]), Scripted::new("B", &[]));
        let mut sink = MemorySink::new();
        assert!(matches!(
            orch.supply_topic("   ", &mut sink),
            Err(DebateError::InvalidTopic { .. })
        ));
        orch.supply_topic("topic", &mut sink).unwrap();
        assert!(matches!(
            orch.supply_topic("another", &mut sink),
            Err(DebateError::Transition(_))
        ));
    }

    #[test]
    fn test_participant_registration() {
        let err = DebateOrchestrator::new(config(2), vec![Box::new(Scripted::new("A", &[]))])
            .err()
            .unwrap();
        assert!(matches!(err, DebateError::UnknownParticipant(id) if id == "B"));

        let err = DebateOrchestrator::new(
            config(2),
            vec![
                Box::new(Scripted::new("A", &[])),
                Box::new(Scripted::new("A", &[])),
            ],
        )
        .err()
        .unwrap();
        assert!(matches!(err, DebateError::DuplicateParticipant(_)));

        let err = DebateOrchestrator::new(
            config(2),
            vec![
                Box::new(Scripted::new("A", &[])),
                Box::new(Scripted::new("C", &[])),
            ],
        )
        .err()
        .unwrap();
        assert!(matches!(err, DebateError::UnknownParticipant(id) if id == "C"));
    }

    #[test]
    fn test_participants_seated_by_config_order() {
        let mut orch = DebateOrchestrator::new(
            config(2),
            vec![
                Box::new(Scripted::new("B", &["from b"])),
                Box::new(Scripted::new("A", &["from a"])),
            ],
        )
        .unwrap();
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        let outcome = orch.run(&mut sink, &AtomicBool::new(false)).unwrap();
        assert_eq!(outcome.transcript[0].text, "from a");
        assert_eq!(outcome.transcript[1].text, "from b");
    }

    #[test]
    fn test_checkpoint_and_resume() {
        let mut orch = orchestrator(
            4,
            Scripted::new("A", &["sci one", "sci two"]),
            Scripted::new("B", &["phil one", "phil two"]),
        );
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        for _ in 0..4 {
            orch.step(&mut sink).unwrap();
        }
        let checkpoint = orch.checkpoint("interrupted");
        assert_eq!(checkpoint.sequence, 1);
        assert_eq!(checkpoint.cursor, 2);

        let mut resumed = DebateOrchestrator::resume(
            checkpoint,
            vec![
                Box::new(Scripted::new("A", &["sci two"])),
                Box::new(Scripted::new("B", &["phil two"])),
            ],
        )
        .unwrap();
        let outcome = resumed.run(&mut sink, &AtomicBool::new(false)).unwrap();
        assert!(outcome.is_success());
        let texts: Vec<&str> = outcome.transcript.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["sci one", "phil one", "sci two", "phil two"]);
    }

    #[test]
    fn test_resume_rejects_terminal_checkpoint() {
        let mut orch = orchestrator(2, Scripted::new("A", &["a"]), Scripted::new("B", &["b"]));
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        orch.run(&mut sink, &AtomicBool::new(false)).unwrap();
        let checkpoint = orch.checkpoint("done");

        let err = DebateOrchestrator::resume(
            checkpoint,
            vec![
                Box::new(Scripted::new("A", &[])),
                Box::new(Scripted::new("B", &[])),
            ],
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            DebateError::Checkpoint(PersistenceError::TerminalCheckpoint { .. })
        ));
    }

    #[test]
    fn test_transitions_logged_in_order() {
        let mut orch = orchestrator(2, Scripted::new("A", &["a"]), Scripted::new("B", &["b"]));
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        orch.run(&mut sink, &AtomicBool::new(false)).unwrap();

        let logged: Vec<DebateTransition> = sink
            .records()
            .iter()
            .filter_map(|r| match r {
                LogRecord::Transition(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(logged, orch.transitions());
        assert_eq!(logged.first().unwrap().from, DebatePhase::AwaitingTopic);
        assert_eq!(logged.last().unwrap().to, DebatePhase::Done);
        for pair in logged.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn test_outcome_summary_line() {
        let mut orch = orchestrator(2, Scripted::new("A", &["a"]), Scripted::new("B", &["b"]));
        assert!(orch.outcome().is_none());
        let mut sink = MemorySink::new();
        orch.supply_topic("topic", &mut sink).unwrap();
        let outcome = orch.run(&mut sink, &AtomicBool::new(false)).unwrap();
        let line = outcome.summary_line();
        assert!(line.starts_with("[DONE] 2/2 turns"));
        assert!(line.contains("winner=A"));
    }
}
