//! Debate Orchestration — fixed-length two-party debate
//!
//! Two participants alternate over a fixed schedule of turns. The turn
//! coordinator gates every contribution, the transcript store records it,
//! guardrails flag repetition and topic drift, and the judge scores the
//! finished (or partial) transcript.
//!
//! # Debate Flow
//!
//! ```text
//! AwaitingTopic → Coordinating ──route()──┬─ next turn → ParticipantTurn(turn)
//!   │                 ▲                   │                 │
//!   │                 └───────────────────┼─────────────────┘
//!   │                   (append, detect, advance)
//!   │                                     └─ complete → Judging → Done
//!   │
//!   └─ cancel / clean halt at any point → Aborted (partial verdict)
//! ```

pub mod coordinator;
pub mod error;
pub mod guardrails;
pub mod judge;
pub mod lexical;
pub mod log;
pub mod orchestrator;
pub mod persistence;
pub mod report;
pub mod schedule;
pub mod state;
pub mod transcript;

pub use coordinator::{CoordinatorStatus, TurnCoordinator};
pub use error::{DebateError, ParticipantError, SinkError, TurnViolation};
pub use guardrails::{AnomalyWarning, DRIFT_FLOOR, REPETITION_THRESHOLD};
pub use judge::{Judge, QualityMetrics, Verdict, NO_WINNER};
pub use log::{HaltReport, LogRecord, LogSink, MemorySink};
pub use orchestrator::{
    DebateConfig, DebateContext, DebateOrchestrator, DebateOutcome, Participant, StepOutput,
    TurnRequest, INTERRUPTED,
};
pub use persistence::{validate_checkpoint, DebateCheckpoint, IntegrityStatus, PersistenceError};
pub use schedule::{
    build_schedule, ParticipantId, Seat, Turn, TurnPolicy, DEFAULT_TOTAL_ROUNDS, MAX_TOTAL_ROUNDS,
};
pub use state::{route, DebatePhase, DebateTransition, PhaseMachine, Route, TransitionError};
pub use transcript::{Clock, Contribution, ContributionDraft, ManualClock, SystemClock, Transcript};
