//! Debate Coordination Library
//!
//! This library provides the core of a turn-based, two-party debate:
//! - Turn coordinator enforcing a fixed alternating schedule
//! - Append-only transcript store with an injectable clock
//! - Repetition and topic-drift guardrails
//! - Judge scoring transcripts on lexical signals and writing a justification
//! - Step-wise driver with structured log records, abort and checkpoint/resume
//!
//! Participants, topic acquisition and log file formats live outside this
//! crate and plug in through [`debate::Participant`] and [`debate::LogSink`].
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use coordination::debate::{DebateConfig, DebateOrchestrator, MemorySink, Participant};
//!
//! # fn participants() -> Vec<Box<dyn Participant>> { unimplemented!() }
//! let mut debate = DebateOrchestrator::new(DebateConfig::default(), participants())?;
//! let mut sink = MemorySink::new();
//! debate.supply_topic("Should cities ban cars downtown?", &mut sink)?;
//! let outcome = debate.run(&mut sink, &AtomicBool::new(false))?;
//! println!("{}", outcome.summary_line());
//! # Ok::<(), coordination::debate::DebateError>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod debate;

// Re-export key debate types
pub use debate::{
    Contribution, DebateCheckpoint, DebateConfig, DebateError, DebateOrchestrator, DebateOutcome,
    Judge, LogRecord, LogSink, Participant, ParticipantId, Transcript, TurnCoordinator, Verdict,
};
