//! Structured debate log records and the sink they are written to.
//!
//! Every record is plain data (ids, numbers, strings, nested structs) so
//! any sink can serialize it independently of the others.

use serde::{Deserialize, Serialize};

use super::coordinator::CoordinatorStatus;
use super::error::SinkError;
use super::guardrails::AnomalyWarning;
use super::judge::Verdict;
use super::schedule::ParticipantId;
use super::state::{DebatePhase, DebateTransition};
use super::transcript::Contribution;

/// Why the debate stopped before producing a normal verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltReport {
    /// Machine-readable error code, or `INTERRUPTED` for a cancel.
    pub code: String,
    pub reason: String,
    /// Phase the driver was in when it halted.
    pub phase: DebatePhase,
    /// Round of the last contribution that made it into the transcript.
    pub last_recorded_round: Option<u32>,
    pub cursor: usize,
    pub recorded: usize,
    /// Corrupted state rather than an expected failure.
    pub fatal: bool,
}

impl std::fmt::Display for HaltReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = self
            .last_recorded_round
            .map_or_else(|| "none".to_string(), |r| r.to_string());
        write!(
            f,
            "halted in {} [{}]: {} (last recorded round: {}, {} contributions)",
            self.phase, self.code, self.reason, last, self.recorded
        )
    }
}

/// One entry in the structured debate log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LogRecord {
    #[serde(rename = "state_transition")]
    Transition(DebateTransition),
    #[serde(rename = "coordinator_status")]
    Status(CoordinatorStatus),
    Warning(AnomalyWarning),
    Contribution(Contribution),
    /// A participant's output was refused and the turn will be retried.
    Rejection {
        participant: ParticipantId,
        round: u32,
        attempt: u32,
        code: String,
        reason: String,
    },
    Halt(HaltReport),
    #[serde(rename = "final_verdict")]
    Verdict(Verdict),
}

impl LogRecord {
    /// The record's `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transition(_) => "state_transition",
            Self::Status(_) => "coordinator_status",
            Self::Warning(_) => "warning",
            Self::Contribution(_) => "contribution",
            Self::Rejection { .. } => "rejection",
            Self::Halt(_) => "halt",
            Self::Verdict(_) => "final_verdict",
        }
    }
}

/// Receiver for the structured debate log.
pub trait LogSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<LogRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// `type` tags in arrival order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.records.iter().map(LogRecord::kind).collect()
    }

    pub fn contributions(&self) -> Vec<&Contribution> {
        self.records
            .iter()
            .filter_map(|r| match r {
                LogRecord::Contribution(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&AnomalyWarning> {
        self.records
            .iter()
            .filter_map(|r| match r {
                LogRecord::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.records.iter().rev().find_map(|r| match r {
            LogRecord::Verdict(v) => Some(v),
            _ => None,
        })
    }
}

impl LogSink for MemorySink {
    fn record(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}
