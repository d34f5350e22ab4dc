//! Append-only transcript of debate contributions.
//!
//! The store never rejects an append; ordering is enforced upstream by the
//! turn coordinator. Callers only ever receive clones, so nothing outside
//! the store can mutate a recorded contribution.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::DebateError;
use super::schedule::ParticipantId;

/// Source of recording timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock: starts at a fixed instant and moves forward by a
/// fixed step on every reading.
#[derive(Debug)]
pub struct ManualClock {
    start: DateTime<Utc>,
    step_ms: i64,
    ticks: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, step_ms: i64) -> Self {
        Self {
            start,
            step_ms,
            ticks: AtomicI64::new(0),
        }
    }

    /// Unix epoch, one second per reading.
    pub fn from_epoch() -> Self {
        Self::new(DateTime::<Utc>::default(), 1_000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::milliseconds(tick * self.step_ms)
    }
}

/// One participant's recorded text for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub round: u32,
    pub participant: ParticipantId,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Participant output awaiting validation and append.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionDraft {
    pub round: u32,
    pub participant: ParticipantId,
    pub text: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContributionDraft {
    pub fn new(round: u32, participant: impl Into<ParticipantId>, text: impl Into<String>) -> Self {
        Self {
            round,
            participant: participant.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Reject drafts missing a required field.
    pub fn validate(&self) -> Result<(), DebateError> {
        let reason = if self.round == 0 {
            "round must be 1 or greater"
        } else if self.participant.as_str().trim().is_empty() {
            "participant id is empty"
        } else if self.text.trim().is_empty() {
            "text is empty"
        } else {
            return Ok(());
        };
        Err(DebateError::MalformedContribution {
            reason: format!("{} (round {})", reason, self.round),
        })
    }
}

/// The ordered record of every contribution.
pub struct Transcript {
    entries: Vec<Contribution>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Empty transcript stamped with wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            clock,
        }
    }

    /// Rebuild a transcript from previously recorded entries.
    pub fn from_entries(entries: Vec<Contribution>, clock: Box<dyn Clock>) -> Self {
        Self { entries, clock }
    }

    /// Record a contribution and return a copy of what was stored.
    pub fn append(&mut self, draft: ContributionDraft) -> Contribution {
        let contribution = Contribution {
            round: draft.round,
            participant: draft.participant,
            text: draft.text,
            recorded_at: self.clock.now(),
            metadata: draft.metadata,
        };
        self.entries.push(contribution.clone());
        contribution
    }

    /// The most recent `limit` contributions by anyone other than
    /// `participant`, oldest first.
    pub fn slice_excluding(&self, participant: &ParticipantId, limit: usize) -> Vec<Contribution> {
        let others: Vec<&Contribution> = self
            .entries
            .iter()
            .filter(|c| &c.participant != participant)
            .collect();
        let skip = others.len().saturating_sub(limit);
        others.into_iter().skip(skip).cloned().collect()
    }

    /// Snapshot of every contribution.
    pub fn all(&self) -> Vec<Contribution> {
        self.entries.clone()
    }

    /// Borrowed view of every contribution.
    pub fn entries(&self) -> &[Contribution] {
        &self.entries
    }

    pub fn for_round(&self, round: u32) -> Vec<Contribution> {
        self.entries
            .iter()
            .filter(|c| c.round == round)
            .cloned()
            .collect()
    }

    pub fn by_participant(&self, participant: &ParticipantId) -> Vec<Contribution> {
        self.entries
            .iter()
            .filter(|c| &c.participant == participant)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Round of the latest contribution, if any.
    pub fn last_round(&self) -> Option<u32> {
        self.entries.last().map(|c| c.round)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Parse entries previously produced by [`Transcript::to_json`].
    pub fn entries_from_json(json: &str) -> Result<Vec<Contribution>, serde_json::Error> {
        serde_json::from_str(json)
    }
}
