//! Anomaly guardrails: repetition and topic-drift detection.
//!
//! Both detectors are advisory. They never block a turn or change a
//! validation result; the driver only forwards their warnings to the log.
//!
//! Repetition is a pairwise check over each participant's own
//! contributions, O(k²) for k contributions. With the default eight-round
//! schedule k is at most four, so this is a cheap heuristic and not a
//! content-deduplication algorithm; it does not scale to long transcripts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::lexical::{overlap_of_base, overlap_of_smaller, word_set};
use super::schedule::ParticipantId;
use super::transcript::Contribution;

/// Word-set overlap above which two contributions by the same participant
/// are flagged as repeated.
pub const REPETITION_THRESHOLD: f64 = 0.8;

/// Share of the opening contribution's vocabulary below which a later
/// contribution is flagged as drifting off topic.
pub const DRIFT_FLOOR: f64 = 0.1;

/// An advisory warning raised while inspecting the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyWarning {
    /// Two contributions by the same participant share most of their words.
    Repetition {
        participant: ParticipantId,
        /// Per-participant turn indices (1-based).
        turns: [usize; 2],
        /// Debate rounds of the two contributions.
        rounds: [u32; 2],
        overlap_ratio: f64,
    },
    /// A contribution shares almost nothing with the opening contribution.
    TopicDrift {
        participant: ParticipantId,
        round: u32,
        overlap_ratio: f64,
    },
}

impl AnomalyWarning {
    /// Short category label.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Repetition { .. } => "repetition",
            Self::TopicDrift { .. } => "coherence",
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        match self {
            Self::Repetition { participant, .. } | Self::TopicDrift { participant, .. } => {
                participant
            }
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Self::Repetition {
                participant,
                turns,
                overlap_ratio,
                ..
            } => format!(
                "{} may have repeated similar arguments in turns {} and {} (overlap {:.2})",
                participant, turns[0], turns[1], overlap_ratio
            ),
            Self::TopicDrift { round, .. } => {
                format!("Round {}: Possible topic drift detected", round)
            }
        }
    }
}

impl std::fmt::Display for AnomalyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category(), self.message())
    }
}

/// Group contributions by participant, keeping first-appearance order.
pub(crate) fn group_by_participant(transcript: &[Contribution]) -> Vec<(&ParticipantId, Vec<&Contribution>)> {
    let mut groups: Vec<(&ParticipantId, Vec<&Contribution>)> = Vec::new();
    for entry in transcript {
        match groups.iter().position(|(id, _)| *id == &entry.participant) {
            Some(idx) => groups[idx].1.push(entry),
            None => groups.push((&entry.participant, vec![entry])),
        }
    }
    groups
}

/// Flag pairs of same-participant contributions whose word-set overlap
/// (relative to the smaller set) exceeds [`REPETITION_THRESHOLD`].
pub fn detect_repetition(transcript: &[Contribution]) -> Vec<AnomalyWarning> {
    let mut warnings = Vec::new();

    for (participant, entries) in group_by_participant(transcript) {
        let sets: Vec<HashSet<String>> = entries.iter().map(|c| word_set(&c.text)).collect();
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                let Some(overlap) = overlap_of_smaller(&sets[i], &sets[j]) else {
                    continue;
                };
                if overlap > REPETITION_THRESHOLD {
                    warnings.push(AnomalyWarning::Repetition {
                        participant: participant.clone(),
                        turns: [i + 1, j + 1],
                        rounds: [entries[i].round, entries[j].round],
                        overlap_ratio: overlap,
                    });
                }
            }
        }
    }

    warnings
}

/// Flag contributions sharing less than [`DRIFT_FLOOR`] of the opening
/// contribution's vocabulary.
pub fn detect_topic_drift(transcript: &[Contribution]) -> Vec<AnomalyWarning> {
    let Some((first, rest)) = transcript.split_first() else {
        return Vec::new();
    };
    let opening = word_set(&first.text);

    rest.iter()
        .filter_map(|entry| {
            let overlap = overlap_of_base(&opening, &word_set(&entry.text))?;
            (overlap < DRIFT_FLOOR).then(|| AnomalyWarning::TopicDrift {
                participant: entry.participant.clone(),
                round: entry.round,
                overlap_ratio: overlap,
            })
        })
        .collect()
}
