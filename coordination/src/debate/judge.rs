//! Evaluation engine — lexical scoring of a finished (or partial) debate.
//!
//! The judge looks only at structural signals: length, vocabulary, length
//! stability, and word carry-over between a participant's consecutive
//! contributions. Every weight below is a fixed policy constant; changing
//! one changes verdicts, so golden fixtures pin them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::guardrails::group_by_participant;
use super::lexical::{char_len, shared_words, word_set, words};
use super::report;
use super::schedule::ParticipantId;
use super::transcript::Contribution;

/// Label used when nobody can be declared the winner.
pub const NO_WINNER: &str = "No winner";

/// Length-variance divisor in the consistency score. A fixed scaling
/// constant, not derived from data.
pub const VARIANCE_SCALE: f64 = 1000.0;

/// Average length (characters) at which the length component saturates.
pub const LENGTH_SCALE: f64 = 200.0;

/// Contribution count treated as a full share of the count component.
pub const REFERENCE_TURNS: f64 = 4.0;

const W_VOCABULARY: f64 = 0.3;
const W_CONSISTENCY: f64 = 0.2;
const W_LENGTH: f64 = 0.2;
const W_COUNT: f64 = 0.3;

const W_COMPOSITE: f64 = 0.6;
const W_PROGRESSION: f64 = 0.4;

/// Shared words needed between consecutive contributions to count as
/// building on the previous argument.
const CARRY_OVER_WORDS: usize = 5;
const CARRY_OVER_CREDIT: f64 = 0.5;
const GROWTH_CREDIT: f64 = 0.3;

/// Progression score for a participant with a single contribution.
pub const NEUTRAL_PROGRESSION: f64 = 0.5;

/// Per-participant quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean contribution length in characters.
    pub avg_length: f64,
    /// Number of contributions.
    pub count: usize,
    /// Unique words / total words across all contributions.
    pub vocabulary_richness: f64,
    /// `1 / (1 + variance(lengths) / 1000)`; 1.0 with fewer than two.
    pub consistency_score: f64,
}

impl QualityMetrics {
    /// Weighted quality composite, before progression is blended in.
    pub fn composite(&self) -> f64 {
        self.vocabulary_richness * W_VOCABULARY
            + self.consistency_score * W_CONSISTENCY
            + (self.avg_length / LENGTH_SCALE).min(1.0) * W_LENGTH
            + (self.count as f64 / REFERENCE_TURNS) * W_COUNT
    }
}

/// The judge's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// `None` when the transcript was empty.
    pub winner: Option<ParticipantId>,
    /// Margin-based confidence in [0, 1].
    pub confidence: f64,
    pub final_scores: BTreeMap<ParticipantId, f64>,
    pub quality_analysis: BTreeMap<ParticipantId, QualityMetrics>,
    pub progression_scores: BTreeMap<ParticipantId, f64>,
    /// Participants in order of first appearance in the transcript.
    pub participants: Vec<ParticipantId>,
    pub justification: String,
}

impl Verdict {
    /// Verdict for an empty transcript.
    pub fn undecided() -> Self {
        let mut verdict = Self {
            winner: None,
            confidence: 0.0,
            final_scores: BTreeMap::new(),
            quality_analysis: BTreeMap::new(),
            progression_scores: BTreeMap::new(),
            participants: Vec::new(),
            justification: String::new(),
        };
        verdict.justification = report::justification(&verdict);
        verdict
    }

    /// Winner id, or [`NO_WINNER`].
    pub fn winner_label(&self) -> &str {
        self.winner
            .as_ref()
            .map(ParticipantId::as_str)
            .unwrap_or(NO_WINNER)
    }

    pub fn score_of(&self, participant: &ParticipantId) -> Option<f64> {
        self.final_scores.get(participant).copied()
    }
}

/// Stateless scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Judge;

impl Judge {
    pub fn new() -> Self {
        Self
    }

    /// Quality metrics over one participant's texts.
    pub fn quality<S: AsRef<str>>(&self, texts: &[S]) -> QualityMetrics {
        if texts.is_empty() {
            return QualityMetrics {
                avg_length: 0.0,
                count: 0,
                vocabulary_richness: 0.0,
                consistency_score: 0.0,
            };
        }

        let lengths: Vec<f64> = texts
            .iter()
            .map(|t| char_len(t.as_ref()) as f64)
            .collect();
        let n = lengths.len() as f64;
        let avg_length = lengths.iter().sum::<f64>() / n;

        let all_words: Vec<String> = texts.iter().flat_map(|t| words(t.as_ref())).collect();
        let vocabulary_richness = if all_words.is_empty() {
            0.0
        } else {
            let unique: std::collections::HashSet<&String> = all_words.iter().collect();
            unique.len() as f64 / all_words.len() as f64
        };

        let consistency_score = if texts.len() > 1 {
            let variance = lengths
                .iter()
                .map(|l| (l - avg_length).powi(2))
                .sum::<f64>()
                / n;
            1.0 / (1.0 + variance / VARIANCE_SCALE)
        } else {
            1.0
        };

        QualityMetrics {
            avg_length,
            count: texts.len(),
            vocabulary_richness,
            consistency_score,
        }
    }

    /// How well each participant builds on its own previous contribution.
    pub fn progression(&self, transcript: &[Contribution]) -> BTreeMap<ParticipantId, f64> {
        group_by_participant(transcript)
            .into_iter()
            .map(|(participant, entries)| {
                if entries.len() < 2 {
                    return (participant.clone(), NEUTRAL_PROGRESSION);
                }

                let raw: f64 = entries
                    .windows(2)
                    .map(|pair| {
                        let (prev, curr) = (&pair[0].text, &pair[1].text);
                        let mut credit = 0.0;
                        if shared_words(&word_set(prev), &word_set(curr)) > CARRY_OVER_WORDS {
                            credit += CARRY_OVER_CREDIT;
                        }
                        if char_len(curr) > char_len(prev) {
                            credit += GROWTH_CREDIT;
                        }
                        credit
                    })
                    .sum();

                let max_possible = (entries.len() - 1) as f64 * (CARRY_OVER_CREDIT + GROWTH_CREDIT);
                (participant.clone(), (raw / max_possible).clamp(0.0, 1.0))
            })
            .collect()
    }

    /// Score every participant and pick a winner.
    ///
    /// Ties on the final score go to the participant that spoke first in
    /// the transcript, which under a fixed schedule is always the same seat.
    pub fn decide(&self, transcript: &[Contribution]) -> Verdict {
        let groups = group_by_participant(transcript);
        if groups.is_empty() {
            return Verdict::undecided();
        }

        let progression_scores = self.progression(transcript);
        let mut participants = Vec::with_capacity(groups.len());
        let mut quality_analysis = BTreeMap::new();
        let mut final_scores = BTreeMap::new();

        for (participant, entries) in &groups {
            let texts: Vec<&str> = entries.iter().map(|c| c.text.as_str()).collect();
            let quality = self.quality(&texts);
            let progression = progression_scores
                .get(*participant)
                .copied()
                .unwrap_or(NEUTRAL_PROGRESSION);
            let score = quality.composite() * W_COMPOSITE + progression * W_PROGRESSION;

            participants.push((*participant).clone());
            quality_analysis.insert((*participant).clone(), quality);
            final_scores.insert((*participant).clone(), score);
        }

        let mut winner = &participants[0];
        let mut best = final_scores[winner];
        for candidate in &participants[1..] {
            let score = final_scores[candidate];
            if score > best {
                winner = candidate;
                best = score;
            }
        }

        let runner_up = participants
            .iter()
            .filter(|p| *p != winner)
            .map(|p| final_scores[p])
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
        let confidence = match runner_up {
            Some(second) => (0.5 + (best - second)).min(1.0),
            None => 1.0,
        };

        let mut verdict = Verdict {
            winner: Some(winner.clone()),
            confidence,
            final_scores,
            quality_analysis,
            progression_scores,
            participants,
            justification: String::new(),
        };
        verdict.justification = report::justification(&verdict);
        verdict
    }

    /// Human-readable transcript dump.
    pub fn summary(&self, transcript: &[Contribution], topic: &str) -> String {
        report::summary(transcript, topic)
    }
}
