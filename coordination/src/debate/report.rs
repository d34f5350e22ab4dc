//! Text reports: verdict justification and transcript summary.
//!
//! Both outputs are golden-tested; keep field order, labels and numeric
//! precision stable.

use super::judge::Verdict;
use super::transcript::Contribution;

const RULE_WIDTH: usize = 80;

const RICH_VOCABULARY: f64 = 0.5;
const CONSISTENT_STYLE: f64 = 0.7;
const STRONG_PROGRESSION: f64 = 0.6;

/// Justification for a verdict over an empty transcript.
pub const EMPTY_JUSTIFICATION: &str = "No arguments found in memory.";

/// Per-participant metric breakdown followed by the winner narrative.
pub fn justification(verdict: &Verdict) -> String {
    if verdict.participants.is_empty() {
        return EMPTY_JUSTIFICATION.to_string();
    }

    let mut lines = vec![
        format!("WINNER: {}", verdict.winner_label()),
        String::new(),
        "JUSTIFICATION:".to_string(),
        String::new(),
    ];

    for participant in &verdict.participants {
        let quality = verdict.quality_analysis.get(participant);
        let progression = verdict
            .progression_scores
            .get(participant)
            .copied()
            .unwrap_or(0.0);
        let final_score = verdict.score_of(participant).unwrap_or(0.0);

        lines.push(format!("{} Performance:", participant));
        lines.push(format!(
            "  - Vocabulary Richness: {:.3}",
            quality.map_or(0.0, |q| q.vocabulary_richness)
        ));
        lines.push(format!(
            "  - Consistency: {:.3}",
            quality.map_or(0.0, |q| q.consistency_score)
        ));
        lines.push(format!(
            "  - Average Argument Length: {:.1} characters",
            quality.map_or(0.0, |q| q.avg_length)
        ));
        lines.push(format!("  - Logical Progression: {:.3}", progression));
        lines.push(format!("  - Final Score: {:.3}", final_score));
        lines.push(String::new());
    }

    if let Some(winner) = &verdict.winner {
        if let Some(score) = verdict.score_of(winner) {
            lines.push(format!(
                "{} emerged victorious with a final score of {:.3}.",
                winner, score
            ));

            let mut strengths = Vec::new();
            if let Some(quality) = verdict.quality_analysis.get(winner) {
                if quality.vocabulary_richness > RICH_VOCABULARY {
                    strengths.push("rich and varied vocabulary");
                }
                if quality.consistency_score > CONSISTENT_STYLE {
                    strengths.push("consistent argumentation style");
                }
            }
            if verdict
                .progression_scores
                .get(winner)
                .is_some_and(|p| *p > STRONG_PROGRESSION)
            {
                strengths.push("strong logical progression");
            }

            if !strengths.is_empty() {
                lines.push(format!("Key strengths: {}.", strengths.join(", ")));
            }
        }
    }

    lines.join("\n")
}

/// Topic header, round count, then one line per contribution.
pub fn summary(transcript: &[Contribution], topic: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "DEBATE SUMMARY".to_string(),
        rule,
        format!("Topic: {}", topic),
        format!("Total Rounds: {}", transcript.len()),
        String::new(),
        "DEBATE TRANSCRIPT:".to_string(),
        String::new(),
    ];
    lines.extend(
        transcript
            .iter()
            .map(|c| format!("Round {} — {}: {}", c.round, c.participant, c.text)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::judge::Judge;
    use crate::debate::transcript::{ContributionDraft, ManualClock, Transcript};

    fn transcript() -> Vec<Contribution> {
        let mut t = Transcript::with_clock(Box::new(ManualClock::from_epoch()));
        t.append(ContributionDraft::new(1, "AgentA", "First argument"));
        t.append(ContributionDraft::new(2, "AgentB", "Second argument"));
        t.all()
    }

    #[test]
    fn test_summary_lists_every_round() {
        let text = summary(&transcript(), "Test Topic");
        assert!(text.contains("Topic: Test Topic"));
        assert!(text.contains("Total Rounds: 2"));
        assert!(text.contains("Round 1 — AgentA: First argument"));
        assert!(text.ends_with("Round 2 — AgentB: Second argument"));
    }

    #[test]
    fn test_summary_of_empty_transcript() {
        let text = summary(&[], "Nothing said");
        assert!(text.contains("Total Rounds: 0"));
        assert!(text.ends_with("DEBATE TRANSCRIPT:\n"));
    }

    #[test]
    fn test_justification_sections() {
        let verdict = Judge.decide(&transcript());
        let text = &verdict.justification;
        assert!(text.starts_with("WINNER: "));
        assert!(text.contains("JUSTIFICATION:"));
        assert!(text.contains("AgentA Performance:"));
        assert!(text.contains("AgentB Performance:"));
        assert!(text.contains("emerged victorious"));
        assert!(text.len() > 100);
    }

    #[test]
    fn test_strengths_only_for_winner() {
        let verdict = Judge.decide(&transcript());
        let strengths: Vec<&str> = verdict
            .justification
            .lines()
            .filter(|l| l.starts_with("Key strengths"))
            .collect();
        assert!(strengths.len() <= 1);
    }

    #[test]
    fn test_undecided_justification() {
        let verdict = Judge.decide(&[]);
        assert_eq!(verdict.justification, EMPTY_JUSTIFICATION);
    }
}
