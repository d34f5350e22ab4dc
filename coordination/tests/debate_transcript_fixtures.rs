//! Golden transcript fixtures — deterministic debates whose verdict,
//! justification and summary text must not drift.
//!
//! Each fixture runs a full scripted debate and compares the exact report
//! output.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use coordination::debate::{
    DebateConfig, DebateOrchestrator, DebateOutcome, ManualClock, MemorySink, Participant,
    ParticipantError, ParticipantId, TurnPolicy, TurnRequest,
};

struct Lines {
    id: ParticipantId,
    lines: Vec<&'static str>,
}

impl Participant for Lines {
    fn id(&self) -> &ParticipantId {
        &self.id
    }

    fn contribute(&mut self, request: &TurnRequest<'_>) -> Result<String, ParticipantError> {
        // Alternating seats: rounds 1-2 are everyone's first line, 3-4 the second.
        let idx = (request.round.saturating_sub(1) / 2) as usize;
        self.lines
            .get(idx)
            .map(|l| l.to_string())
            .ok_or_else(|| ParticipantError::new("no line for round"))
    }
}

fn debate(
    topic: &str,
    rounds: u32,
    a: Vec<&'static str>,
    b: Vec<&'static str>,
) -> DebateOutcome {
    let config = DebateConfig {
        participants: ["A".into(), "B".into()],
        total_rounds: rounds,
        policy: TurnPolicy::Alternating,
        ..DebateConfig::default()
    };
    let mut orch = DebateOrchestrator::new(
        config,
        vec![
            Box::new(Lines { id: "A".into(), lines: a }),
            Box::new(Lines { id: "B".into(), lines: b }),
        ],
    )
    .unwrap()
    .with_clock(Arc::new(ManualClock::from_epoch()));
    let mut sink = MemorySink::new();
    orch.supply_topic(topic, &mut sink).unwrap();
    orch.run(&mut sink, &AtomicBool::new(false)).unwrap()
}

// ── Fixture: four-round scenario ───────────────────────────────────

#[test]
fn fixture_four_round_justification() {
    let outcome = debate(
        "Science or philosophy?",
        4,
        vec!["sci one", "sci two"],
        vec!["phil one", "phil two"],
    );
    let verdict = outcome.verdict.unwrap();

    let expected = "\
WINNER: B

JUSTIFICATION:

A Performance:
  - Vocabulary Richness: 0.750
  - Consistency: 1.000
  - Average Argument Length: 7.0 characters
  - Logical Progression: 0.000
  - Final Score: 0.349

B Performance:
  - Vocabulary Richness: 0.750
  - Consistency: 1.000
  - Average Argument Length: 8.0 characters
  - Logical Progression: 0.000
  - Final Score: 0.350

B emerged victorious with a final score of 0.350.
Key strengths: rich and varied vocabulary, consistent argumentation style.";

    assert_eq!(verdict.justification, expected);
    assert_eq!(verdict.winner, Some("B".into()));
    assert!((verdict.confidence - 0.5006).abs() < 1e-9);
}

#[test]
fn fixture_four_round_summary() {
    let outcome = debate(
        "Science or philosophy?",
        4,
        vec!["sci one", "sci two"],
        vec!["phil one", "phil two"],
    );
    let rule = "=".repeat(80);
    let expected = format!(
        "{rule}\nDEBATE SUMMARY\n{rule}\nTopic: Science or philosophy?\nTotal Rounds: 4\n\n\
DEBATE TRANSCRIPT:\n\n\
Round 1 — A: sci one\n\
Round 2 — B: phil one\n\
Round 3 — A: sci two\n\
Round 4 — B: phil two",
        rule = rule
    );
    assert_eq!(outcome.summary.unwrap(), expected);
}

// ── Fixture: one round only ────────────────────────────────────────

#[test]
fn fixture_single_contribution() {
    let outcome = debate("A single opening statement", 1, vec!["only voice here"], vec![]);
    let verdict = outcome.verdict.unwrap();

    // One participant: full confidence, neutral progression.
    assert_eq!(verdict.winner, Some("A".into()));
    assert_eq!(verdict.confidence, 1.0);
    assert_eq!(verdict.participants, vec![ParticipantId::from("A")]);
    assert!(verdict
        .justification
        .contains("  - Logical Progression: 0.500"));
    assert!(!verdict.justification.contains("B Performance"));
}

// ── Fixture: growing arguments earn progression ────────────────────

#[test]
fn fixture_progression_strength() {
    let a = vec![
        "energy policy must weigh cost safety emissions and reliability",
        "energy policy must weigh cost safety emissions and reliability across decades of grid planning",
    ];
    let b = vec!["no", "still no"];
    let outcome = debate("Energy policy for the next decade", 4, a, b);
    let verdict = outcome.verdict.unwrap();

    assert_eq!(verdict.winner, Some("A".into()));
    assert!((verdict.progression_scores[&ParticipantId::from("A")] - 1.0).abs() < 1e-9);
    assert!(verdict
        .justification
        .ends_with("strong logical progression."));
}
