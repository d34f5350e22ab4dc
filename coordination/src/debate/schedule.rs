//! Participants, turns, and the fixed turn schedule.

use serde::{Deserialize, Serialize};

use super::error::DebateError;

/// Default number of scheduled turns in a debate.
pub const DEFAULT_TOTAL_ROUNDS: u32 = 8;

/// Upper bound on scheduled turns. The whole schedule is built up front.
pub const MAX_TOTAL_ROUNDS: u32 = 1_000;

/// Identifier of a debate participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ParticipantId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ParticipantId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A scheduled (round, participant) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// Round number (1-indexed).
    pub round: u32,
    /// Who speaks in this round.
    pub participant: ParticipantId,
}

impl Turn {
    pub fn new(round: u32, participant: impl Into<ParticipantId>) -> Self {
        Self {
            round,
            participant: participant.into(),
        }
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round {} ({})", self.round, self.participant)
    }
}

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    First,
    Second,
}

/// Rule assigning rounds to seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "seats")]
pub enum TurnPolicy {
    /// Odd rounds go to the first seat, even rounds to the second.
    #[default]
    Alternating,
    /// Odd rounds go to the second seat, even rounds to the first.
    SecondOpens,
    /// Explicit seat pattern, cycled over the rounds.
    Pattern(Vec<Seat>),
}

impl TurnPolicy {
    /// Seat speaking in `round` (1-indexed). `None` for an empty pattern.
    pub fn seat_for(&self, round: u32) -> Option<Seat> {
        match self {
            Self::Alternating => Some(if round % 2 == 1 {
                Seat::First
            } else {
                Seat::Second
            }),
            Self::SecondOpens => Some(if round % 2 == 1 {
                Seat::Second
            } else {
                Seat::First
            }),
            Self::Pattern(seats) => {
                if seats.is_empty() {
                    return None;
                }
                let idx = (round.saturating_sub(1) as usize) % seats.len();
                Some(seats[idx])
            }
        }
    }

    /// Parse the CLI/config spelling: `alternating`, `second-opens`, or a
    /// seat pattern such as `AAB` / `ABBA` (A = first seat, B = second).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "alternating" | "odd-even" => return Some(Self::Alternating),
            "second-opens" | "even-odd" => return Some(Self::SecondOpens),
            _ => {}
        }
        if raw.is_empty() {
            return None;
        }
        raw.chars()
            .map(|c| match c.to_ascii_uppercase() {
                'A' => Some(Seat::First),
                'B' => Some(Seat::Second),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self::Pattern)
    }
}

impl std::fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alternating => write!(f, "alternating"),
            Self::SecondOpens => write!(f, "second-opens"),
            Self::Pattern(seats) => {
                for seat in seats {
                    f.write_str(match seat {
                        Seat::First => "A",
                        Seat::Second => "B",
                    })?;
                }
                Ok(())
            }
        }
    }
}

/// Build the full turn sequence for `total_rounds` rounds.
pub fn build_schedule(
    participants: &[ParticipantId; 2],
    total_rounds: u32,
    policy: &TurnPolicy,
) -> Result<Vec<Turn>, DebateError> {
    if total_rounds == 0 {
        return Err(DebateError::InvalidSchedule {
            reason: "total rounds must be at least 1".to_string(),
        });
    }
    if total_rounds > MAX_TOTAL_ROUNDS {
        return Err(DebateError::InvalidSchedule {
            reason: format!("total rounds must be at most {MAX_TOTAL_ROUNDS}, got {total_rounds}"),
        });
    }
    if participants[0] == participants[1] {
        return Err(DebateError::DuplicateParticipant(participants[0].clone()));
    }

    (1..=total_rounds)
        .map(|round| {
            let seat = policy
                .seat_for(round)
                .ok_or_else(|| DebateError::InvalidSchedule {
                    reason: "turn pattern is empty".to_string(),
                })?;
            let participant = match seat {
                Seat::First => participants[0].clone(),
                Seat::Second => participants[1].clone(),
            };
            Ok(Turn { round, participant })
        })
        .collect()
}
