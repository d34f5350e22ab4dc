//! Template-driven debater.
//!
//! Picks a persona template for each round, deterministically from the
//! seed when one is set. A debater never repeats itself verbatim: drafts
//! too similar to its own earlier arguments are redrawn with the next
//! variation, and if every variation collides the draft is tagged with the
//! round it belongs to.

use coordination::debate::{Contribution, Participant, ParticipantError, ParticipantId, TurnRequest};
use tracing::debug;

use super::persona::{Persona, TemplateVars};

/// Similarity above which a draft counts as a repeat.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Redraws attempted before falling back to the round tag.
pub const MAX_VARIATIONS: u32 = 5;

/// How many of the opponent's latest arguments feed the context digest.
pub const CONTEXT_ENTRIES: usize = 3;

const DIGEST_EXCERPT_CHARS: usize = 100;

/// Normalized edit similarity of two texts, ignoring case. 1.0 is identical.
///
/// This is `1 - levenshtein / max_len`, not a matching-block ratio; the two
/// disagree for texts near [`SIMILARITY_THRESHOLD`].
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// One line per recent opposing argument, truncated.
pub fn context_digest(visible: &[Contribution]) -> String {
    if visible.is_empty() {
        return "No previous arguments.".to_string();
    }
    let start = visible.len().saturating_sub(CONTEXT_ENTRIES);
    visible[start..]
        .iter()
        .map(|c| {
            let excerpt: String = c.text.chars().take(DIGEST_EXCERPT_CHARS).collect();
            format!("Round {} - {}: {}...", c.round, c.participant, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A [`Participant`] that argues from persona templates.
#[derive(Debug, Clone)]
pub struct TemplateDebater {
    id: ParticipantId,
    persona: Persona,
    seed: Option<u64>,
    previous: Vec<String>,
}

impl TemplateDebater {
    pub fn new(id: impl Into<ParticipantId>, persona: Persona) -> Self {
        Self {
            id: id.into(),
            persona,
            seed: None,
            previous: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Everything this debater has argued so far, oldest first.
    pub fn previous_arguments(&self) -> &[String] {
        &self.previous
    }

    fn template_index(&self, round: u32, variation: u32) -> usize {
        let slot = match self.seed {
            Some(seed) => {
                let key = format!("{}{}{}{}", seed, round, variation, self.id);
                let hash = blake3::hash(key.as_bytes());
                let mut head = [0u8; 8];
                head.copy_from_slice(&hash.as_bytes()[..8]);
                u64::from_le_bytes(head) % 10
            }
            None => (u64::from(round) + u64::from(variation)) % 10,
        };
        slot as usize % self.persona.templates().len()
    }

    fn draft(&self, topic: &str, round: u32, variation: u32) -> String {
        let vars = TemplateVars {
            topic,
            round,
            agent: self.id.as_str(),
        };
        self.persona
            .render(self.template_index(round, variation), &vars)
    }

    fn is_repeat(&self, text: &str) -> bool {
        self.previous
            .iter()
            .any(|prev| similarity(text, prev) > SIMILARITY_THRESHOLD)
    }

    /// Produce this round's argument and remember it.
    pub fn argue(&mut self, topic: &str, visible: &[Contribution], round: u32) -> String {
        debug!(
            agent = %self.id,
            round,
            context = %context_digest(visible),
            "Drafting argument"
        );

        let mut argument = self.draft(topic, round, 0);
        let mut variation = 0;
        while self.is_repeat(&argument) && variation < MAX_VARIATIONS {
            variation += 1;
            argument = self.draft(topic, round, variation);
        }
        if self.is_repeat(&argument) {
            debug!(agent = %self.id, round, "Every variation repeats, tagging round");
            argument = format!("{} (Round {} perspective)", argument, round);
        }

        self.previous.push(argument.clone());
        argument
    }
}

impl Participant for TemplateDebater {
    fn id(&self) -> &ParticipantId {
        &self.id
    }

    fn contribute(&mut self, request: &TurnRequest<'_>) -> Result<String, ParticipantError> {
        if request.topic.trim().is_empty() {
            return Err(ParticipantError::new("no topic to argue about"));
        }
        Ok(self.argue(request.topic, request.visible_context, request.round))
    }

    fn restore_history(&mut self, own: &[Contribution]) {
        self.previous = own.iter().map(|c| c.text.clone()).collect();
    }
}
