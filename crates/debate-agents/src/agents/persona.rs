//! Persona definitions and their argument templates.
//!
//! Templates use four placeholders: `{topic}`, `{round}`, `{agent}` and
//! `{persona}`. The persona name picks the template bank; unknown names get
//! the generic bank.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(topic|round|agent|persona)\}").expect("PLACEHOLDER_RE regex should compile")
});

const SCIENTIST_TEMPLATES: &[&str] = &[
    "From a scientific perspective on '{topic}', empirical evidence suggests that we must consider measurable outcomes and reproducible results. Round {round} analysis.",
    "The data regarding '{topic}' indicates that hypothesis-driven approaches yield the most reliable conclusions. Evidence-based reasoning is paramount.",
    "When examining '{topic}' scientifically, we must apply rigorous methodology and control for confounding variables to reach valid conclusions.",
    "Scientific inquiry into '{topic}' demands skepticism and verification through peer-reviewed processes and experimental validation.",
    "Regarding '{topic}', the quantitative analysis reveals patterns that support data-driven decision making over purely theoretical speculation.",
    "From an empirical standpoint on '{topic}', observational studies and controlled experiments provide the foundation for sound reasoning.",
    "The scientific method applied to '{topic}' requires falsifiable hypotheses and systematic testing to establish credible findings.",
    "Analyzing '{topic}' through the lens of evidence-based science, we must prioritize reproducibility and statistical significance.",
    "When we examine '{topic}' scientifically, the empirical record demonstrates clear correlations that warrant further investigation.",
    "Scientific rigor demands that claims about '{topic}' be supported by peer-reviewed research and verifiable experimental data.",
];

const PHILOSOPHER_TEMPLATES: &[&str] = &[
    "Philosophically examining '{topic}', we must question the fundamental assumptions underlying our positions and explore the deeper implications. Round {round} reflection.",
    "The ethical dimensions of '{topic}' require us to consider not just outcomes but the principles and values at stake in this debate.",
    "When contemplating '{topic}' from a philosophical perspective, we encounter profound questions about meaning, purpose, and human nature.",
    "The dialectical approach to '{topic}' reveals tensions between competing values that deserve careful philosophical examination.",
    "Regarding '{topic}', we must engage in critical analysis of the logical structure and conceptual coherence of various arguments.",
    "From an epistemological standpoint on '{topic}', we should examine how we know what we claim to know and the limits of our understanding.",
    "The moral philosophy surrounding '{topic}' compels us to consider universal principles versus contextual considerations in ethical reasoning.",
    "Analyzing '{topic}' philosophically, thought experiments illuminate the logical consequences and hidden assumptions in our thinking.",
    "When we philosophically investigate '{topic}', phenomenological analysis reveals the lived experience and subjective dimensions often overlooked.",
    "The philosophical tradition teaches us that '{topic}' involves complex interrelations between metaphysics, ethics, and practical wisdom.",
];

const GENERIC_TEMPLATES: &[&str] = &[
    "Considering '{topic}', we must examine multiple perspectives to reach a balanced understanding. Round {round}.",
    "The debate on '{topic}' requires careful analysis of both theoretical and practical implications.",
    "When discussing '{topic}', we should acknowledge the complexity and nuance inherent in this subject.",
    "Regarding '{topic}', historical context and contemporary relevance both inform our understanding.",
];

const SCIENTIST_DESCRIPTION: &str = "You are a logical scientist who values empirical evidence, \
data-driven reasoning, and the scientific method. You approach debates with skepticism and \
demand proof for claims. You emphasize testable hypotheses and reproducible results.";

const PHILOSOPHER_DESCRIPTION: &str = "You are a thoughtful philosopher who explores abstract \
concepts, ethical implications, and deeper meanings. You value logical consistency, thought \
experiments, and examining assumptions. You question fundamental premises and explore various \
perspectives.";

const GENERIC_DESCRIPTION: &str = "You are a rational debater.";

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub topic: &'a str,
    pub round: u32,
    pub agent: &'a str,
}

/// A named debating style with its template bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    name: String,
    description: String,
    templates: &'static [&'static str],
}

impl Persona {
    /// Built-in persona for `name` (case-insensitive).
    pub fn builtin(name: &str) -> Self {
        let name = name.trim();
        let (description, templates) = match name.to_ascii_lowercase().as_str() {
            "scientist" => (SCIENTIST_DESCRIPTION, SCIENTIST_TEMPLATES),
            "philosopher" => (PHILOSOPHER_DESCRIPTION, PHILOSOPHER_TEMPLATES),
            _ => (GENERIC_DESCRIPTION, GENERIC_TEMPLATES),
        };
        Self {
            name: name.to_string(),
            description: description.to_string(),
            templates,
        }
    }

    /// Built-in persona whose description is replaced by `<dir>/<name>.txt`
    /// when that file exists and is readable.
    pub fn load(name: &str, dir: Option<&Path>) -> Self {
        let mut persona = Self::builtin(name);
        let Some(dir) = dir else {
            return persona;
        };
        let path = dir.join(format!("{}.txt", persona.name));
        match std::fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!(persona = %persona.name, path = %path.display(), "Loaded persona description");
                persona.description = text.trim().to_string();
            }
            Ok(_) => {}
            Err(e) => {
                debug!(persona = %persona.name, path = %path.display(), error = %e, "No persona file, using built-in description");
            }
        }
        persona
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn templates(&self) -> &'static [&'static str] {
        self.templates
    }

    /// Fill template `index` (wrapped to the bank size).
    pub fn render(&self, index: usize, vars: &TemplateVars<'_>) -> String {
        let template = self.templates[index % self.templates.len()];
        PLACEHOLDER_RE
            .replace_all(template, |caps: &regex::Captures<'_>| match &caps[1] {
                "topic" => vars.topic.to_string(),
                "round" => vars.round.to_string(),
                "agent" => vars.agent.to_string(),
                _ => self.name.clone(),
            })
            .into_owned()
    }
}
