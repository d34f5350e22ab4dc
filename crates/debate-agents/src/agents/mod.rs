//! Debaters for the two seats.
//!
//! [`build_debaters`] turns a [`RunConfig`] into the participant pair the
//! orchestrator expects, first seat first.

pub mod debater;
pub mod persona;

use coordination::debate::Participant;
use tracing::info;

use crate::config::RunConfig;
pub use debater::TemplateDebater;
pub use persona::Persona;

/// One seeded template debater per configured seat.
pub fn build_debaters(config: &RunConfig) -> Vec<TemplateDebater> {
    config
        .participants
        .iter()
        .zip(config.personas.iter())
        .map(|(id, persona)| {
            let persona = Persona::load(persona, config.persona_dir.as_deref());
            info!(agent = %id, persona = %persona.name(), "Debater ready");
            TemplateDebater::new(id.as_str(), persona).with_seed(config.seed)
        })
        .collect()
}

/// [`build_debaters`], boxed for the orchestrator.
pub fn boxed_debaters(config: &RunConfig) -> Vec<Box<dyn Participant>> {
    build_debaters(config)
        .into_iter()
        .map(|d| Box::new(d) as Box<dyn Participant>)
        .collect()
}
