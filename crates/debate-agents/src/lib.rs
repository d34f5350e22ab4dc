//! Debate agents: the process side of the debate engine.
//!
//! - [`agents`]: persona-template debaters implementing `Participant`
//! - [`topic`]: topic sanitizing, validation and the interactive prompt
//! - [`telemetry`]: JSONL, console and fan-out log sinks
//! - [`config`]: layered run configuration
//! - [`session`]: drives one debate, with checkpoint on interrupt and resume

pub mod agents;
pub mod config;
pub mod session;
pub mod telemetry;
pub mod topic;
