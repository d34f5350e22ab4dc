//! One debate run from start (or checkpoint) to outcome.
//!
//! The driver loop is synchronous; the binary runs it on a blocking thread
//! and flips the cancel flag from its signal handler.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use coordination::debate::{
    DebateCheckpoint, DebateError, DebateOrchestrator, DebateOutcome, LogSink,
};
use tracing::{info, warn};

use crate::agents::boxed_debaters;
use crate::config::RunConfig;

/// Process exit codes.
pub struct ExitStatus;

impl ExitStatus {
    pub const SUCCESS: u8 = 0;
    /// Debate halted or an internal error occurred.
    pub const FAILURE: u8 = 1;
    /// Bad flags, environment, config file or topic.
    pub const CONFIG_ERROR: u8 = 2;
    /// Interrupted by Ctrl+C.
    pub const INTERRUPTED: u8 = 130;

    pub fn for_outcome(outcome: &DebateOutcome) -> u8 {
        if outcome.is_success() {
            Self::SUCCESS
        } else if outcome.was_interrupted() {
            Self::INTERRUPTED
        } else {
            Self::FAILURE
        }
    }
}

/// A debate ready to be driven.
pub struct Session {
    orchestrator: DebateOrchestrator,
    checkpoint_path: Option<PathBuf>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("checkpoint_path", &self.checkpoint_path)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a fresh debate on `topic`.
    pub fn start(config: &RunConfig, topic: &str, sink: &mut dyn LogSink) -> Result<Self, DebateError> {
        let mut orchestrator =
            DebateOrchestrator::new(config.debate_config(), boxed_debaters(config))?;
        orchestrator.supply_topic(topic, sink)?;
        Ok(Self {
            orchestrator,
            checkpoint_path: config.checkpoint.clone(),
        })
    }

    /// Continue the debate saved at `path`.
    ///
    /// Seats keep the ids recorded in the checkpoint; personas, seed and
    /// persona directory come from `config`.
    pub fn resume(config: &RunConfig, path: &Path) -> Result<Self> {
        let (checkpoint, _) = DebateCheckpoint::load(path)
            .with_context(|| format!("loading checkpoint {}", path.display()))?;

        let mut seated = config.clone();
        seated.participants = [
            checkpoint.config.participants[0].to_string(),
            checkpoint.config.participants[1].to_string(),
        ];
        info!(
            path = %path.display(),
            recorded = checkpoint.recorded(),
            sequence = checkpoint.sequence,
            "Resuming debate"
        );
        let orchestrator = DebateOrchestrator::resume(checkpoint, boxed_debaters(&seated))
            .context("restoring debate from checkpoint")?;
        Ok(Self {
            orchestrator,
            checkpoint_path: config.checkpoint.clone(),
        })
    }

    pub fn orchestrator(&self) -> &DebateOrchestrator {
        &self.orchestrator
    }

    pub fn topic(&self) -> Option<&str> {
        self.orchestrator.context().topic.as_deref()
    }

    /// Step until the debate is terminal or `cancel` is set.
    ///
    /// A debate that halts on its own still yields an outcome. On cancel the
    /// checkpoint (if configured) is written before the debate is aborted.
    pub fn drive(&mut self, sink: &mut dyn LogSink, cancel: &AtomicBool) -> Result<DebateOutcome> {
        while !self.orchestrator.is_complete() {
            if cancel.load(Ordering::SeqCst) {
                self.save_checkpoint("interrupted")?;
                let outcome = self
                    .orchestrator
                    .abort("cancelled by user", sink)
                    .context("aborting debate")?;
                sink.flush()?;
                return Ok(outcome);
            }
            if let Err(e) = self.orchestrator.step(sink) {
                match self.orchestrator.outcome() {
                    Some(outcome) => {
                        warn!(code = e.code(), "Debate stopped early: {e}");
                        sink.flush()?;
                        return Ok(outcome);
                    }
                    None => return Err(e).context("debate step failed"),
                }
            }
        }
        sink.flush()?;
        self.orchestrator
            .outcome()
            .context("debate finished without an outcome")
    }

    fn save_checkpoint(&mut self, reason: &str) -> Result<()> {
        let Some(path) = self.checkpoint_path.clone() else {
            return Ok(());
        };
        let checkpoint = self.orchestrator.checkpoint(reason);
        checkpoint
            .save(&path)
            .with_context(|| format!("saving checkpoint {}", path.display()))?;
        info!(
            path = %path.display(),
            recorded = checkpoint.recorded(),
            "Checkpoint saved"
        );
        Ok(())
    }
}

/// Closing report in the console format: summary, then justification.
pub fn render_final(outcome: &DebateOutcome) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    if let (Some(summary), Some(verdict)) = (&outcome.summary, &outcome.verdict) {
        let title = if outcome.is_success() {
            "DEBATE COMPLETE - JUDGE'S VERDICT"
        } else {
            "DEBATE STOPPED - PARTIAL VERDICT"
        };
        out.push_str(&format!("\n{rule}\n{title}\n{rule}\n{summary}\n\n{rule}\n"));
        out.push_str(&verdict.justification);
        out.push('\n');
    }
    out.push_str(&format!("\n{}\n", outcome.summary_line()));
    out
}
