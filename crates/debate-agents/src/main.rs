use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};

use debate_agents::config::{Overrides, RunConfig};
use debate_agents::session::{render_final, ExitStatus, Session};
use debate_agents::telemetry::{default_log_path, ConsoleSink, FanoutSink, JsonlSink};
use debate_agents::topic;

/// Two persona debaters argue a topic over a fixed number of turns, then a
/// lexical judge picks a winner.
#[derive(Parser, Debug)]
#[command(name = "debate-agents", version, about)]
#[command(after_help = "Examples:\n  \
    debate-agents\n  \
    debate-agents --seed 42\n  \
    debate-agents --log-path logs/debate.jsonl\n  \
    debate-agents --seed 123 --persona-config scientist,philosopher\n  \
    debate-agents --topic \"Should cities ban cars downtown?\" --checkpoint run.json\n  \
    debate-agents --resume run.json")]
struct Cli {
    /// TOML file with default settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Total scheduled turns.
    #[arg(long)]
    rounds: Option<u32>,

    /// Participant ids for the two seats, comma separated.
    #[arg(long, value_name = "FIRST,SECOND")]
    participants: Option<String>,

    /// Personas for the two seats, comma separated (default: scientist,philosopher).
    #[arg(long, value_name = "FIRST,SECOND")]
    persona_config: Option<String>,

    /// Directory holding `<persona>.txt` descriptions.
    #[arg(long, value_name = "DIR")]
    persona_dir: Option<PathBuf>,

    /// Turn order: alternating, second-opens, or a seat pattern like ABBA.
    #[arg(long)]
    policy: Option<String>,

    /// Seed for deterministic template choice.
    #[arg(long)]
    seed: Option<u64>,

    /// Log file (default: debate_log_<timestamp>.jsonl).
    #[arg(long, value_name = "FILE")]
    log_path: Option<PathBuf>,

    /// How many of the opponent's latest arguments a debater sees.
    #[arg(long)]
    context_window: Option<usize>,

    /// Extra attempts per turn after a failed contribution.
    #[arg(long)]
    max_turn_retries: Option<u32>,

    /// Debate topic; prompts interactively when omitted.
    #[arg(long)]
    topic: Option<String>,

    /// Save a checkpoint here if the debate is interrupted.
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Resume the debate saved in this checkpoint.
    #[arg(long, value_name = "FILE", conflicts_with = "topic")]
    resume: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            rounds: self.rounds,
            participants: self.participants.clone(),
            personas: self.persona_config.clone(),
            policy: self.policy.clone(),
            seed: self.seed,
            log_path: self.log_path.clone(),
            persona_dir: self.persona_dir.clone(),
            context_window: self.context_window,
            max_turn_retries: self.max_turn_retries,
            topic: self.topic.clone(),
            checkpoint: self.checkpoint.clone(),
            resume: self.resume.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match RunConfig::from_process(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(ExitStatus::CONFIG_ERROR);
        }
    };

    match run(config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("Debate failed: {e:#}");
            eprintln!("\nError during debate: {e:#}");
            ExitCode::from(ExitStatus::FAILURE)
        }
    }
}

async fn run(config: RunConfig) -> Result<u8> {
    let rule = "=".repeat(80);
    println!("\n{rule}\nMULTI-AGENT DEBATE SYSTEM\n{rule}");
    for (id, persona) in config.participants.iter().zip(config.personas.iter()) {
        println!("{id} Persona: {persona}");
    }
    if let Some(seed) = config.seed {
        println!("Seed: {seed}");
    }
    println!("{rule}");

    // The topic is read before the Ctrl+C handler is installed, so an
    // interrupt at the prompt still ends the process immediately.
    let topic = if config.resume.is_some() {
        None
    } else {
        match &config.topic {
            Some(raw) => match topic::accept(raw) {
                Ok(topic) => Some(topic),
                Err(e) => {
                    eprintln!("Error: invalid --topic: {e}");
                    return Ok(ExitStatus::CONFIG_ERROR);
                }
            },
            None => Some(
                tokio::task::spawn_blocking(|| {
                    topic::prompt(&mut std::io::stdin().lock(), &mut std::io::stdout())
                })
                .await
                .context("topic prompt task failed")?
                .context("reading topic")?,
            ),
        }
    };

    let log_path = config
        .log_path
        .clone()
        .unwrap_or_else(|| default_log_path(Local::now()));
    let mut console = ConsoleSink::stdout();
    for (id, persona) in config.participants.iter().zip(config.personas.iter()) {
        console = console.with_persona(id.as_str(), persona);
    }
    let mut sink = FanoutSink::new()
        .with(JsonlSink::open(&log_path).with_context(|| {
            format!("opening debate log {}", log_path.display())
        })?)
        .with(console);

    let mut session = match (&config.resume, topic) {
        (Some(path), _) => Session::resume(&config, path)?,
        (None, Some(topic)) => Session::start(&config, &topic, &mut sink)?,
        (None, None) => anyhow::bail!("no topic and nothing to resume"),
    };
    info!(
        topic = session.topic().unwrap_or_default(),
        log = %log_path.display(),
        "Debate starting"
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let outcome = tokio::task::spawn_blocking(move || session.drive(&mut sink, &cancel))
        .await
        .context("debate task failed")??;

    print!("{}", render_final(&outcome));
    println!("\nDebate log saved to: {}", log_path.display());
    if outcome.is_success() {
        println!("\nDebate completed successfully!\n");
    } else if outcome.was_interrupted() {
        println!("\nDebate interrupted by user.\n");
        if let Some(path) = &config.checkpoint {
            println!("Resume with: debate-agents --resume {}\n", path.display());
        }
    }
    Ok(ExitStatus::for_outcome(&outcome))
}
