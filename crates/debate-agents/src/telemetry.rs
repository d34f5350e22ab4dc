//! Debate log sinks.
//!
//! - [`JsonlSink`]: append-only `.jsonl` file, one
//!   `{"timestamp", "type", "data"}` envelope per record
//! - [`ConsoleSink`]: human-readable banners for contributions, warnings and halts
//! - [`FanoutSink`]: forwards every record to several sinks in order

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use coordination::debate::{Clock, LogRecord, LogSink, ParticipantId, SinkError, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default log file name for a run started at `now`.
pub fn default_log_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("debate_log_{}.jsonl", now.format("%Y%m%d_%H%M%S")))
}

/// One line of a debate log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: String,
    data: serde_json::Value,
}

/// A parsed debate log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub record: LogRecord,
}

/// Appends every record to a `.jsonl` file.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
    clock: Arc<dyn Clock>,
    written: usize,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("path", &self.path)
            .field("written", &self.written)
            .finish()
    }
}

impl JsonlSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Debate log opened");
        Ok(Self {
            path,
            file,
            clock: Arc::new(SystemClock),
            written: 0,
        })
    }

    /// Stamp envelopes with `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this sink.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Read every entry of a debate log. Blank lines are skipped.
    pub fn read_entries(path: &Path) -> std::io::Result<Vec<LogEntry>> {
        let file = File::open(path)?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_line(&line)?);
        }
        Ok(entries)
    }
}

fn parse_line(line: &str) -> std::io::Result<LogEntry> {
    let invalid = |e: serde_json::Error| std::io::Error::new(std::io::ErrorKind::InvalidData, e);
    let envelope: Envelope = serde_json::from_str(line).map_err(invalid)?;
    let record = serde_json::from_value(serde_json::json!({
        "type": envelope.kind,
        "data": envelope.data,
    }))
    .map_err(invalid)?;
    Ok(LogEntry {
        timestamp: envelope.timestamp,
        record,
    })
}

impl LogSink for JsonlSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        let data = match serde_json::to_value(record)? {
            serde_json::Value::Object(mut map) => map.remove("data").unwrap_or_default(),
            other => other,
        };
        let envelope = Envelope {
            timestamp: self.clock.now(),
            kind: record.kind().to_string(),
            data,
        };
        let json = serde_json::to_string(&envelope)?;
        writeln!(self.file, "{json}")?;
        self.written += 1;
        debug!(kind = record.kind(), "Debate log record written");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.file.flush()?;
        Ok(())
    }
}

/// Prints the debate as it unfolds.
pub struct ConsoleSink<W: Write> {
    out: W,
    personas: HashMap<ParticipantId, String>,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            personas: HashMap::new(),
        }
    }

    /// Show `persona` next to `participant` in turn banners.
    pub fn with_persona(mut self, participant: impl Into<ParticipantId>, persona: &str) -> Self {
        self.personas.insert(participant.into(), persona.to_string());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LogSink for ConsoleSink<W> {
    fn record(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        let heavy = "=".repeat(80);
        match record {
            LogRecord::Contribution(c) => {
                let speaker = match self.personas.get(&c.participant) {
                    Some(persona) => format!("{} ({})", c.participant, persona),
                    None => c.participant.to_string(),
                };
                let light = "-".repeat(80);
                writeln!(
                    self.out,
                    "\n{heavy}\nRound {} - {}:\n{light}\n{}\n{heavy}\n",
                    c.round, speaker, c.text
                )?;
            }
            LogRecord::Warning(w) => {
                writeln!(self.out, "⚠ {}: {}", w.category(), w.message())?;
            }
            LogRecord::Rejection {
                participant,
                round,
                attempt,
                reason,
                ..
            } => {
                writeln!(
                    self.out,
                    "↻ {participant} round {round} attempt {attempt} rejected: {reason}"
                )?;
            }
            LogRecord::Halt(report) => {
                writeln!(self.out, "\n{heavy}\nDEBATE HALTED\n{heavy}\n{report}")?;
            }
            LogRecord::Transition(_) | LogRecord::Status(_) | LogRecord::Verdict(_) => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Forwards each record to every inner sink, stopping at the first failure.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn LogSink + Send>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl LogSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for FanoutSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.record(record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
