//! Dataset load progress reporting.
//!
//! Reports what `liftprog` is doing while it downloads, parses and indexes
//! a CSV, so large exports don't look like a hang. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event while loading a dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadProgressEvent {
    /// Fetching a remote CSV. Size unknown.
    Downloading { url: String },
    /// Parsing CSV rows; `rows` parsed so far.
    Parsing { source: String, rows: u64 },
    /// Records normalized and the name index built.
    Indexed { rows: u64, names: u64 },
}

/// Reports load progress. Implementations write to stderr (human or JSON).
pub trait LoadProgressReporter: Send + Sync {
    fn report(&self, event: LoadProgressEvent);
}

/// Human-friendly progress on stderr: "load data/raw.csv  parsing  120,000 rows".
pub struct StderrProgress;

impl LoadProgressReporter for StderrProgress {
    fn report(&self, event: LoadProgressEvent) {
        let line = match &event {
            LoadProgressEvent::Downloading { url } => format!("load {}  downloading...\n", url),
            LoadProgressEvent::Parsing { source, rows } => {
                format!("load {}  parsing  {} rows\n", source, format_number(*rows))
            }
            LoadProgressEvent::Indexed { rows, names } => format!(
                "load  indexed  {} rows, {} lifters\n",
                format_number(*rows),
                format_number(*names)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl LoadProgressReporter for JsonProgress {
    fn report(&self, event: LoadProgressEvent) {
        let obj = match &event {
            LoadProgressEvent::Downloading { url } => serde_json::json!({
                "event": "progress",
                "phase": "downloading",
                "url": url
            }),
            LoadProgressEvent::Parsing { source, rows } => serde_json::json!({
                "event": "progress",
                "phase": "parsing",
                "source": source,
                "rows": rows
            }),
            LoadProgressEvent::Indexed { rows, names } => serde_json::json!({
                "event": "progress",
                "phase": "indexed",
                "rows": rows,
                "names": names
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl LoadProgressReporter for NoProgress {
    fn report(&self, _event: LoadProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn LoadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
