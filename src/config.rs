//! The immutable run configuration.
//!
//! The source this tool is modeled on reads process-wide flag variables from
//! every component that needs them (`spec.md` design note, §9). This crate
//! builds one `Config` at startup from the parsed CLI flags and threads a
//! shared reference (`Arc<Config>`) into the walker, the workers, and the
//! reporter instead — the same "shared global flags become a configuration
//! struct" shape `y-lang`'s `Cli`/flag types are built around, just assembled
//! once rather than read piecemeal.

use regex::Regex;

use crate::selector::{Selector, ValueQuery};

/// Where diagnostics or matches should be written.
#[derive(Debug, Clone)]
pub enum Sink {
    Stdout,
    Stderr,
    File(String),
}

impl Sink {
    /// Parse a `-log=FILE`/`-output=FILE` value, honoring the special names
    /// `[stdout]`/`[stderr]`. An empty string means "no explicit sink",
    /// resolved by the caller to whichever default applies.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "[stdout]" => Sink::Stdout,
            "[stderr]" => Sink::Stderr,
            other => Sink::File(other.to_string()),
        }
    }
}

/// One immutable, `Send + Sync` snapshot of every parsed flag plus the
/// compiled matcher state (`spec.md` §3's "shared matcher state ... is
/// constructed once ... and is read-only for the run").
pub struct Config {
    pub worker_count: usize,
    pub subject_only: bool,
    pub recursive: bool,
    pub visible_only: bool,
    pub show_paths: bool,
    pub show_lines: bool,
    pub list_file: Option<String>,
    pub log_sink: Option<Sink>,
    pub output_sink: Sink,
    pub unordered: bool,
    pub verbose: bool,
    pub selector: Selector,
    pub pattern: Regex,
    pub value_query: Option<ValueQuery>,
}

impl Config {
    /// Resolve a raw `-cpu=N` value: negative means "leave that many cores
    /// idle", clamped so the pipeline always has at least two workers.
    pub fn resolve_worker_count(requested: i64, available_cores: usize) -> usize {
        let n = if requested < 0 {
            available_cores as i64 + requested
        } else if requested == 0 {
            available_cores as i64
        } else {
            requested
        };
        n.max(2) as usize
    }
}

/// Aggregated end-of-run counters (`spec.md` §3's "sum of per-worker
/// tallies equals the total summary"), used for the verbose summary line
/// and the exit-code decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub files: u64,
    pub bytes_scanned: u64,
    pub tokens: u64,
    pub lines: u64,
    pub matches: u64,
    pub had_error: bool,
}

impl RunSummary {
    pub fn add(&mut self, result: &crate::worker::ScanResult) {
        self.files += 1;
        self.bytes_scanned += result.bytes_scanned;
        self.tokens += result.tokens;
        self.lines += result.lines;
        self.matches += result.matches;
        self.had_error |= result.had_error;
    }

    /// `spec.md` §7: max of (2 if a run-level error occurred, 1 if no
    /// matches, else 0). Run-level (argument) errors are handled before a
    /// `RunSummary` ever exists, so this only distinguishes per-file errors
    /// from a clean zero-match run.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            2
        } else if self.matches == 0 {
            1
        } else {
            0
        }
    }
}
