//! # Cli
//!
//! Flag parsing for `lexgrep`, mirroring `spec.md` §6's flag table
//! one-for-one through `clap`'s derive API — the same shape `y-lang`'s own
//! `src/bin/why/cli.rs` uses for its `Cli` struct, generalized from one
//! subcommand to this tool's flat flag set.

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Worker count; negative means "leave that many cores idle", clamped
    /// to at least two. Zero means "use every available core".
    #[arg(long, default_value_t = 0)]
    pub cpu: i64,

    /// Restrict ingestion to subject-language source files.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub go: bool,

    /// Recurse into directories.
    #[arg(short = 'r', long, default_value_t = false, action = ArgAction::Set)]
    pub r: bool,

    /// Skip `.`-prefixed path segments.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub visible: bool,

    /// Prefix each match with `path:`. Left unset to let the CLI front end
    /// decide (forced true for multiple files or recursive runs).
    #[arg(long = "h", action = ArgAction::Set)]
    pub h: Option<bool>,

    /// Include the 1-based line number as a `:line:` prefix.
    #[arg(short = 'n', long, default_value_t = false, action = ArgAction::Set)]
    pub n: bool,

    /// Read paths from FILE instead of the command line.
    #[arg(long, default_value = "")]
    pub list: String,

    /// Write diagnostics to FILE (or `[stdout]`/`[stderr]`).
    #[arg(long, default_value = "")]
    pub log: String,

    /// Destination for matches (or `[stdout]`/`[stderr]`).
    #[arg(long, default_value = "")]
    pub output: String,

    /// Grep mode: raw line matching, no lexing.
    #[arg(short = 'g', long = "g", action = ArgAction::SetTrue)]
    pub g: bool,

    /// Disable the order-preserving pipeline.
    #[arg(long, action = ArgAction::SetTrue)]
    pub unordered: bool,

    /// Log `LexAnomaly` records at `warn` and print a run summary.
    #[arg(short = 'v', long = "verbose", default_value_t = false, action = ArgAction::Set)]
    pub verbose: bool,

    /// `SELECTOR PATTERN [path...]` in token mode, or `PATTERN [path...]`
    /// in grep mode — split apart in `main` once `-g` is known.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}
