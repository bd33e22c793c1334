//! # lexgrep
//!
//! The CLI front end: parses flags, builds the immutable [`Config`],
//! installs the log sink, walks the requested paths, and drives the
//! dispatcher to completion (`spec.md` §4.9).

mod cli;

use std::{
    fs::File,
    io::{self, Write},
    process::exit,
    sync::Arc,
};

use cli::Cli;
use log::warn;
use regex::Regex;

use lexgrep::{
    config::{Config, Sink},
    dispatcher,
    error::ArgumentError,
    logsink,
    selector::{Selector, ValueQuery},
    walker,
};

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{err}");
    exit(2);
}

fn open_output(sink: &Sink) -> io::Result<Box<dyn Write + Send>> {
    Ok(match sink {
        Sink::Stdout => Box::new(io::stdout()),
        Sink::Stderr => Box::new(io::stderr()),
        Sink::File(path) => Box::new(File::create(path)?),
    })
}

fn main() {
    let cli = Cli::init();

    let log_sink = if cli.log.is_empty() { None } else { Some(Sink::parse(&cli.log)) };
    let level = logsink::level_for(cli.verbose);
    let _ = logsink::install(log_sink.as_ref(), level);

    let grep_mode = cli.g;

    let (mut selector, pattern_text, raw_paths) = if grep_mode {
        if cli.rest.is_empty() {
            fail(ArgumentError::MissingPositional("PATTERN"));
        }
        let (selector, _) = Selector::parse("g");
        (selector, cli.rest[0].clone(), cli.rest[1..].to_vec())
    } else {
        if cli.rest.is_empty() {
            fail(ArgumentError::MissingPositional("SELECTOR"));
        }
        if cli.rest.len() < 2 {
            fail(ArgumentError::MissingPositional("PATTERN"));
        }
        if cli.rest[0].is_empty() {
            fail(ArgumentError::EmptySelector);
        }
        let (selector, warnings) = Selector::parse(&cli.rest[0]);
        for warning in warnings {
            warn!("{warning}");
        }
        (selector, cli.rest[1].clone(), cli.rest[2..].to_vec())
    };

    let pattern = Regex::new(&pattern_text).unwrap_or_else(|e| {
        fail(ArgumentError::BadPattern {
            pattern: pattern_text.clone(),
            cause: e.to_string(),
        })
    });

    // The same PATTERN positional doubles as the value-query text when `V`
    // is active (`spec.md` §4.6): there is no separate query argument.
    let value_query = if selector.value_active() {
        match ValueQuery::parse(&pattern_text) {
            Some(query) => Some(query),
            None => {
                warn!("value query '{pattern_text}' is not a number; disabling V");
                selector.disable_value();
                None
            }
        }
    } else {
        None
    };

    let list_file = if cli.list.is_empty() { None } else { Some(cli.list.clone()) };
    let stdin = io::stdin();
    let initial_paths = walker::initial_paths(list_file.as_deref(), &raw_paths, stdin.lock())
        .unwrap_or_else(|e| fail(e));

    let available_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let worker_count = Config::resolve_worker_count(cli.cpu, available_cores);

    let output_sink = if cli.output.is_empty() { Sink::Stdout } else { Sink::parse(&cli.output) };
    let output = open_output(&output_sink).unwrap_or_else(|e| fail(format!("opening output sink: {e}")));

    // `show_paths` is filled in below once the walk resolves how many work
    // items there actually are (`spec.md` §6, `-h` row: "forced true when
    // multiple files or recursive" means multiple *resolved* files, not
    // multiple path arguments — a single directory argument can still
    // expand to many).
    let mut config = Config {
        worker_count,
        subject_only: cli.go,
        recursive: cli.r,
        visible_only: cli.visible,
        show_paths: false,
        show_lines: cli.n,
        list_file,
        log_sink,
        output_sink,
        unordered: cli.unordered,
        verbose: cli.verbose,
        selector,
        pattern,
        value_query,
    };

    let items = walker::collect(&initial_paths, &config);
    config.show_paths = cli.h.unwrap_or(items.len() > 1 || cli.r);

    let config = Arc::new(config);
    let summary = dispatcher::run(items, Arc::clone(&config), output);

    if config.verbose {
        warn!(
            "files={} bytes={} tokens={} lines={} matches={}",
            summary.files, summary.bytes_scanned, summary.tokens, summary.lines, summary.matches
        );
    }

    exit(summary.exit_code());
}
