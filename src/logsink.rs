//! A `log::Log` implementation routing diagnostics to stdout, stderr, or an
//! append-mode file, selected by `-log=FILE` (`spec.md` §4.10).
//!
//! The default case (no `-log` given) mirrors `y-lang`'s own
//! `simple_logger::init_with_level` call in `src/bin/why/main.rs` exactly.
//! `-log=FILE` needs a configurable destination `simple_logger` can't give
//! (it only ever writes to stderr), so that case installs a small
//! hand-written adapter instead — `log`'s facade is unchanged, only the
//! sink differs.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    sync::Mutex,
};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::Sink;

/// `spec.md` §5: "the log sink is MT-safe append; errors from any thread
/// may write to it." A single mutex around one writer gives that directly.
pub struct LogSink {
    level: LevelFilter,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl LogSink {
    pub fn new(sink: &Sink, level: LevelFilter) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match sink {
            Sink::Stdout => Box::new(io::stdout()),
            Sink::Stderr => Box::new(io::stderr()),
            Sink::File(path) => Box::new(OpenOptions::new().create(true).append(true).open(path)?),
        };
        Ok(Self {
            level,
            writer: Mutex::new(writer),
        })
    }
}

impl Log for LogSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Install the global logger. `sink` is `None` when `-log=FILE` was never
/// given, in which case this calls `simple_logger::init_with_level` exactly
/// as `y-lang`'s own binary does; `Some` installs the hand-rolled
/// [`LogSink`] so diagnostics can go to a file instead of just stderr.
pub fn install(sink: Option<&Sink>, level: LevelFilter) -> Result<(), SetLoggerError> {
    match sink {
        None => {
            let level = level.to_level().unwrap_or(Level::Error);
            simple_logger::init_with_level(level)
        }
        Some(resolved) => {
            let logger = match LogSink::new(resolved, level) {
                Ok(logger) => logger,
                Err(_) => LogSink::new(&Sink::Stderr, level).expect("stderr is always writable"),
            };
            log::set_boxed_logger(Box::new(logger))?;
            log::set_max_level(level);
            Ok(())
        }
    }
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Trace
    } else {
        Level::Warn.to_level_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sink_respects_level_filter() {
        let sink = LogSink::new(&Sink::Stdout, LevelFilter::Warn).unwrap();
        assert!(sink.enabled(&Metadata::builder().level(Level::Error).build()));
        assert!(!sink.enabled(&Metadata::builder().level(Level::Debug).build()));
    }

    #[test]
    fn file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let sink = Arc::new(LogSink::new(&Sink::File(path.to_string_lossy().into_owned()), LevelFilter::Info).unwrap());
        sink.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("hello"))
                .build(),
        );
        sink.flush();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello"));
    }
}
