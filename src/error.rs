//! Run-level error types.
//!
//! Grounded on `y-lang`'s `loader::loaderror::FileLoadError`: a plain struct
//! or enum implementing `std::error::Error`/`Display` by hand, one per
//! boundary, rather than a `Box<dyn Error>` soup at the leaves. `Box<dyn
//! Error>` is reserved for the binary's `main` signature, same as
//! `src/bin/why/main.rs`.
//!
//! Only these abort the run (`spec.md` §7's propagation policy); every other
//! failure (`DecodeError` from [`crate::decompress`], a missing file, a
//! corrupt archive member) is caught inside the worker and logged.

use std::fmt;

/// A bad selector string or an unparseable pattern/value query. Reported on
/// stderr by the CLI front-end; the process exits with code 2 without ever
/// starting the dispatcher.
#[derive(Debug, Clone)]
pub enum ArgumentError {
    EmptySelector,
    MissingPositional(&'static str),
    BadPattern { pattern: String, cause: String },
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::EmptySelector => write!(f, "selector argument must not be empty"),
            ArgumentError::MissingPositional(what) => write!(f, "missing required argument: {what}"),
            ArgumentError::BadPattern { pattern, cause } => {
                write!(f, "bad pattern '{pattern}': {cause}")
            }
        }
    }
}

impl std::error::Error for ArgumentError {}

/// An I/O failure opening or reading a path. Per-file occurrences are
/// logged and skipped by the worker; a failure resolving the initial path
/// arguments (e.g. an unreadable `-list` file) aborts the run.
#[derive(Debug)]
pub struct IoError {
    pub path: String,
    pub cause: std::io::Error,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.cause)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl IoError {
    pub fn new(path: impl Into<String>, cause: std::io::Error) -> Self {
        Self {
            path: path.into(),
            cause,
        }
    }
}
