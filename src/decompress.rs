//! Full in-memory decompression for the three supported per-file formats.
//!
//! The spec allows buffering whole members for simplicity (`spec.md` §5);
//! streaming would save memory on huge archives but complicates the worker
//! for little benefit at the scale this tool targets.

use std::{
    error::Error,
    fmt,
    io::{self, Read},
};

use crate::classify::CompressionKind;

#[derive(Debug)]
pub struct DecodeError {
    pub what: String,
    pub cause: io::Error,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode {}: {}", self.what, self.cause)
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

impl DecodeError {
    fn new(what: impl Into<String>, cause: io::Error) -> Self {
        Self {
            what: what.into(),
            cause,
        }
    }
}

/// Fully decompress `bytes` according to `kind`. A corrupt stream yields a
/// `DecodeError`; the caller is expected to log it and skip the file rather
/// than abort the run.
pub fn decompress(kind: CompressionKind, bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match kind {
        CompressionKind::Gz => {
            let mut out = Vec::new();
            flate2::read::GzDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|e| DecodeError::new("gzip stream", e))?;
            Ok(out)
        }
        CompressionKind::Bz2 => {
            let mut out = Vec::new();
            bzip2::read::BzDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|e| DecodeError::new("bzip2 stream", e))?;
            Ok(out)
        }
        CompressionKind::Zst => {
            zstd::stream::decode_all(bytes).map_err(|e| DecodeError::new("zstd stream", e))
        }
    }
}
