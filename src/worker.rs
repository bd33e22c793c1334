//! The scan worker (`spec.md` §4.7): turns one work item into a fully
//! formatted report buffer plus the tallies the reporter aggregates.

use std::fs;

use log::warn;

use crate::{
    classify,
    config::Config,
    decompress,
    error::IoError,
    lexer::{Lexer, PACKAGE_KEYWORD, TokenKind},
    selector::{token_value, value_matches, Selector},
};

/// One unit of ingestion work: a display name for output, and either the
/// bytes to scan or a path the worker must resolve itself.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub display_name: String,
    /// Present when the walker already has the bytes in hand (an archive
    /// member, or a file it decompressed while walking). Absent for a
    /// plain file, which the worker opens itself.
    pub source: Option<Vec<u8>>,
    /// The filesystem path to open when `source` is `None`.
    pub read_path: Option<String>,
}

impl WorkItem {
    pub fn from_path(display_name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            display_name: display_name.into(),
            source: None,
            read_path: Some(path),
        }
    }

    pub fn from_bytes(display_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            display_name: display_name.into(),
            source: Some(bytes),
            read_path: None,
        }
    }
}

/// What one worker produced for one work item, ready for the reporter to
/// append verbatim to the output sink.
#[derive(Debug, Default, Clone)]
pub struct ScanResult {
    pub display_name: String,
    pub report: Vec<u8>,
    pub bytes_scanned: u64,
    pub tokens: u64,
    pub lines: u64,
    pub matches: u64,
    pub had_error: bool,
    /// The dispatcher's sentinel marker (`spec.md` §4.8): a worker emits
    /// one of these with everything else zeroed when its work queue
    /// closes, so the reporter can count down to a clean join.
    pub complete: bool,
}

impl ScanResult {
    fn empty(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            ..Default::default()
        }
    }

    fn error(display_name: &str) -> Self {
        Self {
            had_error: true,
            ..Self::empty(display_name)
        }
    }

    pub fn sentinel() -> Self {
        Self {
            complete: true,
            ..Default::default()
        }
    }
}

/// 2 KiB is enough to reliably tell prose/source from binary data without
/// reading the whole file when `-go=false` lets arbitrary files through.
const BINARY_SAMPLE_LEN: usize = 2048;
const BINARY_CONTROL_THRESHOLD: usize = 8;

fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(BINARY_SAMPLE_LEN)];
    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n'))
        .count();
    control > BINARY_CONTROL_THRESHOLD
}

fn resolve_bytes(item: &WorkItem) -> Result<Vec<u8>, IoError> {
    if let Some(bytes) = &item.source {
        return Ok(bytes.clone());
    }
    let path = item
        .read_path
        .as_deref()
        .expect("work item has either source bytes or a read path");
    let raw = fs::read(path).map_err(|e| IoError::new(path, e))?;
    match classify::is_compressed(path) {
        Some(kind) => decompress::decompress(kind, &raw)
            .map(|bytes| bytes)
            .map_err(|e| IoError::new(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))),
        None => Ok(raw),
    }
}

/// Append one formatted output record: `[path:][line:]content\n`.
fn emit(report: &mut Vec<u8>, config: &Config, display_name: &str, line: usize, content: &str) {
    if config.show_paths {
        report.extend_from_slice(display_name.as_bytes());
        report.push(b':');
    }
    if config.show_lines {
        report.extend_from_slice(line.to_string().as_bytes());
        report.push(b':');
    }
    report.extend_from_slice(content.as_bytes());
    report.push(b'\n');
}

fn count_lines(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        return 0;
    }
    String::from_utf8_lossy(bytes).lines().count() as u64
}

/// Grep mode (step 3 of `spec.md` §4.7): no lexing, a straight per-line
/// regex test against the raw buffer.
fn scan_grep(item: &WorkItem, config: &Config, bytes: &[u8]) -> ScanResult {
    let text = String::from_utf8_lossy(bytes);
    let mut report = Vec::new();
    let mut lines = 0u64;
    let mut matches = 0u64;

    for (idx, line) in text.lines().enumerate() {
        lines += 1;
        if config.pattern.is_match(line) {
            emit(&mut report, config, &item.display_name, idx + 1, line);
            matches += 1;
        }
    }

    ScanResult {
        display_name: item.display_name.clone(),
        report,
        bytes_scanned: bytes.len() as u64,
        tokens: 0,
        lines,
        matches,
        had_error: false,
    }
}

/// Lexer-driven mode (steps 4-6 of `spec.md` §4.7): category/regex testing
/// plus value matching, with the one-match-per-line dedup invariant.
fn scan_lexed(item: &WorkItem, config: &Config, bytes: &[u8]) -> ScanResult {
    let text = String::from_utf8_lossy(bytes);
    let mut lexer = Lexer::new(&text);

    let mut report = Vec::new();
    let mut tokens = 0u64;
    let mut matches = 0u64;
    let mut expect_package_name = false;
    let mut last_printed_line = 0usize;

    loop {
        let token = lexer.next_token();
        if token.is_eof() {
            break;
        }
        tokens += 1;

        let mut is_package_name = false;
        match token.kind {
            TokenKind::Keyword if token.text == PACKAGE_KEYWORD => expect_package_name = true,
            TokenKind::Identifier if expect_package_name => {
                is_package_name = true;
                expect_package_name = false;
            }
            TokenKind::Space => {}
            _ => {}
        }

        if matches!(token.kind, TokenKind::Space | TokenKind::Eof) {
            continue;
        }

        let categories = Selector::categories_of(&token, is_package_name);
        if config.selector.matches_any(categories) && token.line > last_printed_line {
            if token.is_multiline_body() {
                let mut sub_line = token.line;
                for sub_text in token.text.split('\n') {
                    if sub_line > last_printed_line && config.pattern.is_match(sub_text) {
                        emit(&mut report, config, &item.display_name, sub_line, sub_text);
                        matches += 1;
                        last_printed_line = sub_line;
                    }
                    sub_line += 1;
                }
            } else {
                let full_line = lexer.get_line(token.line);
                if config.pattern.is_match(full_line) {
                    emit(&mut report, config, &item.display_name, token.line, full_line);
                    matches += 1;
                    last_printed_line = token.line;
                }
            }
        }

        if token.kind == TokenKind::Number && config.selector.value_active() && token.line > last_printed_line {
            if let (Some(query), Some(value)) = (config.value_query, token_value(token.text, token.subkind)) {
                if value_matches(value, query) {
                    let full_line = lexer.get_line(token.line);
                    emit(&mut report, config, &item.display_name, token.line, full_line);
                    matches += 1;
                    last_printed_line = token.line;
                }
            }
        }
    }

    for anomaly in lexer.anomalies() {
        if config.verbose {
            warn!("{}: {}", item.display_name, anomaly);
        }
    }

    ScanResult {
        display_name: item.display_name.clone(),
        report,
        bytes_scanned: bytes.len() as u64,
        tokens,
        lines: count_lines(bytes),
        matches,
        had_error: false,
    }
}

/// Run the full scan-worker pipeline for one work item.
pub fn scan(item: &WorkItem, config: &Config) -> ScanResult {
    let bytes = match resolve_bytes(item) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{e}");
            return ScanResult::error(&item.display_name);
        }
    };

    if !config.subject_only && looks_binary(&bytes) {
        return ScanResult::empty(&item.display_name);
    }

    if config.selector.grep {
        scan_grep(item, config, &bytes)
    } else {
        scan_lexed(item, config, &bytes)
    }
}
