//! `lexgrep`: a token-aware, line-oriented search tool for a Go-like
//! subject language. See `SPEC_FULL.md` for the full module map.

pub mod archive;
pub mod classify;
pub mod config;
pub mod decompress;
pub mod dispatcher;
pub mod error;
pub mod lexer;
pub mod logsink;
pub mod selector;
pub mod walker;
pub mod worker;
