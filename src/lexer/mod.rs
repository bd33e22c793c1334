//! A streaming, single-pass tokenizer for the subject language.
//!
//! Grounded on `y-lang`'s hand-written `Lexer` (`Peekable` cursor over the
//! source, one token produced per call, a closed-set keyword table) but
//! generalized from Y's handful of token shapes to the full set this crate
//! needs: multi-base numbers, quoted and raw strings, rune literals, line
//! and block comments, and a longest-match operator table.

mod keywords;
mod operators;
mod token;

pub use keywords::PACKAGE_KEYWORD;
pub use token::{Subkind, Token, TokenKind};

use std::{error::Error, fmt};

/// An illegal byte encountered while lexing. Not fatal: the lexer recovers
/// by emitting a single `Character` token and continuing, per the subject
/// language's lenient recovery rule. Anomalies accumulate on the `Lexer` so
/// callers can report them in verbose runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexAnomaly {
    pub line: usize,
    pub byte: u8,
}

impl fmt::Display for LexAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal byte 0x{:02x} at line {}", self.byte, self.line)
    }
}

impl Error for LexAnomaly {}

fn is_ident_continue_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Tokenizes a single in-memory source buffer. A `Lexer` (and every `Token`
/// it yields) is only valid for as long as the buffer it was built from.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_starts: Vec<usize>,
    anomalies: Vec<LexAnomaly>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            line_starts: vec![0],
            anomalies: Vec::new(),
        }
    }

    pub fn anomalies(&self) -> &[LexAnomaly] {
        &self.anomalies
    }

    /// The full text of the physical line containing `line` (1-based),
    /// stripped of its trailing newline.
    pub fn get_line(&self, line: usize) -> &'a str {
        let start = self
            .line_starts
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or(self.input.len());
        let rest = &self.input[start..];
        let end = rest.find('\n').map(|i| start + i).unwrap_or(self.input.len());
        self.input[start..end].trim_end_matches('\r')
    }

    /// Advance the cursor to byte offset `end`, updating the line counter
    /// and line-start table for every newline crossed along the way.
    fn advance_to(&mut self, end: usize) {
        let mut i = self.pos;
        while i < end {
            if self.bytes[i] == b'\n' {
                self.line += 1;
                self.line_starts.push(i + 1);
            }
            i += 1;
        }
        self.pos = end;
    }

    /// Scan forward from `start` (which must point at the opening
    /// delimiter) for the matching closing `delim`, treating `\X` as an
    /// opaque two-byte escape. Returns the exclusive end offset and whether
    /// the delimiter was actually found before a newline or end of input.
    fn scan_delimited(&self, start: usize, delim: u8) -> (usize, bool) {
        let bytes = self.bytes;
        let mut i = start + 1;
        while i < bytes.len() {
            let b = bytes[i];
            if b == delim {
                return (i + 1, true);
            }
            if b == b'\n' {
                return (i, false);
            }
            if b == b'\\' && i + 1 < bytes.len() {
                i += 2;
                continue;
            }
            i += 1;
        }
        (i, false)
    }

    pub fn next_token(&mut self) -> Token<'a> {
        if self.pos >= self.bytes.len() {
            return Token::new(TokenKind::Eof, Subkind::None, "", self.line);
        }

        let ch = self.input[self.pos..]
            .chars()
            .next()
            .expect("pos within bounds of valid utf8");

        match ch {
            ' ' | '\t' | '\r' | '\n' => self.lex_space(),
            '/' if self.bytes.get(self.pos + 1) == Some(&b'/') => self.lex_line_comment(),
            '/' if self.bytes.get(self.pos + 1) == Some(&b'*') => self.lex_block_comment(),
            '"' => self.lex_quoted_string(),
            '`' => self.lex_raw_string(),
            '\'' => self.lex_rune(),
            '0'..='9' => self.lex_number(),
            c if c == '_' || c.is_alphabetic() => self.lex_identifier(),
            _ => self.lex_operator_or_char(),
        }
    }

    fn lex_space(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let mut i = start;
        while i < self.bytes.len() && matches!(self.bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
            i += 1;
        }
        self.advance_to(i);
        Token::new(TokenKind::Space, Subkind::None, &self.input[start..i], start_line)
    }

    fn lex_line_comment(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let mut i = start;
        while i < self.bytes.len() && self.bytes[i] != b'\n' {
            i += 1;
        }
        self.advance_to(i);
        Token::new(
            TokenKind::Comment,
            Subkind::CommentLine,
            &self.input[start..i],
            start_line,
        )
    }

    fn lex_block_comment(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let bytes = self.bytes;
        let mut i = start + 2;
        while i < bytes.len() {
            if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                i += 2;
                break;
            }
            i += 1;
        }
        self.advance_to(i);
        Token::new(
            TokenKind::Comment,
            Subkind::CommentBlock,
            &self.input[start..i],
            start_line,
        )
    }

    fn lex_quoted_string(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let (end, terminated) = self.scan_delimited(start, b'"');
        if terminated {
            self.advance_to(end);
            return Token::new(
                TokenKind::String,
                Subkind::StringQuoted,
                &self.input[start..end],
                start_line,
            );
        }

        // Unterminated string at end-of-line: recover by emitting the
        // opening quote as a single `Character` token and resume right
        // after it, so the rest of the line is re-lexed normally.
        self.anomalies.push(LexAnomaly {
            line: start_line,
            byte: b'"',
        });
        let recovered_end = start + 1;
        self.advance_to(recovered_end);
        Token::new(
            TokenKind::Character,
            Subkind::None,
            &self.input[start..recovered_end],
            start_line,
        )
    }

    fn lex_raw_string(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let bytes = self.bytes;
        let mut i = start + 1;
        while i < bytes.len() && bytes[i] != b'`' {
            i += 1;
        }
        let end = if i < bytes.len() { i + 1 } else { i };
        self.advance_to(end);
        Token::new(
            TokenKind::String,
            Subkind::StringRaw,
            &self.input[start..end],
            start_line,
        )
    }

    fn lex_rune(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let (end, terminated) = self.scan_delimited(start, b'\'');
        if terminated {
            self.advance_to(end);
            return Token::new(TokenKind::Rune, Subkind::None, &self.input[start..end], start_line);
        }

        self.anomalies.push(LexAnomaly {
            line: start_line,
            byte: b'\'',
        });
        let recovered_end = start + 1;
        self.advance_to(recovered_end);
        Token::new(
            TokenKind::Character,
            Subkind::None,
            &self.input[start..recovered_end],
            start_line,
        )
    }

    fn lex_number(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let bytes = self.bytes;
        let mut i = start;
        let mut subkind;

        if bytes[i] == b'0' && matches!(bytes.get(i + 1), Some(b'b') | Some(b'B')) {
            i += 2;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            subkind = Subkind::NumBinary;
        } else if bytes[i] == b'0' && matches!(bytes.get(i + 1), Some(b'o') | Some(b'O')) {
            i += 2;
            while i < bytes.len() && ((b'0'..=b'7').contains(&bytes[i]) || bytes[i] == b'_') {
                i += 1;
            }
            subkind = Subkind::NumPrefixedOctal;
        } else if bytes[i] == b'0' && matches!(bytes.get(i + 1), Some(b'x') | Some(b'X')) {
            i += 2;
            while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                i += 1;
            }
            subkind = Subkind::NumHexadecimal;
            let mut is_float = false;
            if bytes.get(i) == Some(&b'.') {
                is_float = true;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                    i += 1;
                }
            }
            if matches!(bytes.get(i), Some(b'p') | Some(b'P')) {
                is_float = true;
                i += 1;
                if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
                    i += 1;
                }
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if is_float {
                subkind = Subkind::NumFloat;
            }
        } else {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            let mut is_float = false;
            if bytes.get(i) == Some(&b'.') {
                is_float = true;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                    i += 1;
                }
            }
            if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
                let mut j = i + 1;
                if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
                    j += 1;
                }
                if matches!(bytes.get(j), Some(b) if b.is_ascii_digit()) {
                    is_float = true;
                    j += 1;
                    while j < bytes.len() && bytes[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }
            if is_float {
                subkind = Subkind::NumFloat;
            } else {
                let digits = &self.input[start..i];
                let is_legacy_octal = digits.len() >= 2
                    && digits.as_bytes()[0] == b'0'
                    && digits.bytes().skip(1).all(|b| (b'0'..=b'7').contains(&b) || b == b'_');
                subkind = if is_legacy_octal {
                    Subkind::NumLegacyOctal
                } else {
                    Subkind::NumDecimal
                };
            }
        }

        // Imaginary suffix: only consumed when it would not itself start a
        // longer identifier (`1i` is a number, `1inch` is `1` then `inch`).
        if bytes.get(i) == Some(&b'i') {
            let continues = matches!(bytes.get(i + 1), Some(&b) if is_ident_continue_byte(b));
            if !continues {
                i += 1;
            }
        }

        let end = i;
        self.advance_to(end);
        Token::new(TokenKind::Number, subkind, &self.input[start..end], start_line)
    }

    fn lex_identifier(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let mut i = start;
        let mut all_ascii = true;
        while i < self.bytes.len() {
            let Some(ch) = self.input[i..].chars().next() else {
                break;
            };
            if ch == '_' || ch.is_alphanumeric() {
                if !ch.is_ascii() {
                    all_ascii = false;
                }
                i += ch.len_utf8();
            } else {
                break;
            }
        }
        self.advance_to(i);
        let text = &self.input[start..i];
        let kind = keywords::classify(text);
        let subkind = match kind {
            TokenKind::Identifier if all_ascii => Subkind::IdentAscii,
            TokenKind::Identifier => Subkind::IdentUnicode,
            _ => Subkind::None,
        };
        Token::new(kind, subkind, text, start_line)
    }

    fn lex_operator_or_char(&mut self) -> Token<'a> {
        let start = self.pos;
        let start_line = self.line;
        let rest = &self.input[start..];

        if let Some(op) = operators::match_operator(rest) {
            let end = start + op.len();
            self.advance_to(end);
            return Token::new(TokenKind::Operator, Subkind::None, &self.input[start..end], start_line);
        }

        let ch_len = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        let end = start + ch_len;
        self.anomalies.push(LexAnomaly {
            line: start_line,
            byte: self.bytes[start],
        });
        self.advance_to(end);
        Token::new(TokenKind::Character, Subkind::None, &self.input[start..end], start_line)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keyword_type_and_other() {
        let tokens: Vec<_> = Lexer::new("if x == nil { var y string }").collect();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Other && t.text == "nil"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Type && t.text == "string"));
    }

    #[test]
    fn line_comment_stops_at_newline() {
        let src = "// hello if\nif";
        let tokens: Vec<_> = Lexer::new(src).filter(|t| t.kind != TokenKind::Space).collect();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].subkind, Subkind::CommentLine);
        assert_eq!(tokens[0].text, "// hello if");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn block_comment_spans_lines() {
        let src = "/* line one\nline two */x";
        let tokens: Vec<_> = Lexer::new(src).filter(|t| t.kind != TokenKind::Space).collect();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].subkind, Subkind::CommentBlock);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn quoted_string_unterminated_recovers() {
        let src = "\"abc\nrest";
        let mut lexer = Lexer::new(src);
        let first = lexer.next_token();
        assert_eq!(first.kind, TokenKind::Character);
        assert_eq!(first.text, "\"");
        assert_eq!(lexer.anomalies().len(), 1);
    }

    #[test]
    fn raw_string_spans_lines_without_escapes() {
        let src = "`a\\nb\nc`";
        let tok = Lexer::new(src).next().unwrap();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.subkind, Subkind::StringRaw);
        assert_eq!(tok.text, src);
    }

    #[test]
    fn number_subkinds() {
        assert_eq!(kinds("255").into_iter().next(), Some(TokenKind::Number));
        let check = |src: &str, expect: Subkind| {
            let tok = Lexer::new(src).next().unwrap();
            assert_eq!(tok.kind, TokenKind::Number, "{src}");
            assert_eq!(tok.subkind, expect, "{src}");
            assert_eq!(tok.text, src);
        };
        check("255", Subkind::NumDecimal);
        check("0xff", Subkind::NumHexadecimal);
        check("0xFF", Subkind::NumHexadecimal);
        check("0377", Subkind::NumLegacyOctal);
        check("0o377", Subkind::NumPrefixedOctal);
        check("0b1111_1111", Subkind::NumBinary);
        check("3.14", Subkind::NumFloat);
        check("1e10", Subkind::NumFloat);
        check("0x1.fp3", Subkind::NumFloat);
    }

    #[test]
    fn identifier_ascii_vs_unicode() {
        let a = Lexer::new("foo").next().unwrap();
        assert_eq!(a.subkind, Subkind::IdentAscii);
        let u = Lexer::new("\u{00e9}tude").next().unwrap();
        assert_eq!(u.kind, TokenKind::Identifier);
        assert_eq!(u.subkind, Subkind::IdentUnicode);
    }

    #[test]
    fn operator_longest_match() {
        let tokens: Vec<_> = Lexer::new("<<= << <").filter(|t| t.kind != TokenKind::Space).collect();
        assert_eq!(tokens[0].text, "<<=");
        assert_eq!(tokens[1].text, "<<");
        assert_eq!(tokens[2].text, "<");
    }

    #[test]
    fn illegal_byte_becomes_character_token() {
        let tokens: Vec<_> = Lexer::new("a $ b").collect();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Character && t.text == "$"));
    }

    #[test]
    fn get_line_returns_full_physical_line() {
        let src = "package foo\nif x == 1 {}\n";
        let mut lexer = Lexer::new(src);
        let mut last = None;
        for tok in lexer.by_ref() {
            last = Some(tok);
        }
        let _ = last;
        assert_eq!(lexer.get_line(1), "package foo");
        assert_eq!(lexer.get_line(2), "if x == 1 {}");
    }
}
