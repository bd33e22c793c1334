//! The category selector and numeric value query.
//!
//! A selector is a packed bitset over the twelve content categories plus an
//! independent grep-mode flag, built once at startup from the user's
//! selector argument and shared read-only with every worker — the "shared
//! global flags become a configuration struct" design note from the spec
//! applied to this one piece of state.

use crate::lexer::{Subkind, Token, TokenKind};

pub const COMMENTS: u16 = 1 << 0; // C
pub const PREDEFINED_NONTYPE: u16 = 1 << 1; // D
pub const IDENTIFIERS: u16 = 1 << 2; // I
pub const KEYWORDS: u16 = 1 << 3; // K
pub const NUMBERS_TEXT: u16 = 1 << 4; // N
pub const OPERATORS: u16 = 1 << 5; // O
pub const PACKAGE: u16 = 1 << 6; // P
pub const RUNES: u16 = 1 << 7; // R
pub const STRINGS: u16 = 1 << 8; // S
pub const TYPES: u16 = 1 << 9; // T
pub const VALUE: u16 = 1 << 10; // V

const ALL_CONTENT: u16 = COMMENTS
    | PREDEFINED_NONTYPE
    | IDENTIFIERS
    | KEYWORDS
    | NUMBERS_TEXT
    | OPERATORS
    | PACKAGE
    | RUNES
    | STRINGS
    | TYPES
    | VALUE;

/// A parsed `SELECTOR` argument: which token categories a pattern may match,
/// plus the independent grep-mode toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selector {
    bits: u16,
    pub grep: bool,
}

impl Selector {
    /// Parse a selector string left to right. Lowercase letters set the
    /// matching bit, uppercase clear it, `a` presets every content bit, `g`
    /// toggles grep-mode independently of the bitset. Unknown letters are
    /// reported back as warnings but otherwise ignored.
    pub fn parse(raw: &str) -> (Self, Vec<String>) {
        let mut selector = Selector::default();
        let mut warnings = Vec::new();

        for ch in raw.chars() {
            match ch {
                'a' => selector.bits |= ALL_CONTENT,
                'A' => selector.bits &= !ALL_CONTENT,
                'g' => selector.grep = true,
                'G' => selector.grep = false,
                'c' => selector.bits |= COMMENTS,
                'C' => selector.bits &= !COMMENTS,
                'd' => selector.bits |= PREDEFINED_NONTYPE,
                'D' => selector.bits &= !PREDEFINED_NONTYPE,
                'i' => selector.bits |= IDENTIFIERS,
                'I' => selector.bits &= !IDENTIFIERS,
                'k' => selector.bits |= KEYWORDS,
                'K' => selector.bits &= !KEYWORDS,
                'n' => selector.bits |= NUMBERS_TEXT,
                'N' => selector.bits &= !NUMBERS_TEXT,
                'o' => selector.bits |= OPERATORS,
                'O' => selector.bits &= !OPERATORS,
                'p' => selector.bits |= PACKAGE,
                'P' => selector.bits &= !PACKAGE,
                'r' => selector.bits |= RUNES,
                'R' => selector.bits &= !RUNES,
                's' => selector.bits |= STRINGS,
                'S' => selector.bits &= !STRINGS,
                't' => selector.bits |= TYPES,
                'T' => selector.bits &= !TYPES,
                'v' => selector.bits |= VALUE,
                'V' => selector.bits &= !VALUE,
                other => warnings.push(format!("unknown selector letter '{other}' ignored")),
            }
        }

        (selector, warnings)
    }

    pub fn has(&self, bit: u16) -> bool {
        self.bits & bit != 0
    }

    pub fn value_active(&self) -> bool {
        self.has(VALUE)
    }

    /// Clear the `V` bit, used when the value-query string fails to parse.
    pub fn disable_value(&mut self) {
        self.bits &= !VALUE;
    }

    /// The category bits a given token participates in. `is_package_name`
    /// marks an identifier immediately following the `package` keyword.
    pub fn categories_of(token: &Token, is_package_name: bool) -> u16 {
        let mut bits = match token.kind {
            TokenKind::Comment => COMMENTS,
            TokenKind::Other => PREDEFINED_NONTYPE,
            TokenKind::Identifier => IDENTIFIERS,
            TokenKind::Keyword => KEYWORDS,
            TokenKind::Number => NUMBERS_TEXT,
            TokenKind::Operator => OPERATORS,
            TokenKind::Rune => RUNES,
            TokenKind::String => STRINGS,
            TokenKind::Type => TYPES,
            TokenKind::Character | TokenKind::Space | TokenKind::Eof => 0,
        };
        if is_package_name {
            bits |= PACKAGE;
        }
        bits
    }

    pub fn matches_any(&self, token_categories: u16) -> bool {
        self.bits & token_categories != 0
    }
}

/// A numeric operand parsed from the pattern string when `V` is active.
/// Represents the tagged union { Integer, Float } of `spec.md` §3, with the
/// sign split out so it can be compared against an always-unsigned token
/// value (see the open question in `DESIGN.md` about `-255` queries).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueQuery {
    Integer { magnitude: u64, sign: i8 },
    Float { magnitude: f64, sign: i8 },
}

impl ValueQuery {
    /// Parse the pattern text as a value query: an optional leading `-`,
    /// then an unsigned integer in any of the subject language's numeric
    /// bases, falling back to a plain float. `None` means both parses
    /// failed and `V` should be disabled with a warning.
    pub fn parse(text: &str) -> Option<Self> {
        let (sign, rest) = match text.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, text),
        };

        if let Some(magnitude) = parse_unsigned_any_base(rest) {
            return Some(ValueQuery::Integer { magnitude, sign });
        }
        if let Ok(magnitude) = rest.parse::<f64>() {
            return Some(ValueQuery::Float { magnitude, sign });
        }
        None
    }
}

/// Parse an unsigned integer written in any of the subject language's
/// number syntaxes: `0b`/`0o`/`0x` prefixes, leading-zero legacy octal, or
/// plain decimal. Digit separators (`_`) are stripped before parsing.
fn parse_unsigned_any_base(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    if let Some(rest) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return u64::from_str_radix(rest, 2).ok();
    }
    if let Some(rest) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return u64::from_str_radix(rest, 8).ok();
    }
    if let Some(rest) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return u64::from_str_radix(rest, 16).ok();
    }
    if cleaned.len() > 1 && cleaned.starts_with('0') {
        return u64::from_str_radix(&cleaned[1..], 8).ok();
    }
    cleaned.parse::<u64>().ok()
}

/// The numeric value carried by a `Number` token, used for the `V` test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue {
    Integer(u64),
    Float(f64),
}

/// Interpret a `Number` token's text as a value, per its lexed subkind.
pub fn token_value(text: &str, subkind: Subkind) -> Option<TokenValue> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let cleaned = cleaned.strip_suffix('i').unwrap_or(&cleaned);

    match subkind {
        Subkind::NumBinary => {
            let rest = cleaned.trim_start_matches("0b").trim_start_matches("0B");
            u64::from_str_radix(rest, 2).ok().map(TokenValue::Integer)
        }
        Subkind::NumPrefixedOctal => {
            let rest = cleaned.trim_start_matches("0o").trim_start_matches("0O");
            u64::from_str_radix(rest, 8).ok().map(TokenValue::Integer)
        }
        Subkind::NumLegacyOctal => {
            let rest = cleaned.trim_start_matches('0');
            if rest.is_empty() {
                Some(TokenValue::Integer(0))
            } else {
                u64::from_str_radix(rest, 8).ok().map(TokenValue::Integer)
            }
        }
        Subkind::NumHexadecimal => {
            let rest = cleaned.trim_start_matches("0x").trim_start_matches("0X");
            u64::from_str_radix(rest, 16).ok().map(TokenValue::Integer)
        }
        Subkind::NumDecimal => cleaned.parse::<u64>().ok().map(TokenValue::Integer),
        Subkind::NumFloat => {
            if cleaned.starts_with("0x") || cleaned.starts_with("0X") {
                parse_hex_float(cleaned).map(TokenValue::Float)
            } else {
                cleaned.parse::<f64>().ok().map(TokenValue::Float)
            }
        }
        _ => None,
    }
}

/// Minimal hex-float parser for `0x1.fp3`-style literals: mantissa in base
/// 16, binary exponent after `p`/`P`.
fn parse_hex_float(text: &str) -> Option<f64> {
    let body = text.get(2..)?; // strip "0x"/"0X"
    let (mantissa_part, exponent_part) = match body.find(['p', 'P']) {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, "0"),
    };
    let (int_part, frac_part) = match mantissa_part.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa_part, ""),
    };

    let mut mantissa = 0f64;
    for c in int_part.chars() {
        mantissa = mantissa * 16.0 + c.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        mantissa += c.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }

    let exponent: i32 = exponent_part.parse().ok()?;
    Some(mantissa * 2f64.powi(exponent))
}

/// Does a token's numeric value equal the query's (sign, magnitude)? Token
/// values are always non-negative (see the module doc's open question), so
/// a negative query can never match — left unchanged pending the upstream
/// clarification `spec.md` §9 calls out.
pub fn value_matches(value: TokenValue, query: ValueQuery) -> bool {
    if query_sign(query) != 1 {
        return false;
    }
    match (value, query) {
        (TokenValue::Integer(v), ValueQuery::Integer { magnitude, .. }) => v == magnitude,
        (TokenValue::Integer(v), ValueQuery::Float { magnitude, .. }) => v as f64 == magnitude,
        (TokenValue::Float(v), ValueQuery::Integer { magnitude, .. }) => v == magnitude as f64,
        (TokenValue::Float(v), ValueQuery::Float { magnitude, .. }) => v == magnitude,
    }
}

fn query_sign(query: ValueQuery) -> i8 {
    match query {
        ValueQuery::Integer { sign, .. } => sign,
        ValueQuery::Float { sign, .. } => sign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_letter_sets_all_but_grep() {
        let (selector, warnings) = Selector::parse("a");
        assert!(warnings.is_empty());
        assert!(selector.has(COMMENTS));
        assert!(selector.has(VALUE));
        assert!(!selector.grep);
    }

    #[test]
    fn uppercase_clears_a_bit_set_by_lowercase_a() {
        let (selector, _) = Selector::parse("aC");
        assert!(!selector.has(COMMENTS));
        assert!(selector.has(KEYWORDS));
    }

    #[test]
    fn grep_is_independent_of_content_bits() {
        let (selector, _) = Selector::parse("g");
        assert!(selector.grep);
        assert_eq!(selector.has(COMMENTS), false);
    }

    #[test]
    fn unknown_letter_warns_and_is_ignored() {
        let (_, warnings) = Selector::parse("z");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn value_query_parses_all_equal_forms() {
        let query = ValueQuery::parse("255").unwrap();
        for text in ["255", "0xff", "0xFF", "0377", "0o377", "0b1111_1111"] {
            let tok = crate::lexer::Lexer::new(text).next().unwrap();
            let value = token_value(tok.text, tok.subkind).unwrap();
            assert!(value_matches(value, query), "{text} should match 255");
        }
    }

    #[test]
    fn negative_query_never_matches_unsigned_token() {
        let query = ValueQuery::parse("-255").unwrap();
        let tok = crate::lexer::Lexer::new("255").next().unwrap();
        let value = token_value(tok.text, tok.subkind).unwrap();
        assert!(!value_matches(value, query));
    }

    #[test]
    fn value_query_falls_back_to_float() {
        assert_eq!(
            ValueQuery::parse("3.5"),
            Some(ValueQuery::Float {
                magnitude: 3.5,
                sign: 1
            })
        );
    }

    #[test]
    fn value_query_rejects_garbage() {
        assert_eq!(ValueQuery::parse("not-a-number"), None);
    }
}
