//! Token types produced by the [`super::Lexer`].

/// The closed set of lexical categories the lexer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Space,
    Comment,
    String,
    Rune,
    Operator,
    Identifier,
    Number,
    Keyword,
    Type,
    Other,
    /// A single byte that does not begin a legal token.
    Character,
    Eof,
}

/// Finer-grained classification, only meaningful for a handful of kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subkind {
    None,
    CommentLine,
    CommentBlock,
    StringQuoted,
    StringRaw,
    IdentAscii,
    IdentUnicode,
    NumBinary,
    NumPrefixedOctal,
    NumDecimal,
    NumHexadecimal,
    NumLegacyOctal,
    NumFloat,
}

/// A lexeme with its source location. `text` borrows from the buffer the
/// lexer was constructed with, so tokens never outlive one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub subkind: Subkind,
    pub text: &'a str,
    /// 1-based line number of the token's first byte.
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, subkind: Subkind, text: &'a str, line: usize) -> Self {
        Self {
            kind,
            subkind,
            text,
            line,
        }
    }

    /// Raw strings and block comments are the only forms that can span more
    /// than one physical line; everything else is matched against the full
    /// line text instead of `text` itself.
    pub fn is_multiline_body(&self) -> bool {
        matches!(
            (self.kind, self.subkind),
            (TokenKind::Comment, Subkind::CommentBlock) | (TokenKind::String, Subkind::StringRaw)
        )
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
