//! Longest-match table of the subject language's punctuation and operators.

/// Tried in order, longest first, so that e.g. `<<=` is preferred over `<<`
/// which is preferred over `<`.
const THREE_CHAR: &[&str] = &["<<=", ">>=", "&^=", "..."];

const TWO_CHAR: &[&str] = &[
    "&&", "||", "==", "!=", "<=", ">=", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    ":=", "<-", "++", "--", "&^",
];

const ONE_CHAR: &[char] = &[
    '+', '-', '*', '/', '%', '&', '|', '^', '<', '>', '=', '(', ')', '[', ']', '{', '}', ',', ';',
    ':', '.', '!', '~', '?',
];

/// Try to match an operator starting at the beginning of `s`, longest first.
/// Returns the matched operator text (a slice of `s`).
pub fn match_operator(s: &str) -> Option<&str> {
    for candidate in THREE_CHAR {
        if s.starts_with(candidate) {
            return Some(&s[..candidate.len()]);
        }
    }
    for candidate in TWO_CHAR {
        if s.starts_with(candidate) {
            return Some(&s[..candidate.len()]);
        }
    }
    let first = s.chars().next()?;
    if ONE_CHAR.contains(&first) {
        return Some(&s[..first.len_utf8()]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longest_match() {
        assert_eq!(match_operator("<<=x"), Some("<<="));
        assert_eq!(match_operator("<<x"), Some("<<"));
        assert_eq!(match_operator("<x"), Some("<"));
    }

    #[test]
    fn no_match_for_unknown_byte() {
        assert_eq!(match_operator("$"), None);
    }
}
