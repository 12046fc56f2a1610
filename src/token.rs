use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use compact_str::CompactString;

use crate::error::SqlalignError;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Word,
    Literal,
    Symbol,
    LineComment,
    BlockComment,
    Spaces,
    Newline,
}

impl TokenKind {
    pub fn is_whitespace(self) -> bool {
        matches!(self, Self::Spaces | Self::Newline)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    /// Kinds whose equality and hashing ignore case.
    /// Literals, symbols and comments are always compared byte-for-byte.
    pub fn folds_case(self) -> bool {
        self == Self::Word
    }
}

/// An immutable token produced by the lexer.
///
/// Equality and hashing depend on the kind: words compare case-insensitively
/// (with runs of whitespace inside a keyphrase treated as one space), every
/// other kind compares its value exactly.
#[derive(Debug, Clone)]
pub struct Token {
    kind: TokenKind,
    value: CompactString,
}

impl Token {
    /// Build a token, validating the whitespace invariants.
    pub fn new(kind: TokenKind, value: impl Into<CompactString>) -> Result<Self, SqlalignError> {
        let value = value.into();
        let reason = match kind {
            TokenKind::Newline if value != "\n" => {
                Some("a newline token must hold exactly one newline character")
            }
            TokenKind::Spaces if value.is_empty() => Some("a spaces token must not be empty"),
            TokenKind::Spaces if !value.bytes().all(|b| b == b' ') => {
                Some("a spaces token may only contain space characters")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(SqlalignError::Token {
                kind,
                value: value.to_string(),
                reason,
            }),
            None => Ok(Self { kind, value }),
        }
    }

    /// A run of `len` spaces, or `None` for an empty run.
    pub fn spaces(len: usize) -> Option<Self> {
        (len > 0).then(|| Self {
            kind: TokenKind::Spaces,
            value: CompactString::from(" ".repeat(len)),
        })
    }

    pub fn newline() -> Self {
        Self {
            kind: TokenKind::Newline,
            value: CompactString::new("\n"),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind.is_whitespace()
    }

    /// Whitespace for layout purposes: spaces and newlines, plus the tab
    /// and carriage return characters the lexer leaves as symbols.
    pub fn is_blank(&self) -> bool {
        self.is_whitespace()
            || (self.kind == TokenKind::Symbol && matches!(self.value.as_str(), "\t" | "\r"))
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    pub fn is_newline(&self) -> bool {
        self.kind == TokenKind::Newline
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.value.chars().eq(std::iter::once(symbol))
    }

    pub fn is_open_paren(&self) -> bool {
        self.is_symbol('(')
    }

    pub fn is_close_paren(&self) -> bool {
        self.is_symbol(')')
    }

    /// True for a WORD token matching `word` (already lower-case, single-spaced).
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.normalized() == word
    }

    /// True for a word made of several words, such as `left outer join`.
    pub fn is_keyphrase(&self) -> bool {
        self.kind == TokenKind::Word && self.value.bytes().any(|b| b.is_ascii_whitespace())
    }

    /// Comparison key: lower-cased words with whitespace runs collapsed,
    /// the raw value for every other kind.
    pub fn normalized(&self) -> Cow<'_, str> {
        if !self.kind.folds_case() {
            return Cow::Borrowed(&self.value);
        }
        let needs_folding = self
            .value
            .bytes()
            .any(|b| b.is_ascii_uppercase() || (b.is_ascii_whitespace() && b != b' ') || b >= 0x80)
            || self.value.contains("  ");
        if !needs_folding {
            return Cow::Borrowed(&self.value);
        }
        let words: Vec<String> = self
            .value
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        Cow::Owned(words.join(" "))
    }

    /// Text used when the token is laid out: keyphrases get their internal
    /// whitespace collapsed, everything else is emitted verbatim.
    pub fn display_text(&self) -> Cow<'_, str> {
        if self.is_keyphrase() {
            let words: Vec<&str> = self.value.split_whitespace().collect();
            Cow::Owned(words.join(" "))
        } else {
            Cow::Borrowed(&self.value)
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.normalized() == other.normalized()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.normalized().hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn tok(kind: TokenKind, value: &str) -> Token {
        Token::new(kind, value).unwrap()
    }

    #[test]
    fn test_whitespace_classification() {
        assert!(TokenKind::Spaces.is_whitespace());
        assert!(TokenKind::Newline.is_whitespace());
        assert!(!TokenKind::Word.is_whitespace());
        assert!(!TokenKind::LineComment.is_whitespace());
        assert!(TokenKind::BlockComment.is_comment());
    }

    #[test]
    fn test_newline_must_be_single_newline() {
        assert!(Token::new(TokenKind::Newline, "\n").is_ok());
        assert!(Token::new(TokenKind::Newline, "\n\n").is_err());
        assert!(Token::new(TokenKind::Newline, "\r\n").is_err());
    }

    #[test]
    fn test_spaces_must_be_spaces() {
        assert!(Token::new(TokenKind::Spaces, "   ").is_ok());
        assert!(Token::new(TokenKind::Spaces, "").is_err());
        assert!(Token::new(TokenKind::Spaces, " \t").is_err());
        assert!(Token::spaces(0).is_none());
        assert_eq!(Token::spaces(3).unwrap().value(), "   ");
    }

    #[test]
    fn test_tab_and_carriage_return_symbols_are_blank() {
        let symbol = |v: &str| Token::new(TokenKind::Symbol, v).unwrap();
        assert!(symbol("\t").is_blank());
        assert!(symbol("\r").is_blank());
        assert!(!symbol("\t").is_whitespace());
        assert!(!symbol(",").is_blank());
        assert!(Token::newline().is_blank());
        assert!(!Token::new(TokenKind::Literal, "'\t'").unwrap().is_blank());
    }

    #[test]
    fn test_words_compare_case_insensitively() {
        assert_eq!(tok(TokenKind::Word, "SELECT"), tok(TokenKind::Word, "select"));
        assert_eq!(
            tok(TokenKind::Word, "LEFT  OUTER\nJoin"),
            tok(TokenKind::Word, "left outer join")
        );
        let set: HashSet<Token> = [tok(TokenKind::Word, "From"), tok(TokenKind::Word, "FROM")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_literals_and_comments_keep_case() {
        assert_ne!(tok(TokenKind::Literal, "'A'"), tok(TokenKind::Literal, "'a'"));
        assert_ne!(
            tok(TokenKind::Literal, "\"Col\""),
            tok(TokenKind::Literal, "\"col\"")
        );
        assert_ne!(
            tok(TokenKind::LineComment, "-- Hi\n"),
            tok(TokenKind::LineComment, "-- hi\n")
        );
        assert_ne!(tok(TokenKind::Word, "x"), tok(TokenKind::Literal, "x"));
    }

    #[test]
    fn test_is_word_and_symbol() {
        assert!(tok(TokenKind::Word, "Group By").is_word("group by"));
        assert!(!tok(TokenKind::Literal, "'select'").is_word("select"));
        assert!(tok(TokenKind::Symbol, "(").is_open_paren());
        assert!(tok(TokenKind::Symbol, ")").is_close_paren());
        assert!(!tok(TokenKind::Literal, "'('").is_open_paren());
    }

    #[test]
    fn test_display_text_collapses_keyphrase_whitespace() {
        assert_eq!(
            tok(TokenKind::Word, "LEFT   OUTER\nJOIN").display_text(),
            "LEFT OUTER JOIN"
        );
        assert_eq!(tok(TokenKind::Literal, "'a  b'").display_text(), "'a  b'");
    }
}
