use memchr::{memchr, memchr2};
use smallvec::SmallVec;

use crate::error::Result;
use crate::keywords;
use crate::token::{Token, TokenKind};

/// Split `text` into tokens. Concatenating the values of the returned tokens
/// always reproduces `text` exactly.
///
/// At each position the first matching rule wins: newline, spaces, quoted
/// literal, line comment, block comment, keyphrase, word, number, and finally
/// a single-character symbol. Unterminated quotes and block comments extend
/// to the end of input.
pub fn lex(text: &str) -> Result<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::with_capacity(text.len() / 3 + 1);
    let mut pos = 0;

    while pos < bytes.len() {
        let rest = &text[pos..];
        let (kind, len) = scan_token(rest);
        tokens.push(Token::new(kind, &rest[..len])?);
        pos += len;
    }

    tracing::trace!(tokens = tokens.len(), "lexed input");
    Ok(tokens)
}

/// Classify the token at the start of `rest` and return its byte length.
fn scan_token(rest: &str) -> (TokenKind, usize) {
    let bytes = rest.as_bytes();
    match bytes[0] {
        b'\n' => (TokenKind::Newline, 1),
        b' ' => (TokenKind::Spaces, scan_spaces(bytes)),
        b'\'' | b'"' | b'`' => (TokenKind::Literal, scan_quoted(bytes)),
        b'$' => match scan_dollar_string(bytes) {
            0 => (TokenKind::Symbol, 1),
            n => (TokenKind::Literal, n),
        },
        b'-' if bytes.get(1) == Some(&b'-') => (TokenKind::LineComment, scan_line_comment(bytes)),
        b'/' if bytes.get(1) == Some(&b'*') => {
            (TokenKind::BlockComment, scan_block_comment(bytes))
        }
        b'0'..=b'9' => (TokenKind::Word, scan_number(bytes)),
        b'.' if bytes.get(1).is_some_and(u8::is_ascii_digit) => {
            (TokenKind::Word, scan_number(bytes))
        }
        _ => {
            let word_len = scan_word(rest);
            if word_len > 0 {
                let len = scan_keyphrase(rest).unwrap_or(word_len);
                (TokenKind::Word, len)
            } else {
                let len = rest.chars().next().map_or(1, char::len_utf8);
                (TokenKind::Symbol, len)
            }
        }
    }
}

#[inline]
fn scan_spaces(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| b == b' ').count()
}

/// Scan a word: a letter or underscore followed by letters, digits and
/// underscores. Returns 0 if `text` does not start a word.
fn scan_word(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map_or(text.len(), |(i, _)| i)
}

/// Scan a number: a digit (or a dot followed by a digit), then any run of
/// digits, dots and exponent markers. Deliberately loose.
fn scan_number(bytes: &[u8]) -> usize {
    let start = if bytes[0] == b'.' { 2 } else { 1 };
    start
        + bytes[start..]
            .iter()
            .take_while(|&&b| b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E')
            .count()
}

/// Try to match the longest multi-word keyphrase at the start of `text`.
/// Words may be separated by any whitespace, newlines included.
/// Returns the byte length of the matched text.
fn scan_keyphrase(text: &str) -> Option<usize> {
    let mut words: SmallVec<[String; 4]> = SmallVec::new();
    let mut ends: SmallVec<[usize; 4]> = SmallVec::new();
    let mut pos = 0;

    while words.len() < 4 {
        let len = scan_word(&text[pos..]);
        if len == 0 {
            break;
        }
        words.push(text[pos..pos + len].to_lowercase());
        ends.push(pos + len);
        pos += len;

        let gap = text.as_bytes()[pos..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if gap == 0 {
            break;
        }
        pos += gap;
    }

    keywords::longest_keyphrase(&words).map(|n| ends[n - 1])
}

/// Scan a quoted literal opened by `'`, `"` or a backtick. A doubled quote
/// character and any backslash-escaped character stay inside the literal.
/// Returns the byte length including both delimiters.
fn scan_quoted(bytes: &[u8]) -> usize {
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        let Some(offset) = memchr2(quote, b'\\', &bytes[i..]) else {
            return bytes.len();
        };
        let pos = i + offset;
        match bytes[pos] {
            b'\\' => i = pos + 2,
            _ if bytes.get(pos + 1) == Some(&quote) => i = pos + 2,
            _ => return pos + 1,
        }
    }
    bytes.len()
}

/// Scan a dollar-quoted string (`$tag$...$tag$`, the tag may be empty).
/// Returns 0 when `bytes` does not open one.
fn scan_dollar_string(bytes: &[u8]) -> usize {
    let mut tag_end = 1;
    if bytes.get(1).is_some_and(u8::is_ascii_digit) {
        return 0;
    }
    while tag_end < bytes.len() && (bytes[tag_end].is_ascii_alphanumeric() || bytes[tag_end] == b'_')
    {
        tag_end += 1;
    }
    if tag_end >= bytes.len() || bytes[tag_end] != b'$' {
        return 0;
    }
    let tag = &bytes[..=tag_end];

    let mut i = tag.len();
    while i < bytes.len() {
        let Some(offset) = memchr(b'$', &bytes[i..]) else {
            return bytes.len();
        };
        let pos = i + offset;
        if bytes[pos..].starts_with(tag) {
            return pos + tag.len();
        }
        i = pos + 1;
    }
    bytes.len()
}

/// Scan a `--` comment through the end of its line, newline included.
fn scan_line_comment(bytes: &[u8]) -> usize {
    memchr(b'\n', bytes).map_or(bytes.len(), |offset| offset + 1)
}

/// Scan a `/* ... */` comment. Comments do not nest: the first `*/` closes.
fn scan_block_comment(bytes: &[u8]) -> usize {
    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}
