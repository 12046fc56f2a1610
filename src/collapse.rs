//! Passes over the flat token stream that fuse several tokens into one.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::error::Result;
use crate::keywords;
use crate::lexer::lex;
use crate::token::{Token, TokenKind};

/// Lex `text` and run both collapse passes.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let tokens = lex(text)?;
    let tokens = collapse_keyphrases(tokens)?;
    collapse_identifiers(tokens)
}

/// Fuse runs of single words separated only by whitespace into one WORD
/// token when they spell a known keyphrase, longest phrase first.
///
/// The lexer already matches keyphrases in raw text; this pass covers token
/// streams assembled from other sources and is a no-op on lexer output.
pub fn collapse_keyphrases(tokens: Vec<Token>) -> Result<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match keyphrase_end(&tokens, i) {
            Some(end) => {
                out.push(fuse(&tokens[i..=end], TokenKind::Word)?);
                i = end + 1;
            }
            None => {
                out.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Index of the last token of the longest keyphrase starting at `start`.
fn keyphrase_end(tokens: &[Token], start: usize) -> Option<usize> {
    let mut words: SmallVec<[String; 4]> = SmallVec::new();
    let mut positions: SmallVec<[usize; 4]> = SmallVec::new();
    let mut i = start;

    while words.len() < 4 {
        let Some(token) = tokens.get(i) else {
            break;
        };
        if token.kind() != TokenKind::Word || token.is_keyphrase() {
            break;
        }
        words.push(token.normalized().into_owned());
        positions.push(i);

        let gap = tokens[i + 1..]
            .iter()
            .take_while(|t| t.is_whitespace())
            .count();
        if gap == 0 {
            break;
        }
        i += gap + 1;
    }

    keywords::longest_keyphrase(&words).map(|n| positions[n - 1])
}

/// True for a token that can be one dotted piece of a qualified name.
fn is_identifier_piece(token: &Token) -> bool {
    match token.kind() {
        TokenKind::Word => {
            !token.is_keyphrase()
                && token
                    .value()
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphabetic() || c == '_')
        }
        TokenKind::Literal => is_quoted_identifier(token),
        _ => false,
    }
}

fn is_quoted_identifier(token: &Token) -> bool {
    token.kind() == TokenKind::Literal
        && (token.value().starts_with('"') || token.value().starts_with('`'))
}

/// Match a qualified identifier (`a.b`, `s."T".c`) at the start of `tokens`.
///
/// Returns the fused token and how many input tokens it replaces. At least
/// three tokens are required, and matching stops at the first break in the
/// identifier-dot-identifier pattern. The fused token is a LITERAL when any
/// piece is quoted, a WORD otherwise.
pub fn get_qualified_identifier(tokens: &[Token]) -> Option<(Token, usize)> {
    if tokens.len() < 3 || !is_identifier_piece(&tokens[0]) {
        return None;
    }
    let mut consumed = 1;
    while consumed + 1 < tokens.len()
        && tokens[consumed].is_symbol('.')
        && is_identifier_piece(&tokens[consumed + 1])
    {
        consumed += 2;
    }
    if consumed < 3 {
        return None;
    }

    let pieces = &tokens[..consumed];
    let kind = if pieces.iter().any(is_quoted_identifier) {
        TokenKind::Literal
    } else {
        TokenKind::Word
    };
    fuse(pieces, kind).ok().map(|token| (token, consumed))
}

/// Replace every qualified identifier in the stream by a single token.
pub fn collapse_identifiers(tokens: Vec<Token>) -> Result<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match get_qualified_identifier(&tokens[i..]) {
            Some((token, consumed)) => {
                out.push(token);
                i += consumed;
            }
            None => {
                out.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    Ok(out)
}

fn fuse(pieces: &[Token], kind: TokenKind) -> Result<Token> {
    let value: CompactString = pieces.iter().map(Token::value).collect();
    Token::new(kind, value)
}
