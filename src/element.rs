use crate::compound::CompoundStatement;
use crate::token::{Token, TokenKind};

/// One item of a clause's content: a plain token, or a parenthesized
/// subquery already parsed into its own statement tree.
#[derive(Debug, Clone)]
pub enum Element {
    Token(Token),
    Nested(Box<CompoundStatement>),
}

impl Element {
    pub fn is_blank(&self) -> bool {
        self.as_token().is_some_and(Token::is_blank)
    }

    pub fn is_comment(&self) -> bool {
        self.as_token().is_some_and(Token::is_comment)
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.as_token().is_some_and(|t| t.kind() == kind)
    }
}

impl From<Token> for Element {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

/// Uniform token access over plain token slices and element slices, so the
/// paren helpers below work on both.
pub trait AsToken {
    fn as_token(&self) -> Option<&Token>;
}

impl AsToken for Token {
    fn as_token(&self) -> Option<&Token> {
        Some(self)
    }
}

impl AsToken for Element {
    fn as_token(&self) -> Option<&Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Nested(_) => None,
        }
    }
}

/// Index of the `)` closing the `(` at `open`, or `None` if it is never
/// closed.
pub fn find_matching_paren<T: AsToken>(items: &[T], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, item) in items.iter().enumerate().skip(open) {
        let Some(token) = item.as_token() else {
            continue;
        };
        if token.is_open_paren() {
            depth += 1;
        } else if token.is_close_paren() {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// For every item, the index of the `)` closing it if the item is a `(`
/// that gets closed. One stack pass, so callers that look up many parens
/// stay linear on unbalanced input.
pub fn paren_matches<T: AsToken>(items: &[T]) -> Vec<Option<usize>> {
    let mut matches = vec![None; items.len()];
    let mut open = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let Some(token) = item.as_token() else {
            continue;
        };
        if token.is_open_paren() {
            open.push(i);
        } else if token.is_close_paren() {
            if let Some(start) = open.pop() {
                matches[start] = Some(i);
            }
        }
    }
    matches
}

/// Index of the first item at or after `from` that is neither whitespace
/// nor a comment.
pub fn next_significant<T: AsToken>(items: &[T], from: usize) -> Option<usize> {
    items.iter().enumerate().skip(from).find_map(|(i, item)| match item.as_token() {
        Some(token) if token.is_blank() || token.is_comment() => None,
        _ => Some(i),
    })
}

/// True if every `(` in the stream is closed and no `)` is left over.
pub fn parens_balanced<T: AsToken>(items: &[T]) -> bool {
    let mut depth = 0usize;
    for token in items.iter().filter_map(AsToken::as_token) {
        if token.is_open_paren() {
            depth += 1;
        } else if token.is_close_paren() {
            match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            }
        }
    }
    depth == 0
}

/// Tracks where in a clause's content we are: inside parentheses, inside a
/// `CASE ... END`, or after a `BETWEEN` still waiting for its `AND`.
/// Delimiters only split a clause at the top level.
#[derive(Debug, Default)]
pub struct Nesting {
    parens: usize,
    cases: usize,
    pending_between: bool,
    stray_close: bool,
}

impl Nesting {
    pub fn is_top(&self) -> bool {
        self.parens == 0 && self.cases == 0
    }

    pub fn parens(&self) -> usize {
        self.parens
    }

    /// True once a `)` without a matching `(` has been seen.
    pub fn saw_stray_close(&self) -> bool {
        self.stray_close
    }

    /// Feed one element and report whether it splits the clause.
    pub fn is_split_point(&mut self, element: &Element, is_delimiter: impl Fn(&Token) -> bool) -> bool {
        let Some(token) = element.as_token() else {
            return false;
        };
        if self.is_top() && self.pending_between && token.is_word("and") {
            self.pending_between = false;
            return false;
        }
        let split = self.is_top() && is_delimiter(token);
        self.observe(token);
        split
    }

    pub fn observe(&mut self, token: &Token) {
        if token.is_open_paren() {
            self.parens += 1;
        } else if token.is_close_paren() {
            match self.parens.checked_sub(1) {
                Some(depth) => self.parens = depth,
                None => {
                    if !self.stray_close {
                        tracing::warn!("closing parenthesis without a matching opening one");
                    }
                    self.stray_close = true;
                }
            }
        } else if self.parens == 0 && token.kind() == TokenKind::Word {
            if token.is_word("case") {
                self.cases += 1;
            } else if token.is_word("end") && self.cases > 0 {
                self.cases -= 1;
            } else if token.is_word("between") && self.cases == 0 {
                self.pending_between = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn test_find_matching_paren() {
        let tokens = lex("(a, (b)) c").unwrap();
        assert_eq!(find_matching_paren(&tokens, 0), Some(7));
        assert_eq!(find_matching_paren(&tokens, 4), Some(6));

        let tokens = lex("(a, (b) c").unwrap();
        assert_eq!(find_matching_paren(&tokens, 0), None);
    }

    #[test]
    fn test_paren_matches_agrees_with_find_matching_paren() {
        for text in ["(a, (b)) c", "(a, (b) c", "a) (b", "((((", "f(x) + (g(y, (z)))"] {
            let tokens = lex(text).unwrap();
            let matches = paren_matches(&tokens);
            assert_eq!(matches.len(), tokens.len());
            for (i, token) in tokens.iter().enumerate() {
                let expected = token
                    .is_open_paren()
                    .then(|| find_matching_paren(&tokens, i))
                    .flatten();
                assert_eq!(matches[i], expected, "{text:?} at {i}");
            }
        }
    }

    #[test]
    fn test_next_significant_skips_comments() {
        let tokens = lex("( -- c\n  select").unwrap();
        let next = next_significant(&tokens, 1).unwrap();
        assert!(tokens[next].is_word("select"));
        assert_eq!(next_significant(&tokens, tokens.len()), None);
    }

    #[test]
    fn test_parens_balanced() {
        assert!(parens_balanced(&lex("f(a, (b))").unwrap()));
        assert!(!parens_balanced(&lex("f(a").unwrap()));
        assert!(!parens_balanced(&lex("a) (b").unwrap()));
        assert!(parens_balanced(&lex("'(' \")\"").unwrap()));
    }

    fn split_points(text: &str, delimiters: &[&str]) -> Vec<String> {
        let mut nesting = Nesting::default();
        lex(text)
            .unwrap()
            .into_iter()
            .map(Element::Token)
            .filter(|e| {
                nesting.is_split_point(e, |t| delimiters.contains(&t.normalized().as_ref()))
            })
            .filter_map(|e| e.as_token().map(|t| t.value().to_string()))
            .collect()
    }

    #[test]
    fn test_nesting_ignores_delimiters_inside_parens_and_case() {
        assert_eq!(split_points("a, f(b, c), d", &[","]), vec![",", ","]);
        assert_eq!(
            split_points("a and case when b and c then 1 end = 1 OR d", &["and", "or"]),
            vec!["and", "OR"]
        );
    }

    #[test]
    fn test_between_consumes_its_and() {
        assert_eq!(
            split_points("x between 1 and 2 and y between a and b", &["and"]),
            vec!["and"]
        );
    }
}
