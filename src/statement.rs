use std::collections::BTreeMap;

use crate::clause::{Clause, ClauseScope};
use crate::compound::CompoundStatement;
use crate::context::FormatContext;
use crate::element::{next_significant, paren_matches, Element};
use crate::error::{Result, SqlalignError};
use crate::string_utils::push_line_break;
use crate::token::Token;

/// A single SELECT: at most one clause per scope, in scope order.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    clauses: BTreeMap<ClauseScope, Clause>,
}

impl Statement {
    /// Split `tokens` into clauses at top-level clause keywords.
    ///
    /// A `(` whose first significant token is SELECT or WITH starts a
    /// subquery: the balanced group is parsed into its own
    /// [`CompoundStatement`] and kept as a single element. Other
    /// parentheses hide clause keywords. Clause scopes must strictly
    /// increase, except that LIMIT and OFFSET share one scope.
    pub fn parse(tokens: &[Token], ctx: FormatContext) -> Result<Self> {
        let mut statement = Self::default();
        let mut scope = ClauseScope::Initial;
        let mut buffer: Vec<Element> = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;
        let closes = paren_matches(tokens);
        let mut warned_unclosed = false;

        while i < tokens.len() {
            let token = &tokens[i];

            if token.is_open_paren() {
                if let Some(close) = subquery_end(tokens, &closes, i, &mut warned_unclosed) {
                    let inner_ctx = ctx.nested()?;
                    tracing::debug!(depth = inner_ctx.depth(), "extracting subquery");
                    let inner = CompoundStatement::parse(&tokens[i + 1..close], inner_ctx)?;
                    buffer.push(Element::Nested(Box::new(inner)));
                    i = close + 1;
                    continue;
                }
                depth += 1;
            } else if token.is_close_paren() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                if let Some(found) = ClauseScope::for_token(token) {
                    if found == scope && scope == ClauseScope::LimitOffset {
                        // LIMIT and OFFSET alternate inside one clause
                    } else if found <= scope {
                        return Err(SqlalignError::Ordering {
                            keyword: token.normalized().into_owned(),
                            found,
                            current: scope,
                        });
                    } else {
                        statement.flush(scope, std::mem::take(&mut buffer), ctx)?;
                        scope = found;
                    }
                }
            }

            buffer.push(Element::Token(token.clone()));
            i += 1;
        }
        statement.flush(scope, buffer, ctx)?;
        Ok(statement)
    }

    fn flush(&mut self, scope: ClauseScope, buffer: Vec<Element>, ctx: FormatContext) -> Result<()> {
        if scope == ClauseScope::Initial && buffer.iter().all(Element::is_blank) {
            return Ok(());
        }
        tracing::debug!(scope = %scope, elements = buffer.len(), "flushing clause");
        let clause = Clause::parse(scope, buffer, ctx)?;
        self.clauses.insert(scope, clause);
        Ok(())
    }

    pub fn clause(&self, scope: ClauseScope) -> Option<&Clause> {
        self.clauses.get(&scope)
    }

    /// Clauses in scope order.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.values()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append the statement to `out`, which is positioned at column `indent`.
    pub fn render(&self, out: &mut String, indent: usize) {
        for (i, clause) in self.clauses.values().enumerate() {
            if i > 0 {
                push_line_break(out, indent);
            }
            clause.render(out, indent);
        }
    }
}

/// If the `(` at `open` starts a subquery, the index of its `)`. `closes`
/// is the [`paren_matches`] table of `tokens`.
fn subquery_end(
    tokens: &[Token],
    closes: &[Option<usize>],
    open: usize,
    warned_unclosed: &mut bool,
) -> Option<usize> {
    let first = next_significant(tokens, open + 1)?;
    if !(tokens[first].is_word("select") || tokens[first].is_word("with")) {
        return None;
    }
    let close = closes[open];
    if close.is_none() && !*warned_unclosed {
        tracing::warn!("subquery parenthesis is never closed");
        *warned_unclosed = true;
    }
    close
}
