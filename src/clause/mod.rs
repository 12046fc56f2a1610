//! The clause family. Every clause owns a list of delimiters and one
//! expression per delimiter; the generic parsing and layout lives here and
//! is driven by a small per-kind [`ClauseDescriptor`].

mod junk;
mod limit_offset;
mod select;
mod with;

use std::fmt;

pub use junk::JunkClause;
pub use limit_offset::LimitOffsetClause;
pub use select::{SelectClause, SelectQualifier};
pub use with::{Cte, CteBody, WithClause};

use crate::context::FormatContext;
use crate::element::{Element, Nesting};
use crate::error::{Result, SqlalignError};
use crate::expression::Expression;
use crate::keywords::{self, SCOPE_KEYWORDS};
use crate::string_utils::{push_line_break, right_justify, text_width};
use crate::token::{Token, TokenKind};

/// Phase of a single SELECT. Clauses must appear in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseScope {
    Initial,
    With,
    Select,
    From,
    Where,
    GroupBy,
    OrderBy,
    LimitOffset,
}

impl ClauseScope {
    /// The scope a token opens, if it is a clause keyword.
    pub fn for_token(token: &Token) -> Option<Self> {
        if token.kind() != TokenKind::Word {
            return None;
        }
        SCOPE_KEYWORDS.get(token.normalized().as_ref()).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::With => "WITH",
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::GroupBy => "GROUP BY",
            Self::OrderBy => "ORDER BY",
            Self::LimitOffset => "LIMIT/OFFSET",
        }
    }
}

impl fmt::Display for ClauseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that distinguishes one delimited clause kind from another.
pub struct ClauseDescriptor {
    pub name: &'static str,
    pub scope: ClauseScope,
    /// Keywords that may open the clause.
    pub starting: &'static [&'static str],
    /// Delimiters splitting the clause content into expressions.
    pub others: &'static phf::Set<&'static str>,
    /// Width the delimiters are aligned to.
    pub padding: usize,
    pub render_delimiter: fn(&Token, usize) -> String,
}

impl ClauseDescriptor {
    pub fn is_delimiter(&self, token: &Token) -> bool {
        matches!(token.kind(), TokenKind::Word | TokenKind::Symbol)
            && self.others.contains(token.normalized().as_ref())
    }

    fn is_start(&self, token: &Token) -> bool {
        self.starting.iter().any(|word| token.is_word(word))
    }

    fn error(&self, message: impl Into<String>) -> SqlalignError {
        SqlalignError::Clause {
            clause: self.name,
            message: message.into(),
        }
    }
}

impl fmt::Debug for ClauseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClauseDescriptor")
            .field("name", &self.name)
            .field("padding", &self.padding)
            .finish_non_exhaustive()
    }
}

/// Delimiter text as laid out: lower-case, single-spaced, right-justified.
pub fn justified_delimiter(token: &Token, padding: usize) -> String {
    right_justify(&token.normalized(), padding)
}

/// Join keywords hang two columns in; commas are right-justified.
pub fn join_delimiter(token: &Token, padding: usize) -> String {
    let text = token.normalized();
    if keywords::is_join_keyword(&text) {
        format!("  {text}")
    } else {
        right_justify(&text, padding)
    }
}

pub static WITH: ClauseDescriptor = ClauseDescriptor {
    name: "WITH",
    scope: ClauseScope::With,
    starting: &["with"],
    others: &keywords::COMMA,
    padding: 0,
    render_delimiter: justified_delimiter,
};

pub static SELECT: ClauseDescriptor = ClauseDescriptor {
    name: "SELECT",
    scope: ClauseScope::Select,
    starting: &["select"],
    others: &keywords::COMMA,
    padding: 6,
    render_delimiter: justified_delimiter,
};

pub static FROM: ClauseDescriptor = ClauseDescriptor {
    name: "FROM",
    scope: ClauseScope::From,
    starting: &["from"],
    others: &keywords::FROM_DELIMITERS,
    padding: 6,
    render_delimiter: join_delimiter,
};

pub static WHERE: ClauseDescriptor = ClauseDescriptor {
    name: "WHERE",
    scope: ClauseScope::Where,
    starting: &["where"],
    others: &keywords::WHERE_DELIMITERS,
    padding: 6,
    render_delimiter: justified_delimiter,
};

pub static GROUP_BY: ClauseDescriptor = ClauseDescriptor {
    name: "GROUP BY",
    scope: ClauseScope::GroupBy,
    starting: &["group by"],
    others: &keywords::GROUP_BY_DELIMITERS,
    padding: 8,
    render_delimiter: justified_delimiter,
};

pub static ORDER_BY: ClauseDescriptor = ClauseDescriptor {
    name: "ORDER BY",
    scope: ClauseScope::OrderBy,
    starting: &["order by"],
    others: &keywords::COMMA,
    padding: 8,
    render_delimiter: justified_delimiter,
};

pub static LIMIT_OFFSET: ClauseDescriptor = ClauseDescriptor {
    name: "LIMIT/OFFSET",
    scope: ClauseScope::LimitOffset,
    starting: &["limit", "offset"],
    others: &keywords::LIMIT_OFFSET_KEYWORDS,
    padding: 6,
    render_delimiter: justified_delimiter,
};

/// Check that `elements` opens with one of the descriptor's starting
/// keywords and split that keyword off.
pub(crate) fn take_start(
    desc: &ClauseDescriptor,
    mut elements: Vec<Element>,
) -> Result<(Token, Vec<Element>)> {
    if elements.is_empty() {
        return Err(desc.error("is empty"));
    }
    match elements.remove(0) {
        Element::Token(token) if desc.is_start(&token) => Ok((token, elements)),
        Element::Token(token) => Err(desc.error(format!(
            "must start with {}, found {:?}",
            desc.starting.join(" or "),
            token.value()
        ))),
        Element::Nested(_) => Err(desc.error(format!(
            "must start with {}, found a subquery",
            desc.starting.join(" or ")
        ))),
    }
}

/// Split clause content on the descriptor's delimiters at the top level.
/// Returns the delimiters found and one chunk more than delimiters: the
/// chunk before the first delimiter comes first.
pub(crate) fn split_elements(
    desc: &ClauseDescriptor,
    elements: Vec<Element>,
) -> (Vec<Token>, Vec<Vec<Element>>) {
    let mut nesting = Nesting::default();
    let mut delimiters = Vec::new();
    let mut chunks = vec![Vec::new()];

    for element in elements {
        if nesting.is_split_point(&element, |t| desc.is_delimiter(t)) {
            if let Element::Token(token) = element {
                delimiters.push(token);
                chunks.push(Vec::new());
                continue;
            }
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(element);
        }
    }
    (delimiters, chunks)
}

/// Lay out delimiter/expression pairs, one pair per line.
pub(crate) fn render_delimited(
    desc: &ClauseDescriptor,
    delimiters: &[Token],
    expressions: &[Expression],
    out: &mut String,
    indent: usize,
) {
    for (i, (delimiter, expression)) in delimiters.iter().zip(expressions).enumerate() {
        if i > 0 {
            push_line_break(out, indent);
        }
        let text = (desc.render_delimiter)(delimiter, desc.padding);
        out.push_str(&text);
        if !expression.is_empty() {
            out.push(' ');
            expression.render(out, indent + text_width(&text) + 1);
        }
    }
}

/// A clause whose content is nothing but delimited expressions:
/// FROM, WHERE, GROUP BY and ORDER BY.
#[derive(Debug, Clone)]
pub struct DelimitedClause {
    descriptor: &'static ClauseDescriptor,
    delimiters: Vec<Token>,
    expressions: Vec<Expression>,
}

impl DelimitedClause {
    pub fn parse(
        descriptor: &'static ClauseDescriptor,
        elements: Vec<Element>,
        ctx: FormatContext,
    ) -> Result<Self> {
        let (start, rest) = take_start(descriptor, elements)?;
        let (others, chunks) = split_elements(descriptor, rest);
        let mut delimiters = Vec::with_capacity(others.len() + 1);
        delimiters.push(start);
        delimiters.extend(others);
        let expressions = chunks
            .into_iter()
            .map(|chunk| Expression::new(chunk, ctx))
            .collect();
        Ok(Self {
            descriptor,
            delimiters,
            expressions,
        })
    }

    pub fn delimiters(&self) -> &[Token] {
        &self.delimiters
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn render(&self, out: &mut String, indent: usize) {
        render_delimited(
            self.descriptor,
            &self.delimiters,
            &self.expressions,
            out,
            indent,
        );
    }
}

/// One clause of a statement.
#[derive(Debug, Clone)]
pub enum Clause {
    Junk(JunkClause),
    With(WithClause),
    Select(SelectClause),
    From(DelimitedClause),
    Where(DelimitedClause),
    GroupBy(DelimitedClause),
    OrderBy(DelimitedClause),
    LimitOffset(LimitOffsetClause),
}

impl Clause {
    /// Build the clause for `scope` from its buffered content, which must
    /// begin with the scope's keyword (anything goes for `Initial`).
    pub fn parse(scope: ClauseScope, elements: Vec<Element>, ctx: FormatContext) -> Result<Self> {
        Ok(match scope {
            ClauseScope::Initial => Self::Junk(JunkClause::parse(elements)?),
            ClauseScope::With => Self::With(WithClause::parse(elements, ctx)?),
            ClauseScope::Select => Self::Select(SelectClause::parse(elements, ctx)?),
            ClauseScope::From => Self::From(DelimitedClause::parse(&FROM, elements, ctx)?),
            ClauseScope::Where => Self::Where(DelimitedClause::parse(&WHERE, elements, ctx)?),
            ClauseScope::GroupBy => {
                Self::GroupBy(DelimitedClause::parse(&GROUP_BY, elements, ctx)?)
            }
            ClauseScope::OrderBy => {
                Self::OrderBy(DelimitedClause::parse(&ORDER_BY, elements, ctx)?)
            }
            ClauseScope::LimitOffset => {
                Self::LimitOffset(LimitOffsetClause::parse(elements, ctx)?)
            }
        })
    }

    pub fn scope(&self) -> ClauseScope {
        match self {
            Self::Junk(_) => ClauseScope::Initial,
            Self::With(_) => ClauseScope::With,
            Self::Select(_) => ClauseScope::Select,
            Self::From(_) => ClauseScope::From,
            Self::Where(_) => ClauseScope::Where,
            Self::GroupBy(_) => ClauseScope::GroupBy,
            Self::OrderBy(_) => ClauseScope::OrderBy,
            Self::LimitOffset(_) => ClauseScope::LimitOffset,
        }
    }

    /// Number of delimiters; always equal to [`Clause::expression_count`].
    pub fn delimiter_count(&self) -> usize {
        match self {
            Self::Junk(_) => 0,
            Self::With(clause) => clause.delimiters().len(),
            Self::Select(clause) => clause.delimiters().len(),
            Self::From(clause) | Self::Where(clause) | Self::GroupBy(clause) | Self::OrderBy(clause) => {
                clause.delimiters().len()
            }
            Self::LimitOffset(clause) => clause.delimiters().len(),
        }
    }

    pub fn expression_count(&self) -> usize {
        match self {
            Self::Junk(_) => 0,
            Self::With(clause) => clause.ctes().len(),
            Self::Select(clause) => clause.expressions().len(),
            Self::From(clause) | Self::Where(clause) | Self::GroupBy(clause) | Self::OrderBy(clause) => {
                clause.expressions().len()
            }
            Self::LimitOffset(clause) => clause.expressions().len(),
        }
    }

    /// Append the clause to `out`, which is positioned at column `indent`.
    pub fn render(&self, out: &mut String, indent: usize) {
        match self {
            Self::Junk(clause) => clause.render(out, indent),
            Self::With(clause) => clause.render(out, indent),
            Self::Select(clause) => clause.render(out, indent),
            Self::From(clause) | Self::Where(clause) | Self::GroupBy(clause) | Self::OrderBy(clause) => {
                clause.render(out, indent)
            }
            Self::LimitOffset(clause) => clause.render(out, indent),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::collapse::tokenize;
    use crate::element::Element;

    pub fn elements(text: &str) -> Vec<Element> {
        tokenize(text).unwrap().into_iter().map(Element::Token).collect()
    }
}
