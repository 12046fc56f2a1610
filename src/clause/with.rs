use super::{split_elements, take_start, WITH};
use crate::compound::CompoundStatement;
use crate::context::FormatContext;
use crate::element::{next_significant, paren_matches, parens_balanced, AsToken, Element};
use crate::error::Result;
use crate::expression::Expression;
use crate::string_utils::{push_line_break, text_width};
use crate::token::{Token, TokenKind};

/// Marker appended to a CTE that has no parenthesized body.
pub const MISSING_BODY_NOTE: &str = "/* sqlalign: missing CTE body */";

const BODY_INDENT: usize = 4;

/// The parenthesized part of a CTE.
#[derive(Debug, Clone)]
pub enum CteBody {
    Query(Box<CompoundStatement>),
    /// Not a query, `VALUES (...)` for instance.
    Expression(Expression),
}

impl CteBody {
    fn render(&self, out: &mut String, indent: usize) {
        match self {
            Self::Query(statement) => statement.render(out, indent),
            Self::Expression(expression) => expression.render(out, indent),
        }
    }
}

/// One common table expression: `name [(columns)] AS [MATERIALIZED]`,
/// then the body, then anything trailing it such as a SEARCH clause.
#[derive(Debug, Clone)]
pub struct Cte {
    before: Expression,
    body: Option<CteBody>,
    after: Expression,
}

impl Cte {
    fn parse(mut elements: Vec<Element>, ctx: FormatContext) -> Self {
        if let Some(i) = elements.iter().position(|e| matches!(e, Element::Nested(_))) {
            let after = elements.split_off(i + 1);
            let body = match elements.pop() {
                Some(Element::Nested(statement)) => Some(CteBody::Query(statement)),
                _ => None,
            };
            return Self {
                before: Expression::stripped(elements, ctx),
                body,
                after: Expression::stripped(after, ctx),
            };
        }

        if let Some((open, close)) = find_body_group(&elements) {
            let after = elements.split_off(close + 1);
            elements.pop();
            let inner = elements.split_off(open + 1);
            elements.pop();
            return Self {
                before: Expression::stripped(elements, ctx),
                body: Some(CteBody::Expression(Expression::stripped(inner, ctx))),
                after: Expression::stripped(after, ctx),
            };
        }

        let before = Expression::stripped(elements, ctx);
        tracing::warn!(
            cte = %before.render_to_string(0),
            "CTE has no parenthesized body"
        );
        Self {
            before,
            body: None,
            after: Expression::default(),
        }
    }

    pub fn before(&self) -> &Expression {
        &self.before
    }

    pub fn body(&self) -> Option<&CteBody> {
        self.body.as_ref()
    }

    pub fn after(&self) -> &Expression {
        &self.after
    }

    fn render(&self, out: &mut String, indent: usize, column: usize) {
        if !self.before.is_empty() {
            out.push(' ');
            self.before.render(out, column);
        }
        let Some(body) = &self.body else {
            if !self.before.contains_text(MISSING_BODY_NOTE) {
                out.push(' ');
                out.push_str(MISSING_BODY_NOTE);
            }
            return;
        };
        push_line_break(out, indent);
        out.push('(');
        push_line_break(out, indent + BODY_INDENT);
        body.render(out, indent + BODY_INDENT);
        push_line_break(out, indent);
        out.push(')');
        if !self.after.is_empty() {
            out.push(' ');
            self.after.render(out, indent + 2);
        }
    }
}

/// Fallback body search for CTEs whose body is not a query: the first
/// balanced top-level group that follows `AS` or `MATERIALIZED`, else the
/// first balanced top-level group at all.
fn find_body_group(elements: &[Element]) -> Option<(usize, usize)> {
    let closes = paren_matches(elements);
    let mut depth = 0usize;
    let mut first = None;
    let mut previous: Option<&Token> = None;

    for (i, token) in elements.iter().enumerate() {
        let Some(token) = token.as_token() else {
            continue;
        };
        if token.is_open_paren() {
            if depth == 0 {
                if let Some(close) = closes[i] {
                    if previous.is_some_and(|p| p.is_word("as") || p.is_word("materialized")) {
                        return Some((i, close));
                    }
                    first.get_or_insert((i, close));
                }
            }
            depth += 1;
        } else if token.is_close_paren() {
            depth = depth.saturating_sub(1);
        }
        if !token.is_blank() && !token.is_comment() {
            previous = Some(token);
        }
    }
    first
}

/// CTE split for content whose parentheses do not balance, where depth
/// says nothing useful. A comma splits wherever what follows reads like
/// the start of another CTE.
fn split_unbalanced(elements: Vec<Element>) -> (Vec<Token>, Vec<Vec<Element>>) {
    let splits: Vec<bool> = (0..elements.len())
        .map(|i| {
            elements[i].as_token().is_some_and(|t| t.is_symbol(','))
                && starts_cte(&elements, i + 1)
        })
        .collect();

    let mut delimiters = Vec::new();
    let mut chunks = vec![Vec::new()];
    for (element, split) in elements.into_iter().zip(splits) {
        if split {
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

/// True if the items from `from` on look like `name AS [[NOT] MATERIALIZED] (`.
fn starts_cte(elements: &[Element], from: usize) -> bool {
    let token_at = |i: usize| elements.get(i).and_then(AsToken::as_token);

    let Some(name) = next_significant(elements, from) else {
        return false;
    };
    if !token_at(name).is_some_and(|t| matches!(t.kind(), TokenKind::Word | TokenKind::Literal)) {
        return false;
    }
    let Some(mut next) = next_significant(elements, name + 1) else {
        return false;
    };
    if !token_at(next).is_some_and(|t| t.is_word("as")) {
        return false;
    }
    loop {
        let Some(i) = next_significant(elements, next + 1) else {
            return false;
        };
        next = i;
        let modifier =
            token_at(next).is_some_and(|t| t.is_word("not") || t.is_word("materialized"));
        if !modifier {
            break;
        }
    }
    match &elements[next] {
        Element::Nested(_) => true,
        Element::Token(token) => token.is_open_paren(),
    }
}

/// `WITH` and its comma-separated CTEs. The body of every CTE is laid out
/// on its own lines, indented one step inside its parentheses.
#[derive(Debug, Clone)]
pub struct WithClause {
    delimiters: Vec<Token>,
    ctes: Vec<Cte>,
}

impl WithClause {
    pub fn parse(elements: Vec<Element>, ctx: FormatContext) -> Result<Self> {
        let (start, rest) = take_start(&WITH, elements)?;
        let (others, chunks) = if parens_balanced(&rest) {
            split_elements(&WITH, rest)
        } else {
            tracing::debug!("WITH clause has unbalanced parentheses, splitting CTEs by name");
            split_unbalanced(rest)
        };

        let mut delimiters = Vec::with_capacity(others.len() + 1);
        delimiters.push(start);
        delimiters.extend(others);

        let ctes = chunks
            .into_iter()
            .map(|chunk| Cte::parse(chunk, ctx))
            .collect();
        Ok(Self { delimiters, ctes })
    }

    pub fn delimiters(&self) -> &[Token] {
        &self.delimiters
    }

    pub fn ctes(&self) -> &[Cte] {
        &self.ctes
    }

    pub fn render(&self, out: &mut String, indent: usize) {
        for (i, (delimiter, cte)) in self.delimiters.iter().zip(&self.ctes).enumerate() {
            if i > 0 {
                push_line_break(out, indent);
            }
            let text = delimiter.normalized();
            out.push_str(&text);
            cte.render(out, indent, indent + text_width(&text) + 1);
        }
    }
}
