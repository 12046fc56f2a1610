use super::{render_delimited, split_elements, take_start, SELECT};
use crate::context::FormatContext;
use crate::element::{find_matching_paren, Element};
use crate::error::Result;
use crate::expression::Expression;
use crate::string_utils::{push_line_break, text_width};
use crate::token::Token;

/// Optional word between SELECT and the column list.
#[derive(Debug, Clone)]
pub enum SelectQualifier {
    All,
    Distinct,
    /// `DISTINCT ON (...)`, holding the parenthesized key list.
    DistinctOn(Expression),
}

impl SelectQualifier {
    fn keyword(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Distinct => "distinct",
            Self::DistinctOn(_) => "distinct on",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectClause {
    qualifier: Option<SelectQualifier>,
    delimiters: Vec<Token>,
    expressions: Vec<Expression>,
}

impl SelectClause {
    pub fn parse(elements: Vec<Element>, ctx: FormatContext) -> Result<Self> {
        let (start, rest) = take_start(&SELECT, elements)?;
        let (qualifier, rest) = take_qualifier(rest, ctx);
        let (others, chunks) = split_elements(&SELECT, rest);

        let mut delimiters = Vec::with_capacity(others.len() + 1);
        delimiters.push(start);
        delimiters.extend(others);

        let expressions = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                if i == 0 && qualifier.is_some() {
                    // starts on its own line below the qualifier
                    Expression::stripped(chunk, ctx)
                } else {
                    Expression::new(chunk, ctx)
                }
            })
            .collect();

        Ok(Self {
            qualifier,
            delimiters,
            expressions,
        })
    }

    pub fn qualifier(&self) -> Option<&SelectQualifier> {
        self.qualifier.as_ref()
    }

    pub fn delimiters(&self) -> &[Token] {
        &self.delimiters
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn render(&self, out: &mut String, indent: usize) {
        let Some(qualifier) = &self.qualifier else {
            render_delimited(&SELECT, &self.delimiters, &self.expressions, out, indent);
            return;
        };

        out.push_str("select ");
        out.push_str(qualifier.keyword());
        if let SelectQualifier::DistinctOn(keys) = qualifier {
            out.push(' ');
            let column = indent + text_width("select distinct on ");
            keys.render(out, column);
        }

        let column = indent + SELECT.padding + 1;
        if let Some(first) = self.expressions.first() {
            if !first.is_empty() {
                push_line_break(out, column);
                first.render(out, column);
            }
        }
        let delimiters = self.delimiters.get(1..).unwrap_or_default();
        let expressions = self.expressions.get(1..).unwrap_or_default();
        if !delimiters.is_empty() {
            push_line_break(out, indent);
            render_delimited(&SELECT, delimiters, expressions, out, indent);
        }
    }
}

/// Recognize `ALL`, `DISTINCT` or `DISTINCT ON (...)` right after SELECT,
/// separated only by whitespace. Returns the qualifier and what follows it.
fn take_qualifier(
    elements: Vec<Element>,
    ctx: FormatContext,
) -> (Option<SelectQualifier>, Vec<Element>) {
    let word_at = |i: usize, word: &str| {
        matches!(elements.get(i), Some(Element::Token(t)) if t.is_word(word))
    };
    let skip_ws = |from: usize| {
        (from..elements.len())
            .find(|&i| !elements[i].is_blank())
            .unwrap_or(elements.len())
    };

    let first = skip_ws(0);
    if word_at(first, "all") {
        return (Some(SelectQualifier::All), elements[first + 1..].to_vec());
    }
    if !word_at(first, "distinct") {
        return (None, elements);
    }

    let on = skip_ws(first + 1);
    if word_at(on, "on") {
        let open = skip_ws(on + 1);
        let is_open = matches!(elements.get(open), Some(Element::Token(t)) if t.is_open_paren());
        if is_open {
            if let Some(close) = find_matching_paren(&elements, open) {
                let keys = Expression::stripped(elements[open..=close].to_vec(), ctx);
                return (
                    Some(SelectQualifier::DistinctOn(keys)),
                    elements[close + 1..].to_vec(),
                );
            }
        }
    }
    (Some(SelectQualifier::Distinct), elements[first + 1..].to_vec())
}
