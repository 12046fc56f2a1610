use super::{render_delimited, split_elements, take_start, LIMIT_OFFSET};
use crate::context::FormatContext;
use crate::element::Element;
use crate::error::{Result, SqlalignError};
use crate::expression::Expression;
use crate::token::Token;

/// `LIMIT` and `OFFSET`, each at most once, kept in source order.
#[derive(Debug, Clone)]
pub struct LimitOffsetClause {
    limit_first: bool,
    delimiters: Vec<Token>,
    expressions: Vec<Expression>,
}

impl LimitOffsetClause {
    pub fn parse(elements: Vec<Element>, ctx: FormatContext) -> Result<Self> {
        let (start, rest) = take_start(&LIMIT_OFFSET, elements)?;
        let (others, chunks) = split_elements(&LIMIT_OFFSET, rest);

        let mut delimiters = Vec::with_capacity(others.len() + 1);
        delimiters.push(start);
        delimiters.extend(others);

        for (i, keyword) in delimiters.iter().enumerate() {
            if delimiters[..i].contains(keyword) {
                let keyword = keyword.normalized();
                return Err(SqlalignError::Clause {
                    clause: LIMIT_OFFSET.name,
                    message: format!(
                        "repeats {keyword:?}: only one {keyword:?} is allowed in the {} scope",
                        LIMIT_OFFSET.scope
                    ),
                });
            }
        }

        let limit_first = delimiters[0].is_word("limit");
        let expressions = chunks
            .into_iter()
            .map(|chunk| Expression::new(chunk, ctx))
            .collect();
        Ok(Self {
            limit_first,
            delimiters,
            expressions,
        })
    }

    /// True if LIMIT came before OFFSET in the source.
    pub fn limit_first(&self) -> bool {
        self.limit_first
    }

    pub fn limit(&self) -> Option<&Expression> {
        self.find("limit")
    }

    pub fn offset(&self) -> Option<&Expression> {
        self.find("offset")
    }

    fn find(&self, keyword: &str) -> Option<&Expression> {
        self.delimiters
            .iter()
            .position(|d| d.is_word(keyword))
            .and_then(|i| self.expressions.get(i))
    }

    pub fn delimiters(&self) -> &[Token] {
        &self.delimiters
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn render(&self, out: &mut String, indent: usize) {
        render_delimited(&LIMIT_OFFSET, &self.delimiters, &self.expressions, out, indent);
    }
}
