use crate::element::Element;
use crate::error::{Result, SqlalignError};
use crate::expression::Expression;

/// Content ahead of the first clause keyword, such as a header comment or
/// a statement shape the parser does not know. Rendered as written.
#[derive(Debug, Clone)]
pub struct JunkClause {
    content: Expression,
}

impl JunkClause {
    pub fn parse(elements: Vec<Element>) -> Result<Self> {
        let content = Expression::verbatim(elements);
        if content.is_empty() {
            return Err(SqlalignError::Clause {
                clause: "INITIAL",
                message: "is empty".to_string(),
            });
        }
        Ok(Self { content })
    }

    pub fn content(&self) -> &Expression {
        &self.content
    }

    pub fn render(&self, out: &mut String, indent: usize) {
        self.content.render(out, indent);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::elements;
    use super::*;

    #[test]
    fn test_junk_is_verbatim_without_trailing_whitespace() {
        let junk = JunkClause::parse(elements("-- Header\n/* Keep   THIS */\n\n")).unwrap();
        let mut out = String::new();
        junk.render(&mut out, 0);
        assert_eq!(out, "-- Header\n/* Keep   THIS */");
    }

    #[test]
    fn test_blank_junk_is_an_error() {
        assert!(JunkClause::parse(elements("  \n")).is_err());
    }
}
