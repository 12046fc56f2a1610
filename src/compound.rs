use crate::context::FormatContext;
use crate::error::{Result, SqlalignError};
use crate::keywords;
use crate::statement::Statement;
use crate::string_utils::push_line_break;
use crate::token::{Token, TokenKind};

/// Statements joined by set operations (UNION, INTERSECT, EXCEPT, MINUS).
/// This is the root of every parsed tree, and of every subquery.
#[derive(Debug, Clone)]
pub struct CompoundStatement {
    statements: Vec<Statement>,
    set_operations: Vec<Token>,
}

fn is_set_operation(token: &Token) -> bool {
    token.kind() == TokenKind::Word && keywords::is_set_operation(&token.normalized())
}

impl CompoundStatement {
    /// Split `tokens` at top-level set operations and parse each part.
    ///
    /// Leading whitespace of each part is ignored and blank parts produce
    /// no statement, so two adjacent set operations fail the
    /// one-more-statement-than-operations check.
    pub fn parse(tokens: &[Token], ctx: FormatContext) -> Result<Self> {
        let mut statements = Vec::new();
        let mut set_operations = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;

        for (i, token) in tokens.iter().enumerate() {
            if token.is_open_paren() {
                depth += 1;
            } else if token.is_close_paren() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && is_set_operation(token) {
                push_segment(&mut statements, &tokens[start..i], ctx)?;
                set_operations.push(token.clone());
                start = i + 1;
            }
        }
        push_segment(&mut statements, &tokens[start..], ctx)?;

        if statements.len() != set_operations.len() + 1 {
            return Err(SqlalignError::SetOperation {
                statements: statements.len(),
                operations: set_operations.len(),
            });
        }
        Ok(Self {
            statements,
            set_operations,
        })
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn set_operations(&self) -> &[Token] {
        &self.set_operations
    }

    /// Append the compound statement to `out`, which is positioned at column
    /// `indent`. Each set operation sits on its own line.
    pub fn render(&self, out: &mut String, indent: usize) {
        let mut statements = self.statements.iter();
        if let Some(first) = statements.next() {
            first.render(out, indent);
        }
        for (operation, statement) in self.set_operations.iter().zip(statements) {
            push_line_break(out, indent);
            out.push_str(&operation.normalized());
            push_line_break(out, indent);
            statement.render(out, indent);
        }
    }
}

fn push_segment(statements: &mut Vec<Statement>, segment: &[Token], ctx: FormatContext) -> Result<()> {
    let leading = segment.iter().take_while(|t| t.is_blank()).count();
    let segment = &segment[leading..];
    if segment.is_empty() {
        return Ok(());
    }
    statements.push(Statement::parse(segment, ctx)?);
    Ok(())
}
