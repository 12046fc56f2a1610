use thiserror::Error;

use crate::clause::ClauseScope;
use crate::token::TokenKind;

/// User-facing errors.
#[derive(Error, Debug)]
pub enum SqlalignError {
    /// A token was built with a value that breaks its kind's invariant.
    /// Only a lexer bug can produce this.
    #[error("sqlalign token error: invalid {kind:?} token {value:?}: {reason}")]
    Token {
        kind: TokenKind,
        value: String,
        reason: &'static str,
    },

    #[error("sqlalign clause error: {clause} clause {message}")]
    Clause {
        clause: &'static str,
        message: String,
    },

    #[error(
        "sqlalign structure error: unexpected {keyword:?} starting a {found} clause after the {current} clause"
    )]
    Ordering {
        keyword: String,
        found: ClauseScope,
        current: ClauseScope,
    },

    #[error(
        "sqlalign structure error: {statements} statement(s) cannot be joined by {operations} set operation(s)"
    )]
    SetOperation { statements: usize, operations: usize },

    #[error("sqlalign structure error: subqueries nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("sqlalign config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SqlalignError>;
