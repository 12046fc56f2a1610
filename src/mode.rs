use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::SqlalignError;

/// How expressions treat the whitespace they were given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FormatMode {
    /// Trim trailing whitespace and at most one leading space.
    #[default]
    Default,
    /// Trim all leading and trailing whitespace.
    TrimLeadingWhitespace,
    /// Additionally collapse whitespace runs and drop spaces around
    /// parentheses, commas and newlines.
    CompactExpressions,
}

impl FormatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::TrimLeadingWhitespace => "trim-leading-whitespace",
            Self::CompactExpressions => "compact-expressions",
        }
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatMode {
    type Err = SqlalignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "default" => Ok(Self::Default),
            "trim-leading-whitespace" | "trim" => Ok(Self::TrimLeadingWhitespace),
            "compact-expressions" | "compact" => Ok(Self::CompactExpressions),
            other => Err(SqlalignError::Config(format!(
                "unknown format mode {other:?}, expected one of: default, \
                 trim-leading-whitespace, compact-expressions"
            ))),
        }
    }
}

impl TryFrom<String> for FormatMode {
    type Error = SqlalignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Mode holds the whole-run configuration for sqlalign.
#[derive(Debug, Clone)]
pub struct Mode {
    pub format_mode: FormatMode,

    /// Deepest subquery nesting accepted before giving up.
    pub max_nesting_depth: usize,

    pub check: bool,

    pub diff: bool,

    /// Glob patterns to exclude.
    pub exclude: Vec<String>,

    pub verbose: bool,

    pub quiet: bool,

    pub no_progressbar: bool,

    pub no_color: bool,

    pub force_color: bool,
}

impl Mode {
    /// A default run configuration with the given format mode.
    pub fn with_format_mode(format_mode: FormatMode) -> Self {
        Self {
            format_mode,
            ..Self::default()
        }
    }

    /// Whether color output is enabled.
    pub fn color(&self) -> bool {
        if self.force_color {
            return true;
        }
        if self.no_color {
            return false;
        }
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        true
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "ddl", "dml"]
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            format_mode: FormatMode::Default,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            check: false,
            diff: false,
            exclude: Vec::new(),
            verbose: false,
            quiet: false,
            no_progressbar: false,
            no_color: false,
            force_color: false,
        }
    }
}
