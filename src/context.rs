use crate::error::{Result, SqlalignError};
use crate::mode::{FormatMode, Mode};

/// Rendering context threaded by value through parsing and layout.
///
/// It carries the format mode for one call together with the current
/// subquery nesting depth, so no formatting state is shared between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatContext {
    format_mode: FormatMode,
    depth: usize,
    max_depth: usize,
}

impl FormatContext {
    pub fn new(mode: &Mode) -> Self {
        Self {
            format_mode: mode.format_mode,
            depth: 0,
            max_depth: mode.max_nesting_depth,
        }
    }

    pub fn format_mode(&self) -> FormatMode {
        self.format_mode
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for a subquery one level deeper.
    pub fn nested(self) -> Result<Self> {
        if self.depth >= self.max_depth {
            return Err(SqlalignError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

impl From<FormatMode> for FormatContext {
    fn from(format_mode: FormatMode) -> Self {
        Self::new(&Mode::with_format_mode(format_mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_increments_depth() {
        let ctx = FormatContext::from(FormatMode::CompactExpressions);
        let inner = ctx.nested().unwrap();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(inner.depth(), 1);
        assert_eq!(inner.format_mode(), FormatMode::CompactExpressions);
    }

    #[test]
    fn test_nesting_bound() {
        let mode = Mode {
            max_nesting_depth: 2,
            ..Mode::default()
        };
        let ctx = FormatContext::new(&mode).nested().unwrap().nested().unwrap();
        assert!(matches!(
            ctx.nested(),
            Err(SqlalignError::NestingTooDeep { limit: 2 })
        ));
    }
}
