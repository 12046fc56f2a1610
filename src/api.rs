use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use similar::{ChangeTag, TextDiff};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::collapse::tokenize;
use crate::compound::CompoundStatement;
use crate::context::FormatContext;
use crate::element::parens_balanced;
use crate::error::Result;
use crate::lexer::lex;
use crate::mode::{FormatMode, Mode};
use crate::report::{FileResult, FileStatus, Report};
use crate::token::{Token, TokenKind};

/// Final line added to output whose parentheses do not balance.
pub const UNBALANCED_NOTE: &str = "-- sqlalign: unbalanced parentheses";

/// Format one SQL statement (or set-operation compound) with default
/// settings for everything but the format mode.
pub fn format(sql: &str, format_mode: FormatMode) -> Result<String> {
    format_string(sql, &Mode::with_format_mode(format_mode))
}

/// Format one SQL statement according to the given mode.
/// This is the core API function.
///
/// Blank input formats to the empty string. The result never ends in
/// whitespace. Clause ordering and set-operation mistakes are errors;
/// unbalanced parentheses are not, they only annotate the output.
pub fn format_string(source: &str, mode: &Mode) -> Result<String> {
    let tokens = tokenize(source)?;
    if tokens.iter().all(Token::is_blank) {
        return Ok(String::new());
    }

    let ctx = FormatContext::new(mode);
    let compound = CompoundStatement::parse(&tokens, ctx)?;
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    compound.render(&mut out, 0);
    out.truncate(out.trim_end().len());

    if !parens_balanced(&tokens) {
        let annotated = tokens
            .iter()
            .any(|t| t.kind() == TokenKind::LineComment && t.value().trim_end() == UNBALANCED_NOTE);
        if !annotated {
            tracing::warn!("input has unbalanced parentheses");
            out.push('\n');
            out.push_str(UNBALANCED_NOTE);
        }
    }
    Ok(out)
}

/// One `;`-separated piece of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementChunk {
    /// Source text, without the terminating `;`.
    pub text: String,
    /// Whether the chunk was closed by a `;`.
    pub terminated: bool,
}

/// Split a script on `;` symbols that are outside parentheses, quotes and
/// comments.
pub fn split_statements(text: &str) -> Result<Vec<StatementChunk>> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for token in lex(text)? {
        if token.is_open_paren() {
            depth += 1;
        } else if token.is_close_paren() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is_symbol(';') {
            chunks.push(StatementChunk {
                text: std::mem::take(&mut current),
                terminated: true,
            });
            continue;
        }
        current.push_str(token.value());
    }
    if !current.is_empty() {
        chunks.push(StatementChunk {
            text: current,
            terminated: false,
        });
    }
    Ok(chunks)
}

/// Format a whole script: every statement is formatted on its own,
/// statements are separated by a blank line, and the result ends with a
/// single newline.
pub fn format_script(source: &str, mode: &Mode) -> Result<String> {
    let mut formatted = Vec::new();
    for chunk in split_statements(source)? {
        let mut statement = format_string(&chunk.text, mode)?;
        if statement.is_empty() {
            continue;
        }
        if chunk.terminated {
            if ends_with_line_comment(&statement)? {
                statement.push('\n');
            }
            statement.push(';');
        }
        formatted.push(statement);
    }
    if formatted.is_empty() {
        return Ok(String::new());
    }
    let mut out = formatted.join("\n\n");
    out.push('\n');
    Ok(out)
}

fn ends_with_line_comment(text: &str) -> Result<bool> {
    Ok(lex(text)?
        .iter()
        .rev()
        .find(|t| !t.is_blank())
        .is_some_and(|t| t.kind() == TokenKind::LineComment))
}

/// Run the formatter on a collection of files.
pub fn run(files: &[PathBuf], mode: &Mode) -> Report {
    let matching_paths = get_matching_paths(files, mode);
    let mut report = Report::new();

    let progress = if mode.no_progressbar || mode.quiet || matching_paths.len() <= 1 {
        ProgressBar::hidden()
    } else {
        let style = ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(matching_paths.len() as u64).with_style(style)
    };

    for path in &matching_paths {
        progress.set_message(path.display().to_string());
        let result = format_file(path, mode);
        tracing::debug!(path = %path.display(), status = ?result.status, "formatted file");
        report.add(result);
        progress.inc(1);
    }
    progress.finish_and_clear();

    report
}

/// Format a single file.
fn format_file(path: &Path, mode: &Mode) -> FileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileResult::error(path, format!("Read error: {e}")),
    };

    let formatted = match format_script(&source, mode) {
        Ok(f) => f,
        Err(e) => return FileResult::error(path, e.to_string()),
    };

    if source == formatted {
        return FileResult::new(path, FileStatus::Unchanged);
    }

    if mode.check || mode.diff {
        if mode.diff {
            if let Err(e) = print_diff(path, &source, &formatted, mode.color()) {
                tracing::warn!(error = %e, "could not write diff");
            }
        }
        return FileResult::new(path, FileStatus::Changed);
    }

    match std::fs::write(path, &formatted) {
        Ok(()) => FileResult::new(path, FileStatus::Changed),
        Err(e) => FileResult::error(path, format!("Write error: {e}")),
    }
}

/// Get all SQL file paths that match the given inputs. Arguments that do
/// not exist are tried as glob patterns.
pub fn get_matching_paths(paths: &[PathBuf], mode: &Mode) -> Vec<PathBuf> {
    let extensions = mode.sql_extensions();
    let exclude = build_exclude_set(&mode.exclude);
    let mut result = BTreeSet::new();

    for path in expand_patterns(paths) {
        if path.is_file() {
            if is_sql_file(&path, extensions) && !is_excluded(&path, &exclude) {
                result.insert(path);
            }
        } else if path.is_dir() {
            collect_sql_files(&path, extensions, &exclude, &mut result);
        }
    }

    result.into_iter().collect()
}

fn expand_patterns(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::with_capacity(paths.len());
    for path in paths {
        let text = path.to_string_lossy();
        if path.exists() || !text.contains(['*', '?', '[']) {
            expanded.push(path.clone());
            continue;
        }
        match glob::glob(&text) {
            Ok(entries) => expanded.extend(entries.flatten()),
            Err(e) => tracing::warn!(pattern = %text, error = %e, "invalid path pattern"),
        }
    }
    expanded
}

fn build_exclude_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern = %pattern, error = %e, "ignoring invalid exclude pattern"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn is_excluded(path: &Path, exclude: &GlobSet) -> bool {
    exclude.is_match(path) || path.file_name().is_some_and(|name| exclude.is_match(name))
}

/// Check if a file has a SQL extension.
fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Recursively collect SQL files from a directory.
fn collect_sql_files(dir: &Path, extensions: &[&str], exclude: &GlobSet, result: &mut BTreeSet<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if hidden || is_excluded(&path, exclude) {
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}

/// Print a unified diff between original and formatted content to stderr.
fn print_diff(path: &Path, original: &str, formatted: &str, color: bool) -> std::io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);

    writeln!(stderr, "--- {}", path.display())?;
    writeln!(stderr, "+++ {}", path.display())?;

    let diff = TextDiff::from_lines(original, formatted);
    for change in diff.iter_all_changes() {
        let (sign, color) = match change.tag() {
            ChangeTag::Delete => ("-", Some(Color::Red)),
            ChangeTag::Insert => ("+", Some(Color::Green)),
            ChangeTag::Equal => (" ", None),
        };
        stderr.set_color(ColorSpec::new().set_fg(color))?;
        write!(stderr, "{sign}{change}")?;
        if change.missing_newline() {
            writeln!(stderr)?;
        }
    }
    stderr.reset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_simple_select() {
        let result = format("SELECT 1\n", FormatMode::Default).unwrap();
        assert_eq!(result, "select 1");
    }

    #[test]
    fn test_format_empty_string() {
        assert_eq!(format("", FormatMode::Default).unwrap(), "");
        assert_eq!(format(" \n  \n", FormatMode::Default).unwrap(), "");
    }

    #[test]
    fn test_unbalanced_parens_are_annotated_once() {
        let once = format("select f(a from t", FormatMode::Default).unwrap();
        assert!(once.ends_with("\n-- sqlalign: unbalanced parentheses"));
        let twice = format(&once, FormatMode::Default).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_split_statements() {
        let chunks = split_statements("select ';'; select f(a; b);\nselect 3").unwrap();
        assert_eq!(
            chunks,
            vec![
                StatementChunk {
                    text: "select ';'".to_string(),
                    terminated: true
                },
                StatementChunk {
                    text: " select f(a; b)".to_string(),
                    terminated: true
                },
                StatementChunk {
                    text: "\nselect 3".to_string(),
                    terminated: false
                },
            ]
        );
    }

    #[test]
    fn test_format_script() {
        let mode = Mode::default();
        assert_eq!(
            format_script("select a, b from t; select 1 -- done\n;\n", &mode).unwrap(),
            "select a\n     , b\n  from t;\n\nselect 1 -- done\n;\n"
        );
        assert_eq!(format_script("  ;\n", &mode).unwrap(), "");
    }

    #[test]
    fn test_is_sql_file() {
        let extensions = &["sql", "ddl"];
        assert!(is_sql_file(Path::new("test.sql"), extensions));
        assert!(is_sql_file(Path::new("TEST.SQL"), extensions));
        assert!(!is_sql_file(Path::new("test.py"), extensions));
        assert!(!is_sql_file(Path::new("sql"), extensions));
    }

    #[test]
    fn test_exclude_set_matches_names_and_paths() {
        let exclude = build_exclude_set(&["*.gen.sql".to_string(), "target/**".to_string()]);
        assert!(is_excluded(Path::new("models/a.gen.sql"), &exclude));
        assert!(is_excluded(Path::new("target/x.sql"), &exclude));
        assert!(!is_excluded(Path::new("models/a.sql"), &exclude));
    }
}
