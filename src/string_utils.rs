/// Display width used for column tracking: one column per character.
#[inline]
pub(crate) fn text_width(text: &str) -> usize {
    text.chars().count()
}

/// Column reached after writing `text` starting at column `col`.
pub(crate) fn advance_column(col: usize, text: &str) -> usize {
    match text.rfind('\n') {
        Some(pos) => text_width(&text[pos + 1..]),
        None => col + text_width(text),
    }
}

/// Drop trailing spaces, tabs and carriage returns from `out`.
pub(crate) fn trim_trailing_spaces(out: &mut String) {
    let trimmed = out.trim_end_matches([' ', '\t', '\r']).len();
    out.truncate(trimmed);
}

#[inline]
pub(crate) fn push_spaces(out: &mut String, count: usize) {
    out.extend(std::iter::repeat(' ').take(count));
}

/// Right-justify `text` in a field of `width` columns.
pub(crate) fn right_justify(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width.max(text.len()));
    push_spaces(&mut out, width.saturating_sub(text_width(text)));
    out.push_str(text);
    out
}

/// Start a new line at column `indent`. Trailing spaces on the current line
/// are dropped, and no newline is added when the output already ends with
/// one (for example after a line comment).
pub(crate) fn push_line_break(out: &mut String, indent: usize) {
    trim_trailing_spaces(out);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    push_spaces(out, indent);
}
