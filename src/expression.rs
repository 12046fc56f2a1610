use crate::context::FormatContext;
use crate::element::Element;
use crate::keywords::SPACED_BEFORE_PAREN;
use crate::mode::FormatMode;
use crate::string_utils::{advance_column, push_line_break, push_spaces, trim_trailing_spaces};
use crate::token::{Token, TokenKind};

/// How leading whitespace is handled when an expression is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leading {
    /// Follow the format mode.
    ByMode,
    /// Remove all of it.
    Strip,
    /// Keep it untouched, and skip compaction.
    Verbatim,
}

/// A run of clause content between two delimiters.
///
/// Trailing whitespace is always trimmed. Leading whitespace follows the
/// format mode: `Default` and `CompactExpressions` drop a single leading
/// space, `TrimLeadingWhitespace` drops all of it. `CompactExpressions`
/// also normalizes the whitespace in between.
#[derive(Debug, Clone, Default)]
pub struct Expression {
    elements: Vec<Element>,
}

impl Expression {
    pub fn new(elements: Vec<Element>, ctx: FormatContext) -> Self {
        Self::build(elements, ctx, Leading::ByMode)
    }

    /// Build an expression that starts a fresh line, so any leading
    /// whitespace is meaningless and removed in every mode.
    pub fn stripped(elements: Vec<Element>, ctx: FormatContext) -> Self {
        Self::build(elements, ctx, Leading::Strip)
    }

    /// Keep the elements as given apart from trailing whitespace.
    pub fn verbatim(elements: Vec<Element>) -> Self {
        let mut elements = elements;
        trim_trailing(&mut elements);
        Self { elements }
    }

    fn build(mut elements: Vec<Element>, ctx: FormatContext, leading: Leading) -> Self {
        trim_trailing(&mut elements);
        let mode = ctx.format_mode();
        match (leading, mode) {
            (Leading::Verbatim, _) => {}
            (Leading::Strip, _) | (Leading::ByMode, FormatMode::TrimLeadingWhitespace) => {
                let leading_ws = elements.iter().take_while(|e| e.is_blank()).count();
                elements.drain(..leading_ws);
            }
            (Leading::ByMode, _) => trim_one_leading_space(&mut elements),
        }
        if leading != Leading::Verbatim && mode == FormatMode::CompactExpressions {
            elements = compact(elements);
        }
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// True if any token of the expression has exactly this value.
    pub fn contains_text(&self, text: &str) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, Element::Token(t) if t.value().trim_end() == text))
    }

    /// Append the expression to `out`, which is positioned at `column`.
    ///
    /// Continuation lines are padded up to `column`. Spaces the source put
    /// at the start of a line count toward that padding, and a line that
    /// starts with a comment is left as written.
    pub fn render(&self, out: &mut String, column: usize) {
        let mut col = column;
        let mut line_start = false;

        for element in &self.elements {
            if let Element::Token(token) = element {
                match token.kind() {
                    TokenKind::Newline => {
                        trim_trailing_spaces(out);
                        out.push('\n');
                        col = 0;
                        line_start = true;
                        continue;
                    }
                    _ if token.is_blank() => {
                        out.push_str(token.value());
                        col += token.value().len();
                        continue;
                    }
                    _ => {}
                }
            }

            if line_start {
                if !element.is_comment() && col < column {
                    push_spaces(out, column - col);
                    col = column;
                }
                line_start = false;
            }

            match element {
                Element::Token(token) if token.kind() == TokenKind::LineComment => {
                    out.push_str(token.value().trim_end());
                    if token.value().ends_with('\n') {
                        out.push('\n');
                        col = 0;
                        line_start = true;
                    }
                }
                Element::Token(token) => {
                    let text = token.display_text();
                    out.push_str(&text);
                    col = advance_column(col, &text);
                }
                Element::Nested(statement) => {
                    out.push('(');
                    statement.render(out, col + 1);
                    push_line_break(out, col);
                    out.push(')');
                    col += 1;
                }
            }
        }
    }

    pub fn render_to_string(&self, column: usize) -> String {
        let mut out = String::new();
        self.render(&mut out, column);
        out
    }
}

fn trim_trailing(elements: &mut Vec<Element>) {
    while elements.last().is_some_and(Element::is_blank) {
        elements.pop();
    }
}

fn trim_one_leading_space(elements: &mut Vec<Element>) {
    let Some(Element::Token(first)) = elements.first() else {
        return;
    };
    if first.kind() != TokenKind::Spaces {
        // a leading tab or carriage return counts as the one space
        if first.is_blank() {
            elements.remove(0);
        }
        return;
    }
    match Token::spaces(first.value().len() - 1) {
        Some(shorter) => elements[0] = Element::Token(shorter),
        None => {
            elements.remove(0);
        }
    }
}

/// Collapse every whitespace run to one space, then drop the spaces that
/// sit at the edges, after a line comment, inside parentheses, around
/// commas, or between a function name and its argument list.
fn compact(elements: Vec<Element>) -> Vec<Element> {
    let mut collapsed: Vec<Element> = Vec::with_capacity(elements.len());
    for element in elements {
        if element.is_blank() {
            if !collapsed.last().is_some_and(Element::is_blank) {
                if let Some(space) = Token::spaces(1) {
                    collapsed.push(Element::Token(space));
                }
            }
        } else {
            collapsed.push(element);
        }
    }

    let keep: Vec<bool> = (0..collapsed.len())
        .map(|i| {
            !collapsed[i].is_blank()
                || keeps_space(
                    i.checked_sub(1).map(|j| &collapsed[j]),
                    collapsed.get(i + 1),
                )
        })
        .collect();

    collapsed
        .into_iter()
        .zip(keep)
        .filter_map(|(element, keep)| keep.then_some(element))
        .collect()
}

fn keeps_space(prev: Option<&Element>, next: Option<&Element>) -> bool {
    let (Some(prev), Some(next)) = (prev, next) else {
        return false;
    };
    if prev.is_kind(TokenKind::LineComment) {
        return false;
    }
    let prev_token = match prev {
        Element::Token(token) => Some(token),
        Element::Nested(_) => None,
    };
    let next_token = match next {
        Element::Token(token) => Some(token),
        Element::Nested(_) => None,
    };
    if prev_token.is_some_and(|t| t.is_open_paren() || t.is_symbol(',')) {
        return false;
    }
    if next_token.is_some_and(|t| t.is_close_paren() || t.is_symbol(',')) {
        return false;
    }
    if let (Some(prev), Some(next)) = (prev_token, next_token) {
        if next.is_open_paren()
            && prev.kind() == TokenKind::Word
            && !prev.is_keyphrase()
            && !SPACED_BEFORE_PAREN.contains(prev.normalized().as_ref())
        {
            return false;
        }
    }
    true
}
