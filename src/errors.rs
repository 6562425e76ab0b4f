//! Diagnostic formatting for the command line
//!
//! Fatal errors render as a header, a file location, a first-person
//! message, a source snippet with carets, and "did you mean" hints when a
//! name failed to resolve. Warnings render as a single line each.

use crate::ast::{SourceMap, Span};
use crate::codegen::Warning;
use crate::driver::FrontendError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::semantic::TranslateError;

/// ANSI color codes for terminal output
#[derive(Debug, Clone, Default)]
pub struct Colors {
    pub enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn code(&self, code: &'static str) -> &'static str {
        if self.enabled {
            code
        } else {
            ""
        }
    }

    pub fn red(&self) -> &'static str {
        self.code("\x1b[31m")
    }

    pub fn cyan(&self) -> &'static str {
        self.code("\x1b[36m")
    }

    pub fn yellow(&self) -> &'static str {
        self.code("\x1b[33m")
    }

    pub fn bold(&self) -> &'static str {
        self.code("\x1b[1m")
    }

    pub fn reset(&self) -> &'static str {
        self.code("\x1b[0m")
    }
}

/// Configuration for error display
#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    pub colors: Colors,
    pub filename: Option<String>,
}

impl ErrorConfig {
    pub fn new(use_color: bool) -> Self {
        Self {
            colors: Colors::new(use_color),
            filename: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// Edit distance, computed one row at a time
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// Up to three candidates within `max_distance`, closest first.
/// Exact matches are never suggested.
pub fn find_similar<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein_distance(name, c), c))
        .filter(|(dist, _)| *dist > 0 && *dist <= max_distance)
        .collect();
    scored.sort();
    scored.dedup();
    scored.into_iter().take(3).map(|(_, c)| c.to_string()).collect()
}

// ============================================================================
// Building blocks
// ============================================================================

/// `-- SYNTAX ERROR ---------...` padded to a fixed width
pub fn format_header(kind: &str, colors: &Colors) -> String {
    let dashes = "-".repeat(56usize.saturating_sub(kind.len()).max(2));
    format!("{}-- {} {}{}", colors.cyan(), kind, dashes, colors.reset())
}

/// `file.lam:3:12`
pub fn format_location(
    filename: Option<&str>,
    span: &Span,
    source_map: &SourceMap,
    colors: &Colors,
) -> String {
    let pos = source_map.position(span.start);
    format!(
        "{}{}:{}{}",
        colors.bold(),
        filename.unwrap_or("<input>"),
        pos,
        colors.reset()
    )
}

/// The first line of the span with a caret underline.
///
/// ```text
/// 2 | define b = c;
///                ^
/// ```
pub fn format_snippet(source_map: &SourceMap, span: &Span, colors: &Colors) -> String {
    let start = source_map.position(span.start);
    let end = source_map.position(span.end);
    let line_text = source_map.line(start.line).unwrap_or("");
    let gutter = start.line.to_string();

    let width = if start.line == end.line {
        end.column.saturating_sub(start.column).max(1)
    } else {
        1
    };
    let padding = " ".repeat(gutter.len() + 3 + start.column - 1);

    format!(
        "{}{} |{} {}\n{}{}{}{}",
        colors.cyan(),
        gutter,
        colors.reset(),
        line_text,
        padding,
        colors.red(),
        "^".repeat(width),
        colors.reset()
    )
}

pub fn format_suggestions(suggestions: &[String], colors: &Colors) -> String {
    let bold: Vec<String> = suggestions
        .iter()
        .map(|s| format!("{}{}{}", colors.bold(), s, colors.reset()))
        .collect();
    match bold.as_slice() {
        [] => String::new(),
        [only] => format!("\n\nDid you mean {}?", only),
        many => format!("\n\nDid you mean one of: {}?", many.join(", ")),
    }
}

// ============================================================================
// Whole diagnostics
// ============================================================================

fn describe(err: &FrontendError) -> (&'static str, String, Vec<String>) {
    match err {
        FrontendError::Parse(ParseError::Lex(lex)) => {
            let msg = match lex {
                LexError::UnexpectedChar(c, _) => {
                    format!("I found a character I do not understand: '{}'", c)
                }
                LexError::UnterminatedComment(_) => {
                    "I found a block comment that is never closed.".to_string()
                }
                LexError::InvalidNumber(text, _) => {
                    format!("I cannot use this as an index: {}", text)
                }
            };
            ("SYNTAX ERROR", msg, Vec::new())
        }
        FrontendError::Parse(ParseError::UnexpectedToken {
            expected, found, ..
        }) => (
            "PARSE ERROR",
            format!(
                "I was expecting {} but found {} instead.",
                expected,
                found.describe()
            ),
            Vec::new(),
        ),
        FrontendError::Parse(ParseError::UnexpectedEof { expected, .. }) => (
            "PARSE ERROR",
            format!(
                "I reached the end of the file but was expecting {}.",
                expected
            ),
            Vec::new(),
        ),
        FrontendError::Parse(ParseError::EmptyProgram { .. }) => (
            "PARSE ERROR",
            "I need at least one `define` or `assume` statement.".to_string(),
            Vec::new(),
        ),
        FrontendError::Translate { error, .. } => match error {
            TranslateError::UnresolvedValue { name, suggestions } => (
                "NAME ERROR",
                format!(
                    "I cannot find a definition, parameter or assumption named `{}`.",
                    name
                ),
                suggestions.clone(),
            ),
            TranslateError::UnknownConstant(name) => (
                "NAME ERROR",
                format!("The host does not provide the constant `{}`.", name),
                Vec::new(),
            ),
            TranslateError::UnknownSpecialFunction(name) => (
                "NAME ERROR",
                format!("`{}` is not a special function.", name),
                Vec::new(),
            ),
            TranslateError::Slot(slot) => (
                "INTERNAL ERROR",
                format!("A recursive function was mishandled: {}.", slot),
                Vec::new(),
            ),
        },
    }
}

pub fn format_error(err: &FrontendError, source_map: &SourceMap, config: &ErrorConfig) -> String {
    let colors = &config.colors;
    let (kind, msg, suggestions) = describe(err);
    let span = err.span();

    let mut out = format_header(kind, colors);
    out.push_str("\n\n");
    if let Some(span) = &span {
        out.push_str(&format_location(
            config.filename.as_deref(),
            span,
            source_map,
            colors,
        ));
        out.push_str("\n\n");
    }
    out.push_str(&msg);
    out.push('\n');
    if let Some(span) = &span {
        out.push('\n');
        out.push_str(&format_snippet(source_map, span, colors));
    }
    out.push_str(&format_suggestions(&suggestions, colors));
    out.push('\n');
    out
}

pub fn format_warning(warning: &Warning, colors: &Colors) -> String {
    format!("{}[WARN]{} {}", colors.yellow(), colors.reset(), warning)
}
