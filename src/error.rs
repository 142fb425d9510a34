use crate::ast::Span;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of translation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    /// A node kind with no lowering rule
    UnsupportedConstruct,
    /// Source text the parser could not read
    MalformedInput,
    /// A supported node whose shape breaks a lowering precondition
    StructuralAssumptionViolation,
    /// Bad configuration (e.g. an embed template without a slot)
    InvalidOptions,
    /// Broken translator invariant
    Internal,
    /// File collaborator failure
    Io,
}

/// Error during translation. Every failure aborts the whole translation call.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("unsupported construct `{kind}`")]
    Unsupported { kind: String, span: Span },

    #[error("malformed input: {message}")]
    Malformed { message: String, span: Span },

    #[error("{message}")]
    Structural { message: String, span: Span },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranslateError {
    pub fn unsupported(kind: impl Into<String>, span: Span) -> Self {
        TranslateError::Unsupported { kind: kind.into(), span }
    }

    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        TranslateError::Malformed { message: message.into(), span }
    }

    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        TranslateError::Structural { message: message.into(), span }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Unsupported { .. } => ErrorKind::UnsupportedConstruct,
            TranslateError::Malformed { .. } => ErrorKind::MalformedInput,
            TranslateError::Structural { .. } => ErrorKind::StructuralAssumptionViolation,
            TranslateError::InvalidOptions(_) => ErrorKind::InvalidOptions,
            TranslateError::Internal(_) => ErrorKind::Internal,
            TranslateError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Source span of the offending construct, if the error has one
    pub fn span(&self) -> Option<Span> {
        match self {
            TranslateError::Unsupported { span, .. }
            | TranslateError::Malformed { span, .. }
            | TranslateError::Structural { span, .. } => Some(*span),
            _ => None,
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            TranslateError::Unsupported { .. } => {
                Some("this construct is outside the translatable Python subset;\nrewrite it or translate the surrounding code by hand")
            }
            TranslateError::Malformed { .. } => Some("the source must be valid Python before it can be translated"),
            _ => None,
        }
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let Some(span) = self.span() else {
            return format!("{}error:{} {}\n", red, reset, self);
        };

        let mut output = String::new();
        output.push('\n');

        let location = format!("{}:{}:{}", filename, span.start.line + 1, span.start.col + 1);
        output.push_str(&format!(" {}file:{} {}\n", dim, reset, location));

        let message = if color { highlight_inline_code(&self.to_string()) } else { self.to_string() };
        output.push_str(&format!("{}error:{} {}\n", red, reset, message));

        let err_line = span.start.line + 1;
        if let Some(source_line) = source.lines().nth(span.start.line) {
            let width = format!("{}", err_line).len().max(2);
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
            output.push_str(&format!("{}{:>width$} |{} {}\n", dim, err_line, reset, source_line, width = width));

            let underline_start = span.start.col;
            let underline_len = if span.end.line == span.start.line {
                span.end.col.saturating_sub(span.start.col).max(1)
            } else {
                source_line.chars().count().saturating_sub(underline_start).max(1)
            };

            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim,
                "",
                reset,
                " ".repeat(underline_start),
                red,
                "^".repeat(underline_len),
                reset,
                width = width
            ));
        }

        if let Some(help) = self.help() {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

/// Highlight `code` spans in error messages
fn highlight_inline_code(text: &str) -> String {
    const KEYWORD: &str = "\x1b[38;5;173m";
    const RESET: &str = "\x1b[0m";

    let mut result = String::with_capacity(text.len() * 2);
    let mut inside = false;
    for c in text.chars() {
        if c == '`' {
            if inside {
                result.push('`');
                result.push_str(RESET);
            } else {
                result.push_str(KEYWORD);
                result.push('`');
            }
            inside = !inside;
        } else {
            result.push(c);
        }
    }
    if inside {
        result.push_str(RESET);
    }
    result
}
