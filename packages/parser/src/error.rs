//! Error types for the markup parser

use quire_model::ModelError;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parse error with location and context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Invalid syntax at {span}: {message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("Lexer error at {span}: {message}")]
    LexError { span: Span, message: String },

    #[error("Invalid document at {span}: {error}")]
    Model {
        span: Span,
        #[source]
        error: ModelError,
    },
}

impl ParseError {
    pub fn unexpected_token(
        span: impl Into<Span>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span: span.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span: span.into(),
            message: message.into(),
        }
    }

    pub fn lex_error(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Self::LexError {
            span: span.into(),
            message: message.into(),
        }
    }

    pub fn model(span: impl Into<Span>, error: ModelError) -> Self {
        Self::Model {
            span: span.into(),
            error,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexError { span, .. }
            | ParseError::Model { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
        }
    }

    /// Short label shown under the offending source range
    pub fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected } => format!("expected {}", expected),
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::LexError { message, .. } => message.clone(),
            ParseError::Model { error, .. } => error.to_string(),
        }
    }
}

/// Pretty-print errors with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub mod pretty {
    use super::{ParseError, Span};
    use ariadne::{Color, Label, Report, ReportKind, Source};

    pub fn format_error(error: &ParseError, filename: &str, source: &str) -> String {
        format_errors(std::slice::from_ref(error), filename, source)
    }

    pub fn format_errors(errors: &[ParseError], filename: &str, source: &str) -> String {
        let mut output = Vec::new();

        for error in errors {
            let span = error.span().unwrap_or(Span {
                start: source.len().saturating_sub(1),
                end: source.len(),
            });
            // ariadne counts characters, spans count bytes
            let start = char_offset(source, span.start);
            let end = char_offset(source, span.end).max(start);

            let report = Report::build(ReportKind::Error, filename, start)
                .with_message(error.to_string())
                .with_label(
                    Label::new((filename, start..end))
                        .with_color(Color::Red)
                        .with_message(error.label()),
                )
                .finish();

            if report
                .write((filename, Source::from(source)), &mut output)
                .is_err()
            {
                return error.to_string();
            }
        }

        String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
    }

    fn char_offset(source: &str, byte: usize) -> usize {
        let byte = byte.min(source.len());
        source
            .char_indices()
            .take_while(|(i, _)| *i < byte)
            .count()
    }
}
