//! Parser error types and helpers

use std::fmt;

use core_types::{ErrorKind, ScriptError, SourcePosition};
use serde::Serialize;
use thiserror::Error;

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> ScriptError {
    ScriptError {
        kind: ErrorKind::SyntaxError,
        message: message.into(),
        stack: vec![],
        source_position: position,
    }
}

/// Create an unexpected token error
pub fn unexpected_token(expected: &str, got: &str, position: Option<SourcePosition>) -> ScriptError {
    syntax_error(format!("expected {}, got {}", expected, got), position)
}

/// Create an unexpected end of input error
pub fn unexpected_eof(position: Option<SourcePosition>) -> ScriptError {
    syntax_error("unexpected end of input", position)
}

/// A recorded parse diagnostic
///
/// Displays as `<file>:<row>:<col> error: <message>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Name of the parsed file
    pub file: String,
    /// Line of the offending token
    pub row: u32,
    /// Column of the offending token
    pub column: u32,
    /// Error kind (syntax or lexical)
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic for an error raised while parsing `file`.
    pub fn from_error(file: &str, error: &ScriptError) -> Self {
        let position = error.source_position.unwrap_or_default();
        Self {
            file: file.to_string(),
            row: position.line,
            column: position.column,
            kind: error.kind,
            message: error.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{} error: {}", self.file, self.row, self.column, self.message)
    }
}

/// All diagnostics of a failed parse, in source order
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} error(s) while parsing", diagnostics.len())]
pub struct ParseFailure {
    /// Recorded diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseFailure {
    /// First recorded diagnostic
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    /// True when parsing stopped on a lexical error
    pub fn is_lexical(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::LexicalError)
    }
}
