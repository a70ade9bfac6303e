//! Error types for the CLI

use core_types::{ErrorCode, ScriptError};
use parser::ParseFailure;
use thiserror::Error;

use crate::cli::DiagnosticsFormat;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Script file could not be read
    #[error("could not read '{path}': {source}")]
    IoError {
        /// Path given on the command line
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source text did not parse
    #[error("{0}")]
    ParseError(#[from] ParseFailure),

    /// Tokenizing or evaluation failed
    #[error("{}", .0.report())]
    ScriptError(#[from] ScriptError),

    /// The result could not be rendered
    #[error("could not render result: {0}")]
    SerializeError(#[from] ErrorCode),

    /// REPL error
    #[error("REPL error: {0}")]
    ReplError(String),
}

impl CliError {
    /// Lines to print on stderr for this error
    ///
    /// Parse failures print one line per diagnostic; everything else prints
    /// its message.
    pub fn report(&self, format: DiagnosticsFormat) -> Vec<String> {
        match (self, format) {
            (CliError::ParseError(failure), DiagnosticsFormat::Text) => failure
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect(),
            (CliError::ParseError(failure), DiagnosticsFormat::Json) => failure
                .diagnostics
                .iter()
                .map(|d| serde_json::to_string(d).unwrap_or_else(|_| d.to_string()))
                .collect(),
            _ => vec![self.to_string()],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
