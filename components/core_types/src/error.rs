//! Script error types and object-model error codes.
//!
//! [`ScriptError`] is the error raised by the lexer, the parser and the
//! evaluator. [`ErrorCode`] is the lighter-weight code carried by error
//! objects returned from object-model operations.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{SourcePosition, StackFrame};

/// The kind of script error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Unrecognized character in the source text
    LexicalError,
    /// Grammar violation
    SyntaxError,
    /// Operation applied to an incompatible value (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined identifier
    ReferenceError,
    /// Limit exceeded (call depth, scope capacity)
    RangeError,
    /// Internal engine error (malformed AST, broken invariant)
    InternalError,
}

impl ErrorKind {
    /// Name used when the error is displayed.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::LexicalError => "LexicalError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script error with message and call stack.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ScriptError, SourcePosition};
///
/// let error = ScriptError::new(ErrorKind::ReferenceError, "undefined identifier 'x'")
///     .at(SourcePosition { line: 3, column: 5, offset: 0 });
///
/// assert_eq!(error.to_string(), "ReferenceError: undefined identifier 'x'");
/// assert_eq!(error.source_position.unwrap().line, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Call stack at the time of the error, innermost frame first
    pub stack: Vec<StackFrame>,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl ScriptError {
    /// Creates an error without position or stack information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ScriptError {
            kind,
            message: message.into(),
            stack: Vec::new(),
            source_position: None,
        }
    }

    /// Attaches a source position.
    pub fn at(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }

    /// Appends a call frame to the stack trace.
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.stack.push(frame);
    }

    /// Formats the error and its stack, one frame per line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        if let Some(pos) = &self.source_position {
            out.push_str(&format!(" (at {}:{})", pos.line, pos.column));
        }
        for frame in &self.stack {
            out.push_str("\n    at ");
            out.push_str(&frame.to_string());
        }
        out
    }
}

/// Error codes carried by error objects.
///
/// Object-model operations never panic on bad input; they return an error
/// object holding one of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
pub enum ErrorCode {
    /// Type tag not handled by the operation
    #[error("unknown type")]
    UnknownType,
    /// Operand types differ where they must match
    #[error("type mismatch")]
    TypeMismatch,
    /// Array operation on a non-array value
    #[error("not an array")]
    NotArray,
    /// Index or length past the end of a buffer
    #[error("buffer overflow")]
    BufferOverflow,
    /// No coercion exists between the operand types
    #[error("unresolvable type")]
    UnresolvableType,
    /// Arithmetic on a composite value
    #[error("unresolvable complex type")]
    UnresolvableComplexType,
    /// Operation not supported for the operand types
    #[error("unsupported operation")]
    UnsupportedOperation,
}

impl ErrorCode {
    /// Numeric code, starting at 1 (0 means "no error").
    pub fn code(&self) -> u8 {
        match self {
            ErrorCode::UnknownType => 1,
            ErrorCode::TypeMismatch => 2,
            ErrorCode::NotArray => 3,
            ErrorCode::BufferOverflow => 4,
            ErrorCode::UnresolvableType => 5,
            ErrorCode::UnresolvableComplexType => 6,
            ErrorCode::UnsupportedOperation => 7,
        }
    }
}
