//! Source position and stack frame types for error tracking.

use std::fmt;

use serde::Serialize;

/// Represents a position in source code.
///
/// Lines and columns are 1-indexed.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition {
///     line: 10,
///     column: 5,
///     offset: 150,
/// };
///
/// assert_eq!(pos.line, 10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 1
    pub column: u32,
    /// Byte offset from the start of the source text
    pub offset: usize,
}

/// Represents a single frame in a script call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("add".to_string()),
///     source_url: Some("main.dt".to_string()),
///     line: 25,
///     column: 10,
/// };
///
/// assert_eq!(frame.to_string(), "add (main.dt:25:10)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    /// Name of the called function, or None at top level
    pub function_name: Option<String>,
    /// File the call site lives in, if known
    pub source_url: Option<String>,
    /// Line number where the call occurred
    pub line: u32,
    /// Column number where the call occurred
    pub column: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<top level>");
        match &self.source_url {
            Some(url) => write!(f, "{} ({}:{}:{})", name, url, self.line, self.column),
            None => write!(f, "{} ({}:{})", name, self.line, self.column),
        }
    }
}
