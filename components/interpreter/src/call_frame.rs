//! Call frame for function call stack management

use std::rc::Rc;

use core_types::{SourcePosition, StackFrame};

use crate::scope::Scope;

/// Call frame representing a function invocation
///
/// Owns the transient scope holding the call's arguments and locals.
#[derive(Debug)]
pub struct CallFrame {
    /// Name of the called function
    pub function_name: Rc<str>,
    /// Position of the call expression
    pub call_site: SourcePosition,
    /// Arguments and locals of the call
    pub scope: Scope,
}

impl CallFrame {
    /// Create a new call frame
    pub fn new(function_name: Rc<str>, call_site: SourcePosition, scope: Scope) -> Self {
        Self {
            function_name,
            call_site,
            scope,
        }
    }

    /// Stack trace entry for this frame
    pub fn stack_frame(&self, source_url: Option<&str>) -> StackFrame {
        StackFrame {
            function_name: Some(self.function_name.to_string()),
            source_url: source_url.map(str::to_string),
            line: self.call_site.line,
            column: self.call_site.column,
        }
    }
}
