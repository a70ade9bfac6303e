//! Interpreter entry point
//!
//! Owns the evaluation [`Context`] and runs parsed programs against it.

use core_types::{serialize_to_string, ErrorCode, Object, ScriptError, SerializeOptions};
use log::debug;
use parser::Ast;

use crate::context::{Context, EvalMode};
use crate::eval::Evaluator;

/// Tree-walking interpreter for Duct programs
///
/// Each [`Interpreter::run`] starts from a fresh context: functions and
/// globals of a previous run are released first.
///
/// # Example
///
/// ```
/// use core_types::Value;
/// use interpreter::Interpreter;
/// use parser::Parser;
///
/// let ast = Parser::new("add(a int, b int): int { return a + b }\nmain(): int { return add(2, 3) }")
///     .parse()
///     .unwrap();
///
/// let mut interpreter = Interpreter::new();
/// let result = interpreter.run(&ast).unwrap();
/// assert_eq!(result.value, Value::Int(5));
/// ```
#[derive(Debug, Default)]
pub struct Interpreter {
    context: Context,
    source_url: Option<String>,
}

impl Interpreter {
    /// Create an interpreter in [`EvalMode::Execute`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation mode
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.context.mode = mode;
        self
    }

    /// Set the file name reported in stack traces
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Evaluation mode
    pub fn mode(&self) -> EvalMode {
        self.context.mode
    }

    /// Evaluation context of the last run
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Run a program and return its result
    ///
    /// Top-level statements run in the global scope, then the entry
    /// function (`main`, or the first declared function) is called.
    pub fn run(&mut self, ast: &Ast<'_>) -> Result<Object, ScriptError> {
        self.context.reset();
        debug!(
            "running {} ({} nodes, mode {:?})",
            self.source_url.as_deref().unwrap_or("<input>"),
            ast.len(),
            self.context.mode
        );
        Evaluator::new(&mut self.context, ast, self.source_url.as_deref()).eval_root()
    }

    /// Serialize a result of the last run
    ///
    /// Members of composite results live in the context's object arena, so
    /// results must be rendered before the next run.
    pub fn render(&self, object: &Object, options: &SerializeOptions) -> Result<String, ErrorCode> {
        serialize_to_string(object, &self.context.objects, options)
    }
}
