//! Tree-walking interpreter for Duct
//!
//! This crate evaluates parsed programs with:
//! - Hash-table backed scopes with a fixed number of slots
//! - One scope per memory class (scratch, types, functions, global)
//! - A bounded call stack of per-call scopes
//! - Runtime objects allocated in a context-wide arena
//!
//! # Example
//!
//! ```
//! use core_types::{SerializeOptions, Value};
//! use interpreter::Interpreter;
//! use parser::Parser;
//!
//! let ast = Parser::new("main() { x = 2\n return x * 21 }").parse().unwrap();
//!
//! let mut interpreter = Interpreter::new();
//! let result = interpreter.run(&ast).unwrap();
//! assert_eq!(result.value, Value::Int(42));
//! assert_eq!(interpreter.render(&result, &SerializeOptions::default()).unwrap(), "42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod call_frame;
pub mod context;
mod eval;
pub mod interpreter;
pub mod scope;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use context::{Context, EvalMode, MAX_CALL_DEPTH, MAX_EXPRESSION_DEPTH};
pub use interpreter::Interpreter;
pub use scope::{Scope, ScopeError, SCOPE_CAPACITY};
