//! Core runtime value types and error handling.
//!
//! This crate provides the foundational types shared by the parser and the
//! evaluator: the runtime object model, arithmetic and comparison on it,
//! the textual serializer, error types, and source location tracking.
//!
//! # Overview
//!
//! - [`Object`] - Runtime object: identifier, tagged [`Value`], [`Properties`]
//! - [`TypeTag`] - Type tags, ordered for coercion
//! - [`binop`], [`compare`], [`resolve_types`] - Operations on objects
//! - [`serialize`] - Textual rendering into a [`BoundedBuffer`]
//! - [`ScriptError`] - Errors with kind, message, and stack trace
//! - [`ErrorCode`] - Codes carried by error objects
//! - [`SourcePosition`] - Source code location
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{binop, BinaryOp, ErrorKind, Object, ScriptError, TypeTag};
//!
//! // Mixed arithmetic coerces toward the higher type tag
//! let sum = binop(Object::int(1), Object::float(1.5), BinaryOp::Add);
//! assert_eq!(sum.tag(), TypeTag::Float);
//!
//! // Create an error
//! let error = ScriptError::new(ErrorKind::TypeError, "'x' is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod ops;
mod serialize;
mod source;
mod value;

pub use error::{ErrorCode, ErrorKind, ScriptError};
pub use ops::{binop, cast, compare, logical_not, negate, resolve_types, BinaryOp, CompareOp};
pub use serialize::{
    serialize, serialize_to_string, BoundedBuffer, SerializeFlags, SerializeOptions,
};
pub use source::{SourcePosition, StackFrame};
pub use value::{
    Array, ArrayStorage, FunctionDescriptor, Object, Properties, TypeDescriptor, TypeTag, Value,
};
