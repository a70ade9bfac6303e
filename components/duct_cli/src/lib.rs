//! Duct CLI Library
//!
//! Provides the Runtime struct and supporting modules for the `duct` binary:
//! argument parsing, file loading, the REPL and logging setup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod logger;
pub mod repl;
pub mod runtime;

pub use cli::{Cli, DiagnosticsFormat};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
