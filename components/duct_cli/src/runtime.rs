//! Runtime orchestration for Duct execution
//!
//! The Runtime struct wires the components together:
//! - Lexer, for `--print-tokens`
//! - Parser, producing the syntax tree and diagnostics
//! - Interpreter, evaluating the tree and rendering the result

use core_types::{SerializeOptions, Value};
use interpreter::{EvalMode, Interpreter};
use log::{debug, info};
use parser::{Lexer, Parser, Token};

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// File name reported for inline source
pub const EVAL_FILE_NAME: &str = "<eval>";

/// Main runtime that runs Duct programs
#[derive(Debug, Clone)]
pub struct Runtime {
    /// Evaluation mode handed to each interpreter
    mode: EvalMode,
    /// Whether to print the syntax tree before running
    print_ast: bool,
    /// Whether to print tokens before parsing
    print_tokens: bool,
    /// How results are rendered
    serialize: SerializeOptions,
}

impl Runtime {
    /// Create a runtime with default settings
    ///
    /// # Example
    /// ```
    /// use duct_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// let result = runtime.execute_string("main(): int { return 6 * 7 }").unwrap();
    /// assert_eq!(result.as_deref(), Some("42"));
    /// ```
    pub fn new() -> Self {
        Self {
            mode: EvalMode::Execute,
            print_ast: false,
            print_tokens: false,
            serialize: SerializeOptions::default(),
        }
    }

    /// Create a runtime configured from command-line arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_mode(cli.mode())
            .with_print_ast(cli.print_ast)
            .with_print_tokens(cli.print_tokens)
            .with_serialize_options(cli.serialize_options())
    }

    /// Set the evaluation mode
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable AST printing
    pub fn with_print_ast(mut self, enabled: bool) -> Self {
        self.print_ast = enabled;
        self
    }

    /// Enable token printing
    pub fn with_print_tokens(mut self, enabled: bool) -> Self {
        self.print_tokens = enabled;
        self
    }

    /// Set how results are rendered
    pub fn with_serialize_options(mut self, options: SerializeOptions) -> Self {
        self.serialize = options;
        self
    }

    /// Execute a script file
    ///
    /// Diagnostics and stack traces name the file by `path`.
    ///
    /// # Example
    /// ```no_run
    /// use duct_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// let result = runtime.execute_file("example.dt").unwrap();
    /// ```
    pub fn execute_file(&mut self, path: &str) -> CliResult<Option<String>> {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::IoError {
            path: path.to_string(),
            source,
        })?;
        info!("loaded {} ({} bytes)", path, source.len());
        self.execute_named(&source, path)
    }

    /// Execute inline source
    ///
    /// Returns the rendered result, or `None` for a void result.
    pub fn execute_string(&mut self, source: &str) -> CliResult<Option<String>> {
        self.execute_named(source, EVAL_FILE_NAME)
    }

    /// Execute source text reported as `file_name`
    pub fn execute_named(&mut self, source: &str, file_name: &str) -> CliResult<Option<String>> {
        if self.print_tokens {
            for token in Lexer::new(source).tokenize()? {
                println!("{}", format_token(&token));
            }
        }

        let ast = Parser::new(source).with_file_name(file_name).parse()?;
        if self.print_ast {
            print!("{}", ast.dump());
        }

        let mut interpreter = Interpreter::new()
            .with_mode(self.mode)
            .with_source_url(file_name);
        let result = interpreter.run(&ast)?;
        debug!("{} finished with a {} result", file_name, result.tag());

        if matches!(result.value, Value::Void) {
            return Ok(None);
        }
        Ok(Some(interpreter.render(&result, &self.serialize)?))
    }

    /// Start the REPL (Read-Eval-Print Loop)
    ///
    /// # Example
    /// ```no_run
    /// use duct_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// runtime.repl().unwrap();
    /// ```
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }

    /// Evaluation mode
    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Check if AST printing is enabled
    pub fn is_print_ast_enabled(&self) -> bool {
        self.print_ast
    }

    /// Enable or disable AST printing
    pub fn set_print_ast(&mut self, enabled: bool) {
        self.print_ast = enabled;
    }

    /// Check if token printing is enabled
    pub fn is_print_tokens_enabled(&self) -> bool {
        self.print_tokens
    }

    /// Result rendering options
    pub fn serialize_options(&self) -> &SerializeOptions {
        &self.serialize
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of `--print-tokens` output
pub fn format_token(token: &Token<'_>) -> String {
    format!("{}:{} {:?} {}", token.row, token.column, token.kind, token)
}
