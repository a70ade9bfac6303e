//! Command-line arguments

use clap::{ArgAction, Parser, ValueEnum};
use core_types::SerializeOptions;
use interpreter::EvalMode;

/// How parse diagnostics are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiagnosticsFormat {
    /// `file:row:col error: message`, one per line
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Duct is a small scripting language with typed functions and
/// structured data literals.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "duct", version, about, long_about = None)]
pub struct Cli {
    /// Run a script file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Run inline source
    #[arg(short, long, value_name = "SOURCE", conflicts_with = "file")]
    pub eval: Option<String>,

    /// Start the interactive REPL
    #[arg(short, long)]
    pub repl: bool,

    /// Print the syntax tree before running
    #[arg(long)]
    pub print_ast: bool,

    /// Print the token stream before parsing
    #[arg(long)]
    pub print_tokens: bool,

    /// Evaluate without taking `if` branches
    #[arg(long)]
    pub analyze: bool,

    /// Print the result on a single line
    #[arg(long)]
    pub compact: bool,

    /// Output format for parse diagnostics
    #[arg(long, value_enum, default_value_t = DiagnosticsFormat::Text)]
    pub diagnostics_format: DiagnosticsFormat,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Arguments for running a file with defaults otherwise
    pub fn with_file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Arguments for running inline source with defaults otherwise
    pub fn with_eval(source: impl Into<String>) -> Self {
        Self {
            eval: Some(source.into()),
            ..Self::default()
        }
    }

    /// Evaluation mode selected by `--analyze`
    pub fn mode(&self) -> EvalMode {
        if self.analyze {
            EvalMode::Analyze
        } else {
            EvalMode::Execute
        }
    }

    /// Result formatting selected by `--compact`
    pub fn serialize_options(&self) -> SerializeOptions {
        if self.compact {
            SerializeOptions::compact()
        } else {
            SerializeOptions::default()
        }
    }
}
