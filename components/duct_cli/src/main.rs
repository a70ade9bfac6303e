//! Duct CLI
//!
//! Entry point for the `duct` binary. Parses CLI arguments, installs the
//! logger and delegates to the Runtime for execution.

use std::process::ExitCode;

use clap::Parser as ClapParser;
use duct_cli::{logger, Cli, CliResult, Runtime};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init(logger::filter_from_env(cli.verbose)) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let mut runtime = Runtime::from_cli(&cli);

    let outcome: CliResult<Option<String>> = if let Some(file) = &cli.file {
        runtime.execute_file(file)
    } else if let Some(source) = &cli.eval {
        runtime.execute_string(source)
    } else if cli.repl {
        runtime.repl().map(|()| None)
    } else {
        println!("Duct v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage:");
        println!("  duct --file <FILE>     Run a script file");
        println!("  duct --eval <SOURCE>   Run inline source");
        println!("  duct --repl            Start interactive REPL");
        println!();
        println!("Run 'duct --help' for more options.");
        Ok(None)
    };

    match outcome {
        Ok(Some(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            for line in e.report(cli.diagnostics_format) {
                eprintln!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}
