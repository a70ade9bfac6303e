//! REPL (Read-Eval-Print Loop) implementation

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;
use crate::DiagnosticsFormat;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// File name reported for REPL input
const REPL_FILE_NAME: &str = "<repl>";

/// Run the interactive REPL
///
/// Every complete input runs as a fresh program.
///
/// # Arguments
/// * `runtime` - The Runtime instance to use for execution
///
/// # Returns
/// `Ok(())` when REPL exits normally
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::ReplError(format!("Failed to initialize editor: {}", e)))?;

    println!("Duct v{}", env!("CARGO_PKG_VERSION"));
    println!("Type a program, .help for commands or .exit to quit.");
    println!();

    let mut line_buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "... " } else { "> " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline && (trimmed == ".exit" || trimmed == "exit" || trimmed == "quit") {
                    break;
                }

                if !in_multiline && trimmed.starts_with('.') {
                    handle_repl_command(trimmed, runtime);
                    continue;
                }

                if in_multiline {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    in_multiline = true;
                    continue;
                }
                in_multiline = false;

                let _ = editor.add_history_entry(line_buffer.as_str());

                match runtime.execute_named(&line_buffer, REPL_FILE_NAME) {
                    Ok(Some(text)) => println!("{}", text),
                    Ok(None) => {}
                    Err(CliError::ParseError(failure)) if needs_more_input(&failure) => {
                        in_multiline = true;
                        continue;
                    }
                    Err(e) => {
                        for line in e.report(DiagnosticsFormat::Text) {
                            eprintln!("{}", line);
                        }
                    }
                }

                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    println!("^C");
                    line_buffer.clear();
                    in_multiline = false;
                } else {
                    println!("Press Ctrl-D or type .exit to quit");
                }
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                return Err(CliError::ReplError(format!("Readline error: {}", err)));
            }
        }
    }

    Ok(())
}

/// Handle special REPL commands
fn handle_repl_command(command: &str, runtime: &mut Runtime) {
    match command {
        ".help" => {
            println!("REPL Commands:");
            println!("  .help     - Show this help message");
            println!("  .ast      - Toggle printing the syntax tree");
            println!("  .clear    - Clear the screen");
            println!("  .exit     - Exit the REPL");
        }
        ".ast" => {
            let enabled = !runtime.is_print_ast_enabled();
            runtime.set_print_ast(enabled);
            println!("AST printing: {}", if enabled { "on" } else { "off" });
        }
        ".clear" => {
            print!("\x1B[2J\x1B[1;1H");
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
}

/// True when the only problem is that the input stopped early
fn needs_more_input(failure: &parser::ParseFailure) -> bool {
    failure
        .diagnostics
        .iter()
        .all(|d| d.message.contains("unexpected end of input"))
}

/// Check if the input appears to be complete
///
/// Braces, brackets and parentheses must balance outside of strings and
/// comments, and the last string must be closed.
fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_comment = false;
            }
            continue;
        }
        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                in_comment = true;
            }
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string && !in_comment
}
