//! End-to-End CLI Integration Tests
//!
//! Tests the complete Duct runtime through the duct_cli Runtime API.
//! This is the highest level integration test - source file to printed result.

use core_types::SerializeOptions;
use duct_cli::{Cli, CliError, DiagnosticsFormat, Runtime};
use std::fs;
use tempfile::TempDir;

fn runtime() -> Runtime {
    Runtime::new().with_serialize_options(SerializeOptions::compact())
}

fn run_file(dir: &TempDir, name: &str, source: &str) -> Result<Option<String>, CliError> {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    runtime().execute_file(path.to_str().unwrap())
}

/// Test: Simple program
#[test]
fn test_e2e_simple_program() {
    let result = runtime().execute_string("main() { return 42 }").unwrap();
    assert_eq!(result.as_deref(), Some("42"));
}

/// Test: Complex arithmetic
#[test]
fn test_e2e_complex_arithmetic() {
    let result = runtime()
        .execute_string("main() { return (10 + 20) * 2 - 18 }")
        .unwrap();
    assert_eq!(result.as_deref(), Some("42"));
}

/// Test: a config-style script producing structured data
#[test]
fn test_e2e_config_script() {
    let dir = TempDir::new().unwrap();
    let source = r#"
port(base int, offset int): int {
    return base + offset
}

main() {
    base = 8000
    return {
        name = "service",
        ports = [port(base, 1), port(base, 2)],
        debug = false,
        ratio = 0.5
    }
}
"#;
    let result = run_file(&dir, "config.dt", source).unwrap();
    assert_eq!(
        result.as_deref(),
        Some(r#"{ name = "service", ports = [ 8001, 8002 ], debug = false, ratio = 0.500000 }"#)
    );
}

/// Test: top-level statements run before the entry function
#[test]
fn test_e2e_globals_then_main() {
    let dir = TempDir::new().unwrap();
    let source = "limit = 3\nmain(): bool { return limit > 2 }";
    let result = run_file(&dir, "globals.dt", source).unwrap();
    assert_eq!(result.as_deref(), Some("true"));
}

/// Test: a script without functions produces no output
#[test]
fn test_e2e_statements_only() {
    let dir = TempDir::new().unwrap();
    let result = run_file(&dir, "vars.dt", "a = 1\nb = a + 1").unwrap();
    assert_eq!(result, None);
}

/// Test: syntax errors become file diagnostics
#[test]
fn test_e2e_syntax_error_diagnostics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.dt");
    fs::write(&path, "main() {\n  return\n}\nother() { if { } }").unwrap();
    let path = path.to_str().unwrap().to_string();

    let err = runtime().execute_file(&path).unwrap_err();
    let lines = err.report(DiagnosticsFormat::Text);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line.starts_with(&path), "line {}", line);
    }
}

/// Test: a long operator chain runs to completion
#[test]
fn test_e2e_long_expression() {
    let dir = TempDir::new().unwrap();
    let source = format!("main(): int {{ return 0{} }}", " + 2".repeat(5000));
    let result = run_file(&dir, "long.dt", &source).unwrap();
    assert_eq!(result.as_deref(), Some("10000"));
}

/// Test: nesting past the parser limit is a diagnostic, not a crash
#[test]
fn test_e2e_nesting_limit_diagnostic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deep.dt");
    fs::write(&path, format!("x = {}1{}", "(".repeat(300), ")".repeat(300))).unwrap();
    let path = path.to_str().unwrap().to_string();

    let err = runtime().execute_file(&path).unwrap_err();
    let lines = err.report(DiagnosticsFormat::Text);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&format!("{}:1:", path)), "line {}", lines[0]);
    assert!(lines[0].ends_with("error: nested deeper than 256 levels"));
}

/// Test: recursion close to the call depth limit on a default-sized thread
#[test]
fn test_e2e_deep_recursion() {
    let dir = TempDir::new().unwrap();
    let source = "down(n int): int { if n == 0 { return 0 } return down(n - 1) + 1 }\nmain() { return down(250) }";
    let result = run_file(&dir, "deep.dt", source).unwrap();
    assert_eq!(result.as_deref(), Some("250"));
}

/// Test: runtime errors include the stack trace with the file name
#[test]
fn test_e2e_runtime_error_trace() {
    let dir = TempDir::new().unwrap();
    let source = "inner(): int { return undefined_name }\nmain(): int { return inner() }";
    let err = run_file(&dir, "trace.dt", source).unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("ReferenceError: 'undefined_name' is not defined"));
    assert!(message.contains("trace.dt:2:22"));
}

/// Test: Cli flags drive a whole run
#[test]
fn test_e2e_cli_flags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.dt");
    fs::write(&path, "main(): int { if true { return 1 }\n return 0 }").unwrap();

    let cli = Cli {
        analyze: true,
        compact: true,
        ..Cli::with_file(path.to_str().unwrap())
    };
    let mut runtime = Runtime::from_cli(&cli);
    let result = runtime.execute_file(cli.file.as_ref().unwrap()).unwrap();
    assert_eq!(result.as_deref(), Some("0"));
}
