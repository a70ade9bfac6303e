//! Contract tests for interpreter API
//!
//! These tests pin down the public surface other crates build on.

use core_types::{ErrorKind, SerializeOptions, TypeTag, Value};
use interpreter::{Context, EvalMode, Interpreter, Scope, MAX_CALL_DEPTH, SCOPE_CAPACITY};
use parser::Parser;

/// Interpreter::new() starts in execute mode with an idle context
#[test]
fn test_interpreter_new_contract() {
    let interpreter = Interpreter::new();
    assert_eq!(interpreter.mode(), EvalMode::Execute);
    assert_eq!(interpreter.context().call_depth(), 0);
}

/// with_mode() switches the evaluation mode
#[test]
fn test_interpreter_with_mode_contract() {
    let interpreter = Interpreter::new().with_mode(EvalMode::Analyze);
    assert_eq!(interpreter.mode(), EvalMode::Analyze);
}

/// run() returns the entry function's result
#[test]
fn test_interpreter_run_contract() {
    let ast = Parser::new("main(): long { return 40 + 2 }").parse().unwrap();
    let result = Interpreter::new().run(&ast).unwrap();
    assert_eq!(result.tag(), TypeTag::Long);
    assert_eq!(result.value, Value::Long(42));
    assert!(result.name().is_none());
}

/// run() leaves the call stack empty on success and on error
#[test]
fn test_interpreter_call_stack_unwound_contract() {
    let mut interpreter = Interpreter::new();
    let ok = Parser::new("f(): int { return 1 }\nmain() { return f() }").parse().unwrap();
    interpreter.run(&ok).unwrap();
    assert_eq!(interpreter.context().call_depth(), 0);

    let failing = Parser::new("f(): int { return nope }\nmain() { return f() }")
        .parse()
        .unwrap();
    interpreter.run(&failing).unwrap_err();
    assert_eq!(interpreter.context().call_depth(), 0);
}

/// Globals of a run stay readable through context() until the next run
#[test]
fn test_interpreter_context_contract() {
    let ast = Parser::new("answer = 42").parse().unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.run(&ast).unwrap();

    let answer = interpreter.context().global.lookup("answer").unwrap();
    assert_eq!(answer.value, Value::Int(42));
}

/// Errors are ScriptErrors with a kind and a position
#[test]
fn test_interpreter_error_contract() {
    let ast = Parser::new("main() {\n  return ghost\n}").parse().unwrap();
    let err = Interpreter::new().run(&ast).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
    let position = err.source_position.unwrap();
    assert_eq!((position.line, position.column), (2, 10));
}

/// render() serializes results with the given options
#[test]
fn test_interpreter_render_contract() {
    let ast = Parser::new("main() { return [\"a\", \"b\"] }").parse().unwrap();
    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&ast).unwrap();

    let text = interpreter
        .render(&result, &SerializeOptions::compact())
        .unwrap();
    assert_eq!(text, r#"[ "a", "b" ]"#);
}

/// Scope and Context constants
#[test]
fn test_limits_contract() {
    assert_eq!(SCOPE_CAPACITY, 256);
    assert_eq!(MAX_CALL_DEPTH, 256);
    assert_eq!(Scope::new().capacity(), SCOPE_CAPACITY);
}

/// Context::new() registers types but nothing else
#[test]
fn test_context_new_contract() {
    let ctx = Context::new(EvalMode::Analyze);
    assert!(ctx.global.is_empty());
    assert!(ctx.functions.is_empty());
    assert!(ctx.types.lookup("int").is_some());
    assert_eq!(ctx.mode, EvalMode::Analyze);
    assert!(ctx.pending_return.is_none());
}
