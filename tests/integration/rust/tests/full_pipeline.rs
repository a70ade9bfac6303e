//! Full Pipeline Integration Tests
//!
//! Tests the complete flow: Source -> Lexer -> Parser -> AST -> Interpreter -> Object -> Serializer
//! This is the most critical integration test suite.

use core_types::{ErrorKind, Object, SerializeOptions, TypeTag, Value};
use interpreter::{EvalMode, Interpreter};
use parser::Parser;

/// Helper function to run a Duct program and render its result
fn execute(source: &str) -> Result<String, String> {
    let ast = Parser::new(source)
        .parse()
        .map_err(|e| format!("Parse error: {:?}", e.diagnostics))?;
    let mut interpreter = Interpreter::new();
    let result = interpreter
        .run(&ast)
        .map_err(|e| format!("Execution error: {}", e.report()))?;
    interpreter
        .render(&result, &SerializeOptions::compact())
        .map_err(|e| format!("Serialize error: {}", e))
}

fn execute_object(source: &str) -> Object {
    let ast = Parser::new(source).parse().expect("parse failed");
    Interpreter::new().run(&ast).expect("execution failed")
}

/// Test: integer arithmetic keeps the int type
#[test]
fn test_full_pipeline_int_arithmetic() {
    let result = execute_object("main() { return 40 + 2 }");
    assert_eq!(result.tag(), TypeTag::Int);
    assert_eq!(result.value, Value::Int(42));
}

/// Test: mixed arithmetic widens to float
#[test]
fn test_full_pipeline_widening() {
    let result = execute_object("main() { return 1 + 1.5 }");
    assert_eq!(result.tag(), TypeTag::Float);
    assert_eq!(result.value, Value::Float(2.5));
}

/// Test: big literals become longs
#[test]
fn test_full_pipeline_long_literal() {
    let result = execute_object("main() { return 3000000000 + 1 }");
    assert_eq!(result.value, Value::Long(3_000_000_001));
}

/// Test: equality and inequality
#[test]
fn test_full_pipeline_equality() {
    assert_eq!(execute_object("main() { return 2 == 2 }").value, Value::Bool(true));
    assert_eq!(execute_object("main() { return 2 != 2 }").value, Value::Bool(false));
    assert_eq!(execute_object("main() { return 2 == 2.0 }").value, Value::Bool(true));
}

/// Test: reassignment keeps a single scope entry
#[test]
fn test_full_pipeline_scope_mutation() {
    let source = "x = 1\nx = 2\nx = 3";
    let ast = Parser::new(source).parse().unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.run(&ast).unwrap();

    let global = &interpreter.context().global;
    assert_eq!(global.len(), 1);
    assert_eq!(global.lookup("x").unwrap().value, Value::Int(3));
}

/// Test: calls return through the caller with its scope intact
#[test]
fn test_full_pipeline_call_restores_scope() {
    let source = "
        add(a int, b int): int { return a + b }
        main() {
            a = 10
            sum = add(2, 3)
            return { a = a, sum = sum }
        }";
    assert_eq!(execute(source).unwrap(), "{ a = 10, sum = 5 }");
}

/// Test: object serialization
#[test]
fn test_full_pipeline_object_serialization() {
    assert_eq!(
        execute("main() { return { a = 1, b = \"x\" } }").unwrap(),
        r#"{ a = 1, b = "x" }"#
    );
}

/// Test: nested data
#[test]
fn test_full_pipeline_nested_data() {
    let source = "main() { return { list = [1, 2, 3], tags = [\"a\", \"b\"], inner = { ok = true } } }";
    assert_eq!(
        execute(source).unwrap(),
        r#"{ list = [ 1, 2, 3 ], tags = [ "a", "b" ], inner = { ok = true } }"#
    );
}

/// Test: function results feed other calls
#[test]
fn test_full_pipeline_composed_calls() {
    let source = "
        square(n int): int { return n * n }
        sum3(a int, b int, c int): int { return a + b + c }
        main(): int { return sum3(square(1), square(2), square(3)) }";
    assert_eq!(execute(source).unwrap(), "14");
}

/// Test: recursion with conditionals
#[test]
fn test_full_pipeline_factorial() {
    let source = "
        fact(n long): long {
            if n <= 1 { return 1 }
            return n * fact(n - 1)
        }
        main() { return fact(20) }";
    assert_eq!(execute_object(source).value, Value::Long(2_432_902_008_176_640_000));
}

/// Test: else-if chains pick the first true branch
#[test]
fn test_full_pipeline_else_if() {
    let source = "
        grade(score int): string {
            if score >= 90 {
                return \"A\"
            } else if score >= 80 {
                return \"B\"
            } else if score >= 80 {
                return \"unreachable\"
            } else {
                return \"C\"
            }
        }
        main() { return [grade(95), grade(85), grade(10)] }";
    assert_eq!(execute(source).unwrap(), r#"[ "A", "B", "C" ]"#);
}

/// Test: analyze mode walks the program without taking branches
#[test]
fn test_full_pipeline_analyze_mode() {
    let source = "main(): int { n = 1\n if n == 1 { return 99 }\n return n }";
    let ast = Parser::new(source).parse().unwrap();

    let executed = Interpreter::new().run(&ast).unwrap();
    let analyzed = Interpreter::new()
        .with_mode(EvalMode::Analyze)
        .run(&ast)
        .unwrap();
    assert_eq!(executed.value, Value::Int(99));
    assert_eq!(analyzed.value, Value::Int(1));
}

/// Test: errors carry kinds and stack frames
#[test]
fn test_full_pipeline_error_stack() {
    let source = "
        divide(a int, b int): int { return a / b }
        main(): int { return divide(1, 0) }";
    let ast = Parser::new(source).parse().unwrap();
    let err = Interpreter::new()
        .with_source_url("math.dt")
        .run(&ast)
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::TypeError);
    let names: Vec<_> = err
        .stack
        .iter()
        .map(|f| f.function_name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["divide", "main"]);
    assert!(err.report().contains("at divide (math.dt:3:30)"));
}

/// Test: parse errors are reported before evaluation
#[test]
fn test_full_pipeline_parse_error() {
    let err = execute("main() { return 1 + }").unwrap_err();
    assert!(err.starts_with("Parse error"));
}
