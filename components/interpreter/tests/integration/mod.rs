//! Integration tests for interpreter
//!
//! Tests whole programs through the parser, the evaluator and the object model

use core_types::{ErrorKind, Object, ScriptError, SerializeOptions, TypeTag, Value};
use interpreter::{EvalMode, Interpreter, MAX_CALL_DEPTH, MAX_EXPRESSION_DEPTH};
use parser::{Ast, NodeKind, Parser, Token, TokenKind, TokenValue};

fn run(source: &str) -> Result<Object, ScriptError> {
    let ast = Parser::new(source).parse().unwrap();
    Interpreter::new().run(&ast)
}

fn run_rendered(source: &str) -> String {
    let ast = Parser::new(source).parse().unwrap();
    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&ast).unwrap();
    interpreter
        .render(&result, &SerializeOptions::compact())
        .unwrap()
}

#[test]
fn test_function_round_trip() {
    let source = "add(a int, b int): int { return a + b }\nmain(): int { return add(2, 3) }";
    let result = run(source).unwrap();
    assert_eq!(result.tag(), TypeTag::Int);
    assert_eq!(result.value, Value::Int(5));
}

#[test]
fn test_caller_scope_restored_after_call() {
    let source = "
        clobber(x int): int { x = 100\n y = 7\n return x }
        main() {
            x = 1
            y = clobber(5)
            return { x = x, y = y }
        }";
    assert_eq!(run_rendered(source), "{ x = 1, y = 100 }");
}

#[test]
fn test_variable_reassignment() {
    let result = run("main() { x = 1\n x = 2\n return x }").unwrap();
    assert_eq!(result.value, Value::Int(2));
}

#[test]
fn test_if_chain_first_match() {
    let source = "
        pick(n int): string {
            if n == 1 { return \"one\" } else if n == 2 { return \"two\" } else { return \"many\" }
        }
        main() { return [pick(1), pick(2), pick(9)] }";
    assert_eq!(run_rendered(source), r#"[ "one", "two", "many" ]"#);
}

#[test]
fn test_return_unwinds_nested_blocks() {
    let source = "
        main(): int {
            if true { if 1 < 2 { return 10 } }
            return 20
        }";
    assert_eq!(run(source).unwrap().value, Value::Int(10));
}

#[test]
fn test_recursion() {
    let source = "
        count(n int): int { if n == 0 { return 0 } return 1 + count(n - 1) }
        main(): int { return count(25) }";
    assert_eq!(run(source).unwrap().value, Value::Int(25));
}

#[test]
fn test_recursion_near_depth_limit() {
    let source = "
        count(n int): int { if n == 0 { return 0 } return 1 + count(n - 1) }
        main(): int { return count(250) }";
    assert_eq!(run(source).unwrap().value, Value::Int(250));
}

#[test]
fn test_call_depth_limit_reports_stack() {
    let err = run("forever(): int { return forever() }\nmain() { return forever() }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(err.message, format!("maximum call depth of {} exceeded", MAX_CALL_DEPTH));
    assert_eq!(err.stack.len(), MAX_CALL_DEPTH);
    assert_eq!(err.stack[0].function_name.as_deref(), Some("forever"));
    assert!(err.report().contains("at forever (1:25)"));
}

#[test]
fn test_entry_frame_points_at_declaration() {
    let err = run("helper(): int { return 1 }\n\nmain(): int { return missing }").unwrap_err();
    assert_eq!(err.stack.len(), 1);
    assert_eq!(err.stack[0].to_string(), "main (3:1)");
}

#[test]
fn test_long_operator_chain() {
    let source = format!("main(): int {{ return 0{} }}", " + 1".repeat(4999));
    assert_eq!(run(&source).unwrap().value, Value::Int(4999));
}

#[test]
fn test_long_chain_keeps_right_nesting() {
    let source = format!("main(): int {{ return 100{} }}", " - 1".repeat(3000));
    // 100 - (1 - (1 - ... (1 - 1)))
    assert_eq!(run(&source).unwrap().value, Value::Int(100));
}

#[test]
fn test_expression_depth_limit() {
    let word = Token {
        kind: TokenKind::Word,
        value: TokenValue::Text("x"),
        lexeme: "x",
        row: 1,
        column: 1,
        offset: 0,
    };
    let one = Token {
        kind: TokenKind::IntLiteral,
        value: TokenValue::Int(1),
        lexeme: "1",
        ..word
    };

    let mut ast = Ast::new();
    let variable = ast.add(NodeKind::Variable, word);
    ast.append_child(ast.root(), variable);
    let mut parent = variable;
    for _ in 0..MAX_EXPRESSION_DEPTH + 10 {
        let group = ast.add(NodeKind::Expression, Token::default());
        ast.append_child(parent, group);
        parent = group;
    }
    let literal = ast.add(NodeKind::IntLiteral, one);
    ast.append_child(parent, literal);

    let err = Interpreter::new().run(&ast).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(
        err.message,
        format!("maximum expression depth of {} exceeded", MAX_EXPRESSION_DEPTH)
    );
}

#[test]
fn test_globals_visible_in_functions() {
    let source = "scale = 3\nmain(): int { return scale * 4 }";
    assert_eq!(run(source).unwrap().value, Value::Int(12));
}

#[test]
fn test_arguments_cast_to_declared_type() {
    let source = "half(v double): double { return v / 2 }\nmain() { return half(5) }";
    let result = run(source).unwrap();
    assert_eq!(result.value, Value::Double(2.5));
}

#[test]
fn test_return_value_cast_to_declared_type() {
    let result = run("main(): int { return 7.9 }").unwrap();
    assert_eq!(result.value, Value::Int(7));
}

#[test]
fn test_arity_mismatch() {
    let err = run("f(a int): int { return a }\nmain() { return f(1, 2) }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "'f' expects 1 argument(s), got 2");
}

#[test]
fn test_undefined_function() {
    let err = run("main() { return nope(1) }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
}

#[test]
fn test_unknown_type_name() {
    let err = run("f(a point) { return a }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "unknown type 'point'");
}

#[test]
fn test_duplicate_function() {
    let err = run("f() { return 1 }\nf() { return 2 }").unwrap_err();
    assert!(err.message.contains("already declared"));
}

#[test]
fn test_division_by_zero_is_type_error() {
    let err = run("main() { return 1 / 0 }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "unsupported operation for '/'");
}

#[test]
fn test_object_equality_is_unsupported() {
    let err = run("main() { a = { x = 1 }\n return a == a }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_string_and_number_do_not_mix() {
    let err = run("main() { return \"a\" + 1 }").unwrap_err();
    assert_eq!(err.message, "unresolvable type for '+'");
}

#[test]
fn test_comparisons() {
    let source = "main() { return { 1 < 2, 2 <= 1, 3 > 2, 2 >= 2, 1 != 1, \"a\" < \"b\", !0, -4 } }";
    assert_eq!(
        run_rendered(source),
        "{ $0 = true, $1 = false, $2 = true, $3 = true, $4 = false, $5 = true, $6 = true, $7 = -4 }"
    );
}

#[test]
fn test_numeric_array_packs_to_widest_type() {
    let result = run("main() { return [1, 2.5, 3] }").unwrap();
    assert!(result.is_array());
    assert_eq!(result.tag(), TypeTag::Float);
    assert_eq!(result.array_get_numeric(2), Ok(Value::Float(3.0)));
}

#[test]
fn test_nested_object_fields() {
    let source = "main() { return { name = \"duct\", 42, inner = { ok = true } } }";
    assert_eq!(
        run_rendered(source),
        r#"{ name = "duct", $1 = 42, inner = { ok = true } }"#
    );
}

#[test]
fn test_analyze_mode_skips_if_statements() {
    let source = "main(): int { x = 1\n if true { x = 2 }\n return x }";
    let ast = Parser::new(source).parse().unwrap();
    let mut interpreter = Interpreter::new().with_mode(EvalMode::Analyze);
    assert_eq!(interpreter.run(&ast).unwrap().value, Value::Int(1));
}

#[test]
fn test_error_stack_names_source_file() {
    let source = "inner(): int { return missing }\nmain(): int { return inner() }";
    let ast = Parser::new(source).parse().unwrap();
    let mut interpreter = Interpreter::new().with_source_url("prog.dt");
    let err = interpreter.run(&ast).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
    assert_eq!(err.stack.len(), 2);
    assert_eq!(err.stack[0].to_string(), "inner (prog.dt:2:22)");
}

#[test]
fn test_runs_are_independent() {
    let mut interpreter = Interpreter::new();
    let first = Parser::new("x = 1\nmain() { return x }").parse().unwrap();
    interpreter.run(&first).unwrap();
    let second = Parser::new("main() { return x }").parse().unwrap();
    assert!(interpreter.run(&second).is_err());
}
