//! Unit tests for ScriptError, ErrorKind and ErrorCode

use core_types::{ErrorCode, ErrorKind, ScriptError, SourcePosition, StackFrame};

#[cfg(test)]
mod script_error_tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::LexicalError.to_string(), "LexicalError");
        assert_eq!(ErrorKind::SyntaxError.to_string(), "SyntaxError");
        assert_eq!(ErrorKind::ReferenceError.to_string(), "ReferenceError");
    }

    #[test]
    fn test_error_with_position() {
        let error = ScriptError::new(ErrorKind::SyntaxError, "expected ')'").at(SourcePosition {
            line: 4,
            column: 12,
            offset: 40,
        });
        assert_eq!(error.source_position.map(|p| p.column), Some(12));
        assert_eq!(error.report(), "SyntaxError: expected ')' (at 4:12)");
    }

    #[test]
    fn test_error_clone_and_eq() {
        let mut error = ScriptError::new(ErrorKind::TypeError, "not callable");
        error.push_frame(StackFrame {
            function_name: Some("main".to_string()),
            source_url: None,
            line: 1,
            column: 1,
        });
        let copy = error.clone();
        assert_eq!(copy, error);
        assert_eq!(copy.stack.len(), 1);
    }

    #[test]
    fn test_script_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&ScriptError::new(ErrorKind::InternalError, "bad node"));
    }
}

#[cfg(test)]
mod error_code_tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ErrorCode::UnknownType,
            ErrorCode::TypeMismatch,
            ErrorCode::NotArray,
            ErrorCode::BufferOverflow,
            ErrorCode::UnresolvableType,
            ErrorCode::UnresolvableComplexType,
            ErrorCode::UnsupportedOperation,
        ];
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(code.code() as usize, i + 1);
        }
    }

    #[test]
    fn test_code_messages() {
        assert_eq!(ErrorCode::UnresolvableType.to_string(), "unresolvable type");
        assert_eq!(ErrorCode::BufferOverflow.to_string(), "buffer overflow");
    }
}
