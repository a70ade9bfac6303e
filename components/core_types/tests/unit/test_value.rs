//! Unit tests for the runtime object model

use core_types::{
    binop, compare, resolve_types, BinaryOp, CompareOp, ErrorCode, Object, Properties, TypeTag,
    Value,
};
use memory_manager::Arena;

#[cfg(test)]
mod object_tests {
    use super::*;

    #[test]
    fn test_scalar_constructors() {
        assert_eq!(Object::int(3).tag(), TypeTag::Int);
        assert_eq!(Object::long(3).tag(), TypeTag::Long);
        assert_eq!(Object::double(3.0).tag(), TypeTag::Double);
        assert_eq!(Object::void().tag(), TypeTag::Void);
        assert_eq!(Object::null().tag(), TypeTag::Null);
    }

    #[test]
    fn test_arrays_report_element_type() {
        let a = Object::array(TypeTag::Float, Properties::CONSTANT, 4);
        assert_eq!(a.tag(), TypeTag::Float);
        assert!(a.is_array());
        assert!(a.properties.contains(Properties::CONSTANT));
        match &a.value {
            Value::Array(inner) => {
                assert_eq!(inner.len(), 4);
                assert_eq!(inner.type_size(), 4);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_array_of_unsupported_type() {
        let a = Object::array(TypeTag::Function, Properties::NONE, 1);
        assert_eq!(a.error_code(), Some(ErrorCode::UnknownType));
    }

    #[test]
    fn test_nested_objects_live_in_arena() {
        let mut arena = Arena::new();
        let mut outer = Object::object(Properties::NONE);
        let mut inner = Object::object(Properties::NONE).named("inner");
        inner.append(&mut arena, Object::int(1).named("x")).unwrap();
        let id = outer.append(&mut arena, inner).unwrap();

        let stored = arena.get(id).unwrap();
        assert_eq!(stored.name(), Some("inner"));
        assert_eq!(stored.member(&arena, "x").map(|o| o.tag()), Some(TypeTag::Int));
    }
}

#[cfg(test)]
mod operation_tests {
    use super::*;

    #[test]
    fn test_int_ops_match_native_width() {
        let pairs = [(10, 3), (-7, 2), (i32::MAX, 2), (0, 5)];
        for (a, b) in pairs {
            assert_eq!(
                binop(Object::int(a), Object::int(b), BinaryOp::Add).value,
                Value::Int(a.wrapping_add(b))
            );
            assert_eq!(
                binop(Object::int(a), Object::int(b), BinaryOp::Sub).value,
                Value::Int(a.wrapping_sub(b))
            );
            assert_eq!(
                binop(Object::int(a), Object::int(b), BinaryOp::Mul).value,
                Value::Int(a.wrapping_mul(b))
            );
            assert_eq!(
                binop(Object::int(a), Object::int(b), BinaryOp::Div).value,
                Value::Int(a / b)
            );
        }
    }

    #[test]
    fn test_coercion_one_plus_one_and_a_half() {
        let result = binop(Object::int(1), Object::float(1.5), BinaryOp::Add);
        assert_eq!(result.tag(), TypeTag::Float);
        assert_eq!(result.value, Value::Float(2.5));
    }

    #[test]
    fn test_long_to_float_goes_through_value() {
        let mut l = Object::long(3);
        let mut r = Object::float(0.5);
        assert_eq!(resolve_types(&mut l, &mut r), Ok(TypeTag::Float));
        assert_eq!(l.value, Value::Float(3.0));
    }

    #[test]
    fn test_equal_primitives() {
        for (l, r) in [
            (Object::byte(1), Object::byte(1)),
            (Object::int(9), Object::int(9)),
            (Object::long(-1), Object::long(-1)),
            (Object::double(0.25), Object::double(0.25)),
            (Object::bool(true), Object::bool(true)),
        ] {
            assert_eq!(compare(l, r, CompareOp::Equal).value, Value::Bool(true));
        }
        assert_eq!(
            compare(Object::int(1), Object::int(2), CompareOp::Equal).value,
            Value::Bool(false)
        );
    }

    #[test]
    fn test_string_vs_number_fails() {
        let result = compare(Object::string("1"), Object::int(1), CompareOp::Equal);
        assert_eq!(result.error_code(), Some(ErrorCode::UnresolvableType));
    }
}
