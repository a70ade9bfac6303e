//! Arithmetic, comparison and type coercion on runtime objects.
//!
//! Every operation returns an [`Object`]. Failures are reported as error
//! objects ([`Object::error`]) rather than panics, so callers decide how
//! to surface them.

use std::cmp::Ordering;

use num_traits::AsPrimitive;

use crate::{ErrorCode, Object, Properties, TypeTag, Value};

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
}

/// Brings two operands to a common type and returns it.
///
/// Nothing happens when both share type and properties. Otherwise the
/// operand with the lower type tag is cast to the type of the higher one,
/// provided the higher type is numeric. Integer targets go through a 64-bit
/// integer, float targets through the source value.
///
/// # Examples
///
/// ```
/// use core_types::{resolve_types, Object, TypeTag, Value};
///
/// let mut l = Object::int(1);
/// let mut r = Object::float(1.5);
/// assert_eq!(resolve_types(&mut l, &mut r), Ok(TypeTag::Float));
/// assert_eq!(l.value, Value::Float(1.0));
/// ```
pub fn resolve_types(l: &mut Object, r: &mut Object) -> Result<TypeTag, ErrorCode> {
    let (tl, tr) = (l.tag(), r.tag());
    if tl == tr && l.properties == r.properties {
        return Ok(tl);
    }
    if l.is_array() || r.is_array() {
        return if tl == tr && l.is_array() == r.is_array() {
            Ok(tl)
        } else {
            Err(ErrorCode::UnresolvableType)
        };
    }
    if tl == tr {
        return Ok(tl);
    }

    let (higher, lower) = if tl > tr { (tl, r) } else { (tr, l) };
    lower.value = cast_value(&lower.value, higher)?;
    Ok(higher)
}

/// Casts a scalar numeric object to `target`, keeping its identifier.
///
/// Objects already tagged `target` pass through untouched; non-numeric
/// objects cannot be cast.
///
/// # Examples
///
/// ```
/// use core_types::{cast, Object, TypeTag, Value};
///
/// let wide = cast(Object::int(7).named("n"), TypeTag::Double).unwrap();
/// assert_eq!(wide.value, Value::Double(7.0));
/// assert_eq!(wide.name(), Some("n"));
/// ```
pub fn cast(mut object: Object, target: TypeTag) -> Result<Object, ErrorCode> {
    if object.tag() == target {
        return Ok(object);
    }
    if object.is_array() {
        return Err(ErrorCode::UnresolvableType);
    }
    object.value = cast_value(&object.value, target)?;
    Ok(object)
}

fn cast_value(value: &Value, target: TypeTag) -> Result<Value, ErrorCode> {
    if !value.tag().is_numeric() {
        return Err(ErrorCode::UnresolvableType);
    }
    if target.is_integer() {
        let wide = value.as_i64().ok_or(ErrorCode::UnresolvableType)?;
        Ok(match target {
            TypeTag::Bool => Value::Bool(wide != 0),
            TypeTag::Byte => Value::Byte(narrow(wide)),
            TypeTag::Int => Value::Int(narrow(wide)),
            _ => Value::Long(wide),
        })
    } else if target.is_float() {
        let wide = value.as_f64().ok_or(ErrorCode::UnresolvableType)?;
        Ok(match target {
            TypeTag::Float => Value::Float(wide.as_()),
            _ => Value::Double(wide),
        })
    } else {
        Err(ErrorCode::UnresolvableType)
    }
}

fn narrow<T>(wide: i64) -> T
where
    T: Copy + 'static,
    i64: AsPrimitive<T>,
{
    wide.as_()
}

/// Applies an arithmetic operator.
///
/// Integer arithmetic wraps; integer division by zero yields an
/// `UnsupportedOperation` error object. Bool operands compute on bytes.
///
/// # Examples
///
/// ```
/// use core_types::{binop, BinaryOp, Object, Value};
///
/// let sum = binop(Object::int(2), Object::int(3), BinaryOp::Add);
/// assert_eq!(sum.value, Value::Int(5));
/// ```
pub fn binop(mut l: Object, mut r: Object, op: BinaryOp) -> Object {
    if resolve_types(&mut l, &mut r).is_err() {
        return Object::error(ErrorCode::UnresolvableType);
    }
    if l.is_array() || r.is_array() {
        return Object::error(ErrorCode::UnresolvableComplexType);
    }

    let value = match (l.value, r.value) {
        (Value::Bool(a), Value::Bool(b)) => {
            match int_op(u8::from(a) as i8, u8::from(b) as i8, op) {
                Some(v) => Value::Bool(v != 0),
                None => return Object::error(ErrorCode::UnsupportedOperation),
            }
        }
        (Value::Byte(a), Value::Byte(b)) => match int_op(a, b, op) {
            Some(v) => Value::Byte(v),
            None => return Object::error(ErrorCode::UnsupportedOperation),
        },
        (Value::Int(a), Value::Int(b)) => match int_op(a, b, op) {
            Some(v) => Value::Int(v),
            None => return Object::error(ErrorCode::UnsupportedOperation),
        },
        (Value::Long(a), Value::Long(b)) => match int_op(a, b, op) {
            Some(v) => Value::Long(v),
            None => return Object::error(ErrorCode::UnsupportedOperation),
        },
        (Value::Float(a), Value::Float(b)) => Value::Float(float_op(a, b, op)),
        (Value::Double(a), Value::Double(b)) => Value::Double(float_op(a, b, op)),
        _ => return Object::error(ErrorCode::UnresolvableComplexType),
    };
    Object::from_value(value)
}

fn int_op<T>(a: T, b: T, op: BinaryOp) -> Option<T>
where
    T: num_traits::PrimInt + num_traits::WrappingAdd + num_traits::WrappingSub + num_traits::WrappingMul,
{
    match op {
        BinaryOp::Add => Some(a.wrapping_add(&b)),
        BinaryOp::Sub => Some(a.wrapping_sub(&b)),
        BinaryOp::Mul => Some(a.wrapping_mul(&b)),
        BinaryOp::Div => {
            if b.is_zero() {
                None
            } else {
                // MIN / -1 wraps to MIN
                Some(a.checked_div(&b).unwrap_or(a))
            }
        }
    }
}

fn float_op<T: num_traits::Float>(a: T, b: T, op: BinaryOp) -> T {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
    }
}

/// Compares two objects and returns a bool object.
///
/// Numerics compare by value after coercion. Strings and arrays compare
/// their raw bytes; ordering uses lexicographic byte order. Composite
/// objects cannot be compared and yield an `UnsupportedOperation` error.
pub fn compare(mut l: Object, mut r: Object, op: CompareOp) -> Object {
    if resolve_types(&mut l, &mut r).is_err() {
        return Object::error(ErrorCode::UnresolvableType);
    }

    let ordering = match (&l.value, &r.value) {
        (Value::String(a), Value::String(b)) => Some(a.as_slice().cmp(b.as_slice())),
        (Value::Array(a), Value::Array(b)) => {
            if matches!(op, CompareOp::Equal | CompareOp::NotEqual) {
                let equal = a == b;
                return Object::bool(equal == (op == CompareOp::Equal));
            }
            return Object::error(ErrorCode::UnsupportedOperation);
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => {
            return Object::error(ErrorCode::UnsupportedOperation);
        }
        (a, b) if a.tag().is_float() => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (a, b) if a.tag().is_integer() => a.as_i64().zip(b.as_i64()).map(|(x, y)| x.cmp(&y)),
        _ => return Object::error(ErrorCode::UnsupportedOperation),
    };

    let result = match op {
        CompareOp::Equal => ordering == Some(Ordering::Equal),
        CompareOp::NotEqual => ordering != Some(Ordering::Equal),
        CompareOp::Less => ordering == Some(Ordering::Less),
        CompareOp::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Greater => ordering == Some(Ordering::Greater),
        CompareOp::GreaterEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
    };
    Object::bool(result)
}

/// Arithmetic negation of a scalar numeric.
pub fn negate(operand: Object) -> Object {
    let value = match operand.value {
        Value::Bool(b) => Value::Byte((u8::from(b) as i8).wrapping_neg()),
        Value::Byte(v) => Value::Byte(v.wrapping_neg()),
        Value::Int(v) => Value::Int(v.wrapping_neg()),
        Value::Long(v) => Value::Long(v.wrapping_neg()),
        Value::Float(v) => Value::Float(-v),
        Value::Double(v) => Value::Double(-v),
        _ => return Object::error(ErrorCode::UnsupportedOperation),
    };
    Object {
        identifier: None,
        value,
        properties: Properties::NONE,
    }
}

/// Logical not, based on truthiness.
pub fn logical_not(operand: &Object) -> Object {
    if operand.error_code().is_some() {
        return Object::error(ErrorCode::UnsupportedOperation);
    }
    Object::bool(!operand.is_truthy())
}
