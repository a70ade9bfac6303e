//! Runtime object representation.
//!
//! An [`Object`] pairs an optional identifier with a tagged [`Value`] and a
//! [`Properties`] bitmask. Nested objects and object arrays refer to their
//! members through [`ArenaId`] handles into the evaluator's object arena.

use std::fmt;
use std::rc::Rc;

use memory_manager::{Arena, ArenaId, ArenaSlice, RawArenaId};

use crate::ErrorCode;

/// Type tag of a runtime value.
///
/// The declaration order is significant: coercion converts the operand with
/// the lower tag to the type of the operand with the higher tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    /// No value
    #[default]
    Null,
    /// Result of a function without a return value
    Void,
    /// Boolean, stored as one byte
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Error object
    Error,
    /// Type descriptor
    Typedef,
    /// Byte string
    String,
    /// Composite object
    Object,
    /// Function descriptor
    Function,
}

impl TypeTag {
    /// Size in bytes of one packed element of this type (0 if not packable).
    pub fn size(&self) -> usize {
        match self {
            TypeTag::Bool | TypeTag::Byte => 1,
            TypeTag::Int | TypeTag::Float => 4,
            TypeTag::Long | TypeTag::Double => 8,
            _ => 0,
        }
    }

    /// bool, byte, int or long.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::Bool | TypeTag::Byte | TypeTag::Int | TypeTag::Long
        )
    }

    /// float or double.
    pub fn is_float(&self) -> bool {
        matches!(self, TypeTag::Float | TypeTag::Double)
    }

    /// Integer or float.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Keyword naming this type in source code.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Void => "void",
            TypeTag::Bool => "bool",
            TypeTag::Byte => "byte",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Error => "error",
            TypeTag::Typedef => "type",
            TypeTag::String => "string",
            TypeTag::Object => "object",
            TypeTag::Function => "function",
        }
    }

    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 13] = [
        TypeTag::Null,
        TypeTag::Void,
        TypeTag::Bool,
        TypeTag::Byte,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::Error,
        TypeTag::Typedef,
        TypeTag::String,
        TypeTag::Object,
        TypeTag::Function,
    ];
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Property bitmask of a runtime value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Properties(pub u8);

impl Properties {
    /// No flags set
    pub const NONE: Properties = Properties(0);
    /// Value may not be reassigned
    pub const CONSTANT: Properties = Properties(1 << 0);
    /// Value may not be mutated
    pub const LOCKED: Properties = Properties(1 << 1);
    /// Integer is unsigned
    pub const UNSIGNED: Properties = Properties(1 << 2);
    /// Value was created at runtime with a dynamic size
    pub const IS_DYNAMIC: Properties = Properties(1 << 5);
    /// Value refers to another object
    pub const IS_REFERENCE: Properties = Properties(1 << 6);
    /// Value is an array (strings included)
    pub const IS_ARRAY: Properties = Properties(1 << 7);

    /// Returns true if every flag of `other` is set.
    pub fn contains(self, other: Properties) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns a copy with the flags of `other` set.
    pub fn with(self, other: Properties) -> Properties {
        Properties(self.0 | other.0)
    }

    /// Returns a copy with the flags of `other` cleared.
    pub fn without(self, other: Properties) -> Properties {
        Properties(self.0 & !other.0)
    }
}

/// Packed storage of an array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStorage {
    /// Little-endian numeric elements, `element.size()` bytes each
    Packed(Vec<u8>),
    /// Handles to objects in the object arena; `None` for unset slots
    Objects(Vec<Option<ArenaId<Object>>>),
}

/// Fixed-length array of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element: TypeTag,
    length: usize,
    storage: ArrayStorage,
}

impl Array {
    /// Element type.
    pub fn element(&self) -> TypeTag {
        self.element
    }

    /// Size of one element in bytes.
    pub fn type_size(&self) -> usize {
        self.element.size()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Underlying storage.
    pub fn storage(&self) -> &ArrayStorage {
        &self.storage
    }
}

/// Function descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    /// Declared name
    pub name: Rc<str>,
    /// Declared return type (`void` when omitted)
    pub return_type: TypeTag,
    /// Properties of the return value
    pub return_properties: Properties,
    /// AST node where execution starts (the body block)
    pub entry: RawArenaId,
    /// Argument type descriptors, in declaration order
    pub arguments: ArenaSlice<Object>,
}

/// Type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Described type
    pub tag: TypeTag,
    /// Name the type was declared under
    pub name: Rc<str>,
}

/// Tagged runtime value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Empty function result
    Void,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    Byte(i8),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Error code returned by an object-model operation
    Error(ErrorCode),
    /// Type descriptor
    Type(TypeDescriptor),
    /// Byte string
    String(Vec<u8>),
    /// Array of numerics or objects
    Array(Array),
    /// Composite object: ordered member handles
    Object(Vec<ArenaId<Object>>),
    /// Function descriptor
    Function(FunctionDescriptor),
}

impl Value {
    /// Type tag. Arrays report their element type.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Void => TypeTag::Void,
            Value::Bool(_) => TypeTag::Bool,
            Value::Byte(_) => TypeTag::Byte,
            Value::Int(_) => TypeTag::Int,
            Value::Long(_) => TypeTag::Long,
            Value::Float(_) => TypeTag::Float,
            Value::Double(_) => TypeTag::Double,
            Value::Error(_) => TypeTag::Error,
            Value::Type(_) => TypeTag::Typedef,
            Value::String(_) => TypeTag::String,
            Value::Array(array) => array.element,
            Value::Object(_) => TypeTag::Object,
            Value::Function(_) => TypeTag::Function,
        }
    }

    /// Integer view of a scalar numeric, floats truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Bool(b) => Some(i64::from(b)),
            Value::Byte(v) => Some(i64::from(v)),
            Value::Int(v) => Some(i64::from(v)),
            Value::Long(v) => Some(v),
            Value::Float(v) => Some(v as i64),
            Value::Double(v) => Some(v as i64),
            _ => None,
        }
    }

    /// Floating-point view of a scalar numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }
}

/// A runtime object: identifier, value and properties.
///
/// # Examples
///
/// ```
/// use core_types::{Object, TypeTag};
///
/// let n = Object::int(42).named("answer");
/// assert_eq!(n.tag(), TypeTag::Int);
/// assert_eq!(n.name(), Some("answer"));
/// assert!(n.is_truthy());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    /// Name the object is bound under, if any
    pub identifier: Option<Rc<str>>,
    /// Tagged payload
    pub value: Value,
    /// Property flags
    pub properties: Properties,
}

impl Object {
    /// Wraps a value with no identifier and no properties.
    pub fn from_value(value: Value) -> Self {
        let properties = match value {
            Value::String(_) | Value::Array(_) => Properties::IS_ARRAY,
            _ => Properties::NONE,
        };
        Object {
            identifier: None,
            value,
            properties,
        }
    }

    /// The null object.
    pub fn null() -> Self {
        Self::default()
    }

    /// The void object.
    pub fn void() -> Self {
        Self::from_value(Value::Void)
    }

    /// Boolean object.
    pub fn bool(v: bool) -> Self {
        Self::from_value(Value::Bool(v))
    }

    /// Byte object.
    pub fn byte(v: i8) -> Self {
        Self::from_value(Value::Byte(v))
    }

    /// Int object.
    pub fn int(v: i32) -> Self {
        Self::from_value(Value::Int(v))
    }

    /// Long object.
    pub fn long(v: i64) -> Self {
        Self::from_value(Value::Long(v))
    }

    /// Float object.
    pub fn float(v: f32) -> Self {
        Self::from_value(Value::Float(v))
    }

    /// Double object.
    pub fn double(v: f64) -> Self {
        Self::from_value(Value::Double(v))
    }

    /// String object holding a copy of `bytes`.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_value(Value::String(bytes.into()))
    }

    /// Error object.
    pub fn error(code: ErrorCode) -> Self {
        Self::from_value(Value::Error(code))
    }

    /// Empty composite object.
    pub fn object(properties: Properties) -> Self {
        Object {
            identifier: None,
            value: Value::Object(Vec::new()),
            properties,
        }
    }

    /// Type descriptor object.
    pub fn type_descriptor(tag: TypeTag, name: impl Into<Rc<str>>) -> Self {
        Self::from_value(Value::Type(TypeDescriptor {
            tag,
            name: name.into(),
        }))
    }

    /// Numeric object of type `tag` holding `raw` cast to that type.
    ///
    /// Returns an error object when `tag` is not numeric.
    pub fn from_numeric(tag: TypeTag, raw: i64) -> Self {
        match tag {
            TypeTag::Bool => Self::bool(raw != 0),
            TypeTag::Byte => Self::byte(raw as i8),
            TypeTag::Int => Self::int(raw as i32),
            TypeTag::Long => Self::long(raw),
            TypeTag::Float => Self::float(raw as f32),
            TypeTag::Double => Self::double(raw as f64),
            _ => Self::error(ErrorCode::UnknownType),
        }
    }

    /// Zero-filled array of `length` elements of type `element`.
    ///
    /// Numeric elements are packed; object elements start unset. Any other
    /// element type yields an error object.
    pub fn array(element: TypeTag, properties: Properties, length: usize) -> Self {
        let storage = if element.is_numeric() {
            ArrayStorage::Packed(vec![0; element.size() * length])
        } else if element == TypeTag::Object {
            ArrayStorage::Objects(vec![None; length])
        } else {
            return Self::error(ErrorCode::UnknownType);
        };
        Object {
            identifier: None,
            value: Value::Array(Array {
                element,
                length,
                storage,
            }),
            properties: properties.with(Properties::IS_ARRAY),
        }
    }

    /// Array of arbitrary objects, each moved into `arena`.
    pub fn array_of(arena: &mut Arena<Object>, items: Vec<Object>) -> Self {
        let slots: Vec<_> = items
            .into_iter()
            .map(|item| Some(arena.alloc(item)))
            .collect();
        Object {
            identifier: None,
            value: Value::Array(Array {
                element: TypeTag::Object,
                length: slots.len(),
                storage: ArrayStorage::Objects(slots),
            }),
            properties: Properties::IS_ARRAY,
        }
    }

    /// Sets the identifier.
    pub fn named(mut self, name: impl Into<Rc<str>>) -> Self {
        self.identifier = Some(name.into());
        self
    }

    /// Identifier, if any.
    pub fn name(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Type tag of the value.
    pub fn tag(&self) -> TypeTag {
        self.value.tag()
    }

    /// Returns true for arrays and strings.
    pub fn is_array(&self) -> bool {
        self.properties.contains(Properties::IS_ARRAY)
    }

    /// Error code if this is an error object.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self.value {
            Value::Error(code) => Some(code),
            _ => None,
        }
    }

    /// Truthiness: numerics are true when non-zero, strings and arrays when
    /// non-empty. Null, void and errors are false; other composites are true.
    pub fn is_truthy(&self) -> bool {
        match &self.value {
            Value::Null | Value::Void | Value::Error(_) => false,
            Value::Bool(b) => *b,
            Value::Float(v) => *v != 0.0,
            Value::Double(v) => *v != 0.0,
            Value::Byte(_) | Value::Int(_) | Value::Long(_) => {
                self.value.as_i64().unwrap_or(0) != 0
            }
            Value::String(bytes) => !bytes.is_empty(),
            Value::Array(array) => !array.is_empty(),
            Value::Type(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Appends `field` as a member of this composite object.
    ///
    /// The field is moved into `arena`; the object records its handle.
    pub fn append(
        &mut self,
        arena: &mut Arena<Object>,
        field: Object,
    ) -> Result<ArenaId<Object>, ErrorCode> {
        match &mut self.value {
            Value::Object(members) => {
                let id = arena.alloc(field);
                members.push(id);
                Ok(id)
            }
            _ => Err(ErrorCode::TypeMismatch),
        }
    }

    /// Finds a member of a composite object by name.
    pub fn member<'a>(&self, arena: &'a Arena<Object>, name: &str) -> Option<&'a Object> {
        match &self.value {
            Value::Object(members) => members
                .iter()
                .filter_map(|id| arena.get(*id))
                .find(|member| member.name() == Some(name)),
            _ => None,
        }
    }

    /// Stores `item` at index `i` of this array.
    ///
    /// Object items are moved into `arena`.
    pub fn array_set(
        &mut self,
        arena: &mut Arena<Object>,
        item: Object,
        i: usize,
    ) -> Result<(), ErrorCode> {
        let item_tag = item.tag();
        let Value::Array(array) = &mut self.value else {
            return Err(ErrorCode::NotArray);
        };
        if array.element != item_tag {
            return Err(ErrorCode::TypeMismatch);
        }
        if i >= array.length {
            return Err(ErrorCode::BufferOverflow);
        }

        match &mut array.storage {
            ArrayStorage::Packed(bytes) => {
                let size = array.element.size();
                let encoded = encode_numeric(&item.value).ok_or(ErrorCode::UnknownType)?;
                bytes[i * size..(i + 1) * size].copy_from_slice(&encoded[..size]);
            }
            ArrayStorage::Objects(slots) => {
                slots[i] = Some(arena.alloc(item));
            }
        }
        Ok(())
    }

    /// Reads the numeric element at index `i`.
    pub fn array_get_numeric(&self, i: usize) -> Result<Value, ErrorCode> {
        let Value::Array(array) = &self.value else {
            return Err(ErrorCode::NotArray);
        };
        if i >= array.length {
            return Err(ErrorCode::BufferOverflow);
        }
        match &array.storage {
            ArrayStorage::Packed(bytes) => {
                let size = array.element.size();
                decode_numeric(array.element, &bytes[i * size..(i + 1) * size])
                    .ok_or(ErrorCode::UnknownType)
            }
            ArrayStorage::Objects(_) => Err(ErrorCode::TypeMismatch),
        }
    }

    /// Reads the object handle at index `i`. Unset slots yield `Ok(None)`.
    pub fn array_get_object(&self, i: usize) -> Result<Option<ArenaId<Object>>, ErrorCode> {
        let Value::Array(array) = &self.value else {
            return Err(ErrorCode::NotArray);
        };
        if i >= array.length {
            return Err(ErrorCode::BufferOverflow);
        }
        match &array.storage {
            ArrayStorage::Objects(slots) => Ok(slots[i]),
            ArrayStorage::Packed(_) => Err(ErrorCode::TypeMismatch),
        }
    }
}

/// Little-endian bytes of a scalar numeric, padded to 8 bytes.
fn encode_numeric(value: &Value) -> Option<[u8; 8]> {
    let mut out = [0u8; 8];
    match *value {
        Value::Bool(b) => out[0] = u8::from(b),
        Value::Byte(v) => out[..1].copy_from_slice(&v.to_le_bytes()),
        Value::Int(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
        Value::Long(v) => out.copy_from_slice(&v.to_le_bytes()),
        Value::Float(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
        Value::Double(v) => out.copy_from_slice(&v.to_le_bytes()),
        _ => return None,
    }
    Some(out)
}

fn decode_numeric(tag: TypeTag, bytes: &[u8]) -> Option<Value> {
    let value = match tag {
        TypeTag::Bool => Value::Bool(*bytes.first()? != 0),
        TypeTag::Byte => Value::Byte(i8::from_le_bytes(bytes.try_into().ok()?)),
        TypeTag::Int => Value::Int(i32::from_le_bytes(bytes.try_into().ok()?)),
        TypeTag::Long => Value::Long(i64::from_le_bytes(bytes.try_into().ok()?)),
        TypeTag::Float => Value::Float(f32::from_le_bytes(bytes.try_into().ok()?)),
        TypeTag::Double => Value::Double(f64::from_le_bytes(bytes.try_into().ok()?)),
        _ => return None,
    };
    Some(value)
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Null => write!(f, "null"),
            Value::Void => write!(f, "void"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.6}", v),
            Value::Double(v) => write!(f, "{:.6}", v),
            Value::Error(code) => write!(f, "<error: {}>", code),
            Value::Type(t) => write!(f, "<type {}>", t.name),
            Value::String(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Array(array) => write!(f, "<{} array[{}]>", array.element, array.length),
            Value::Object(members) => write!(f, "<object with {} members>", members.len()),
            Value::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}
