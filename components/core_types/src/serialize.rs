//! Textual rendering of runtime objects.
//!
//! Produces a JSON-like form: `{ name = value, ... }` for composite objects,
//! `[ e, e ]` for arrays. Output goes into a [`BoundedBuffer`], which
//! silently truncates at its capacity.

use memory_manager::Arena;

use crate::{ArrayStorage, ErrorCode, Object, Value};

/// Serialization flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeFlags(pub u8);

impl SerializeFlags {
    /// Emit `name = ` before object members
    pub const WITH_NAMES: SerializeFlags = SerializeFlags(1 << 0);
    /// One member per line, indented by nesting depth
    pub const PRETTIFY: SerializeFlags = SerializeFlags(1 << 1);
    /// Wrap strings in double quotes
    pub const QUOTE_STRINGS: SerializeFlags = SerializeFlags(1 << 2);

    /// All flags set.
    pub fn all() -> Self {
        SerializeFlags(Self::WITH_NAMES.0 | Self::PRETTIFY.0 | Self::QUOTE_STRINGS.0)
    }

    /// Returns true if every flag of `other` is set.
    pub fn contains(self, other: SerializeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SerializeFlags {
    type Output = SerializeFlags;

    fn bitor(self, rhs: Self) -> Self {
        SerializeFlags(self.0 | rhs.0)
    }
}

/// Serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Formatting flags
    pub flags: SerializeFlags,
    /// Indentation unit used when prettifying
    pub spacing: String,
    /// Capacity of the output buffer, in bytes
    pub capacity: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            flags: SerializeFlags::all(),
            spacing: "  ".to_string(),
            capacity: 4096,
        }
    }
}

impl SerializeOptions {
    /// Single-line output with names and quoted strings.
    pub fn compact() -> Self {
        SerializeOptions {
            flags: SerializeFlags::WITH_NAMES | SerializeFlags::QUOTE_STRINGS,
            ..Self::default()
        }
    }
}

/// Fixed-capacity output buffer.
///
/// Appends past the capacity are dropped; [`BoundedBuffer::truncated`]
/// reports whether that happened.
#[derive(Debug, Clone, Default)]
pub struct BoundedBuffer {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl BoundedBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        BoundedBuffer {
            text: String::new(),
            capacity,
            truncated: false,
        }
    }

    /// Appends as much of `s` as fits. Returns the length of `s`.
    pub fn push_str(&mut self, s: &str) -> usize {
        let room = self.capacity.saturating_sub(self.text.len());
        if s.len() <= room {
            self.text.push_str(s);
        } else {
            let mut end = room;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            self.text.push_str(&s[..end]);
            self.truncated = true;
        }
        s.len()
    }

    /// Contents written so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if any append was cut short.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Empties the buffer, keeping its capacity.
    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Consumes the buffer, returning its contents.
    pub fn into_string(self) -> String {
        self.text
    }
}

/// Serializes `object` into `out`.
///
/// Returns the number of bytes the full rendering takes, which exceeds
/// what `out` holds when it truncated. Function, type and error objects
/// cannot be rendered and fail with [`ErrorCode::UnknownType`].
///
/// # Examples
///
/// ```
/// use core_types::{serialize, BoundedBuffer, Object, Properties, SerializeOptions};
/// use memory_manager::Arena;
///
/// let mut arena = Arena::new();
/// let mut obj = Object::object(Properties::NONE);
/// obj.append(&mut arena, Object::int(1).named("a")).unwrap();
/// obj.append(&mut arena, Object::string("x").named("b")).unwrap();
///
/// let mut out = BoundedBuffer::new(256);
/// serialize(&obj, &arena, &SerializeOptions::compact(), &mut out).unwrap();
/// assert_eq!(out.as_str(), r#"{ a = 1, b = "x" }"#);
/// ```
pub fn serialize(
    object: &Object,
    arena: &Arena<Object>,
    options: &SerializeOptions,
    out: &mut BoundedBuffer,
) -> Result<usize, ErrorCode> {
    Serializer {
        arena,
        options,
        out,
    }
    .write(object, 0)
}

/// Serializes `object` into a fresh buffer sized by `options.capacity`.
pub fn serialize_to_string(
    object: &Object,
    arena: &Arena<Object>,
    options: &SerializeOptions,
) -> Result<String, ErrorCode> {
    let mut out = BoundedBuffer::new(options.capacity);
    serialize(object, arena, options, &mut out)?;
    Ok(out.into_string())
}

struct Serializer<'a> {
    arena: &'a Arena<Object>,
    options: &'a SerializeOptions,
    out: &'a mut BoundedBuffer,
}

impl Serializer<'_> {
    fn flag(&self, flag: SerializeFlags) -> bool {
        self.options.flags.contains(flag)
    }

    fn indent(&mut self, depth: usize) -> usize {
        let mut written = 0;
        for _ in 0..depth {
            written += self.out.push_str(&self.options.spacing);
        }
        written
    }

    fn write(&mut self, object: &Object, depth: usize) -> Result<usize, ErrorCode> {
        match &object.value {
            Value::Null => Ok(self.out.push_str("null")),
            Value::Void => Ok(self.out.push_str("void")),
            Value::Bool(_)
            | Value::Byte(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_) => Ok(self.write_numeric(&object.value)),
            Value::String(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                if self.flag(SerializeFlags::QUOTE_STRINGS) {
                    Ok(self.out.push_str(&format!("\"{}\"", text)))
                } else {
                    Ok(self.out.push_str(&text))
                }
            }
            Value::Array(_) => self.write_array(object, depth),
            Value::Object(members) => self.write_members(members, depth),
            Value::Function(_) | Value::Type(_) | Value::Error(_) => Err(ErrorCode::UnknownType),
        }
    }

    fn write_numeric(&mut self, value: &Value) -> usize {
        let text = match *value {
            Value::Bool(b) => if b { "true" } else { "false" }.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => format!("{:.6}", v),
            Value::Double(v) => format!("{:.6}", v),
            _ => String::new(),
        };
        self.out.push_str(&text)
    }

    fn write_array(&mut self, array: &Object, depth: usize) -> Result<usize, ErrorCode> {
        let Value::Array(inner) = &array.value else {
            return Err(ErrorCode::NotArray);
        };
        if inner.is_empty() {
            return Ok(self.out.push_str("[]"));
        }

        let mut written = self.out.push_str("[ ");
        for i in 0..inner.len() {
            if i > 0 {
                written += self.out.push_str(", ");
            }
            written += match inner.storage() {
                ArrayStorage::Packed(_) => {
                    let element = array.array_get_numeric(i)?;
                    self.write_numeric(&element)
                }
                ArrayStorage::Objects(_) => match array.array_get_object(i)? {
                    Some(id) => {
                        let element = self.arena.get(id).ok_or(ErrorCode::UnknownType)?;
                        self.write(element, depth + 1)?
                    }
                    None => self.out.push_str("{}"),
                },
            };
        }
        written += self.out.push_str(" ]");
        Ok(written)
    }

    fn write_members(
        &mut self,
        members: &[memory_manager::ArenaId<Object>],
        depth: usize,
    ) -> Result<usize, ErrorCode> {
        if members.is_empty() {
            return Ok(self.out.push_str("{}"));
        }
        let pretty = self.flag(SerializeFlags::PRETTIFY);
        let named = self.flag(SerializeFlags::WITH_NAMES);

        let mut written = self.out.push_str("{ ");
        if pretty {
            written += self.out.push_str("\n");
        }

        for (i, id) in members.iter().enumerate() {
            let field = self.arena.get(*id).ok_or(ErrorCode::UnknownType)?;
            if pretty {
                written += self.indent(depth + 1);
            }
            if named {
                let name = field.name().unwrap_or("");
                written += self.out.push_str(&format!("{} = ", name));
            }
            written += self.write(field, depth + 1)?;
            if i + 1 < members.len() {
                written += self.out.push_str(", ");
            }
            if pretty {
                written += self.out.push_str("\n");
            }
        }

        if pretty {
            written += self.indent(depth);
            written += self.out.push_str("}");
        } else {
            written += self.out.push_str(" }");
        }
        Ok(written)
    }
}
