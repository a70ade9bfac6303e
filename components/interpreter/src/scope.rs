//! Scopes: symbol table plus a fixed slot array of runtime objects

use std::rc::Rc;

use core_types::Object;
use memory_manager::{Arena, SymbolTable, TableError};
use thiserror::Error;

/// Slots per scope
pub const SCOPE_CAPACITY: usize = 256;

/// Errors raised by scope insertion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Every slot is taken
    #[error("scope is full ({capacity} symbols)")]
    Full {
        /// Slot count of the scope
        capacity: usize,
    },
    /// Name rejected by the symbol table
    #[error("invalid symbol name '{0}'")]
    InvalidName(String),
}

/// A lexical scope
///
/// Names map to slots through a [`SymbolTable`]; the slot array never grows.
///
/// # Examples
///
/// ```
/// use core_types::{Object, Value};
/// use interpreter::Scope;
///
/// let mut scope = Scope::new();
/// scope.assign("x", Object::int(1)).unwrap();
/// scope.assign("x", Object::int(2)).unwrap();
///
/// assert_eq!(scope.len(), 1);
/// assert_eq!(scope.lookup("x").unwrap().value, Value::Int(2));
/// ```
#[derive(Debug)]
pub struct Scope {
    table: SymbolTable,
    slots: Vec<Option<Object>>,
    temp: Arena<Object>,
}

impl Scope {
    /// Create a scope with [`SCOPE_CAPACITY`] slots
    pub fn new() -> Self {
        Self::with_capacity(SCOPE_CAPACITY)
    }

    /// Create a scope with a given slot count
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: SymbolTable::with_capacity(capacity),
            slots: vec![None; capacity],
            temp: Arena::new(),
        }
    }

    /// Number of bound symbols
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Slot count
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot bound to `name`
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.table.query(name.as_bytes())
    }

    /// Object bound to `name`
    pub fn lookup(&self, name: &str) -> Option<&Object> {
        self.slot_of(name)
            .and_then(|slot| self.slots.get(slot))
            .and_then(Option::as_ref)
    }

    /// Mutable object bound to `name`
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Object> {
        let slot = self.slot_of(name)?;
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Bind `object` under `name` in a fresh slot
    ///
    /// Does not check for an existing binding; see [`Scope::assign`].
    pub fn insert(&mut self, name: &str, object: Object) -> Result<usize, ScopeError> {
        let slot = self.table.reserve(name.as_bytes()).map_err(|e| match e {
            TableError::Full { capacity } => ScopeError::Full { capacity },
            TableError::InvalidKey(_) => ScopeError::InvalidName(name.to_string()),
        })?;
        self.slots[slot] = Some(object.named(Rc::<str>::from(name)));
        Ok(slot)
    }

    /// Overwrite the binding of `name`, or insert it when absent
    pub fn assign(&mut self, name: &str, object: Object) -> Result<usize, ScopeError> {
        match self.slot_of(name) {
            Some(slot) => {
                self.slots[slot] = Some(object.named(Rc::<str>::from(name)));
                Ok(slot)
            }
            None => self.insert(name, object),
        }
    }

    /// Bound objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Object> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Arena for allocations owned by this scope
    pub fn temp(&self) -> &Arena<Object> {
        &self.temp
    }

    /// Mutable arena for allocations owned by this scope
    pub fn temp_mut(&mut self) -> &mut Arena<Object> {
        &mut self.temp
    }

    /// Release every binding and the scope's arena
    pub fn clear(&mut self) {
        self.table.clear();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.temp.reset();
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
