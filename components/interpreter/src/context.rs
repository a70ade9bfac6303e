//! Evaluation context: object arena, memory-class scopes and the call stack

use arrayvec::ArrayVec;
use core_types::{ErrorKind, Object, ScriptError, TypeTag, Value};
use log::warn;
use memory_manager::Arena;

use crate::call_frame::CallFrame;
use crate::scope::Scope;

/// Deepest allowed call nesting
pub const MAX_CALL_DEPTH: usize = 256;

/// Deepest allowed nesting of rvalues and expressions within one call
pub const MAX_EXPRESSION_DEPTH: usize = 1024;

/// Type names known before any program runs
const BUILTIN_TYPES: [(&str, TypeTag); 9] = [
    ("void", TypeTag::Void),
    ("bool", TypeTag::Bool),
    ("byte", TypeTag::Byte),
    ("int", TypeTag::Int),
    ("long", TypeTag::Long),
    ("float", TypeTag::Float),
    ("double", TypeTag::Double),
    ("string", TypeTag::String),
    ("object", TypeTag::Object),
];

/// How statements are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvalMode {
    /// Run everything
    #[default]
    Execute,
    /// Skip `if` statements; everything else still runs
    Analyze,
}

/// Process-wide evaluation state for one program run
#[derive(Debug)]
pub struct Context {
    /// Long-lived objects (members of composite values)
    pub objects: Arena<Object>,
    /// Staging area for call arguments
    pub scratch: Scope,
    /// Type names
    pub types: Scope,
    /// Declared functions; argument descriptors live in its arena
    pub functions: Scope,
    /// Top-level variables
    pub global: Scope,
    call_stack: ArrayVec<CallFrame, MAX_CALL_DEPTH>,
    /// Value of the innermost executed `return`
    pub pending_return: Option<Object>,
    /// Evaluation mode
    pub mode: EvalMode,
}

impl Context {
    /// Create a context with the built-in type names registered
    pub fn new(mode: EvalMode) -> Self {
        let mut context = Self {
            objects: Arena::new(),
            scratch: Scope::new(),
            types: Scope::new(),
            functions: Scope::new(),
            global: Scope::new(),
            call_stack: ArrayVec::new(),
            pending_return: None,
            mode,
        };
        for (name, tag) in BUILTIN_TYPES {
            if let Err(error) = context.types.insert(name, Object::type_descriptor(tag, name)) {
                warn!("type '{}' not registered: {}", name, error);
            }
        }
        context
    }

    /// Type tag registered under `name`
    pub fn resolve_type(&self, name: &str) -> Option<TypeTag> {
        match &self.types.lookup(name)?.value {
            Value::Type(descriptor) => Some(descriptor.tag),
            _ => None,
        }
    }

    /// Number of active calls
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Scope of the innermost call, or the global scope at top level
    pub fn current_scope(&self) -> &Scope {
        self.call_stack
            .last()
            .map(|frame| &frame.scope)
            .unwrap_or(&self.global)
    }

    /// Mutable scope of the innermost call, or the global scope
    pub fn current_scope_mut(&mut self) -> &mut Scope {
        match self.call_stack.last_mut() {
            Some(frame) => &mut frame.scope,
            None => &mut self.global,
        }
    }

    /// Resolve an identifier: current scope first, then global
    pub fn lookup(&self, name: &str) -> Option<&Object> {
        self.current_scope()
            .lookup(name)
            .or_else(|| self.global.lookup(name))
    }

    /// Enter a call
    pub fn push_frame(&mut self, frame: CallFrame) -> Result<(), ScriptError> {
        self.call_stack.try_push(frame).map_err(|_| {
            ScriptError::new(
                ErrorKind::RangeError,
                format!("maximum call depth of {} exceeded", MAX_CALL_DEPTH),
            )
        })
    }

    /// Leave the innermost call, releasing its scope
    pub fn pop_frame(&mut self) -> Option<CallFrame> {
        let mut frame = self.call_stack.pop()?;
        frame.scope.clear();
        Some(frame)
    }

    /// Active calls, outermost first
    pub fn frames(&self) -> impl Iterator<Item = &CallFrame> + '_ {
        self.call_stack.iter()
    }

    /// Release everything a previous run allocated; type names stay
    pub fn reset(&mut self) {
        while self.pop_frame().is_some() {}
        self.objects.reset();
        self.scratch.clear();
        self.functions.clear();
        self.global.clear();
        self.pending_return = None;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(EvalMode::default())
    }
}
