//! Tree-walking evaluation of statements and expressions

use std::rc::Rc;

use core_types::{
    binop, cast, compare, logical_not, negate, BinaryOp, CompareOp, ErrorCode, ErrorKind,
    FunctionDescriptor, Object, Properties, ScriptError, SourcePosition, TypeTag, Value,
};
use log::{debug, trace};
use parser::{Ast, Node, NodeId, NodeKind, NodeProperties, TokenValue};

use crate::call_frame::CallFrame;
use crate::context::{Context, EvalMode, MAX_EXPRESSION_DEPTH};
use crate::scope::{Scope, ScopeError};

/// How a statement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Continue with the next statement
    Normal,
    /// A `return` ran; unwind to the enclosing call
    Return,
}

/// Remaining stack below which evaluation moves to a new segment
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new stack segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Walks one tree against one context
pub(crate) struct Evaluator<'c, 't, 'a> {
    ctx: &'c mut Context,
    ast: &'t Ast<'a>,
    source_url: Option<&'t str>,
    /// Nesting of rvalues and expressions inside the current call
    depth: usize,
}

impl<'c, 't, 'a> Evaluator<'c, 't, 'a> {
    pub(crate) fn new(ctx: &'c mut Context, ast: &'t Ast<'a>, source_url: Option<&'t str>) -> Self {
        Self {
            ctx,
            ast,
            source_url,
            depth: 0,
        }
    }

    /// Run a whole program and return its result
    pub(crate) fn eval_root(&mut self) -> Result<Object, ScriptError> {
        let items = self.children(self.ast.root());

        let mut entry: Option<(Rc<str>, SourcePosition)> = None;
        for &item in items {
            let node = self.node(item)?;
            if node.kind == NodeKind::FunctionDecl {
                let name = self.declare_function(item)?;
                if entry.is_none() || &*name == "main" {
                    entry = Some((name, node.token.position()));
                }
            }
        }
        debug!("registered {} functions", self.ctx.functions.len());

        for &item in items {
            if self.node(item)?.kind != NodeKind::FunctionDecl {
                self.eval_statement(item)?;
            }
        }

        let Some((entry, position)) = entry else {
            return Ok(Object::void());
        };
        let descriptor = self.function(&entry, position)?;
        debug!("entering '{}'", entry);
        self.invoke(&descriptor, Vec::new(), position)
    }

    // ---- declarations ----

    /// Register a function declaration in the functions scope
    fn declare_function(&mut self, id: NodeId<'a>) -> Result<Rc<str>, ScriptError> {
        let node = self.node(id)?;
        let name: Rc<str> = Rc::from(node.token.text());
        let position = node.token.position();
        if self.ctx.functions.lookup(&name).is_some() {
            return Err(ScriptError::new(
                ErrorKind::TypeError,
                format!("function '{}' is already declared", name),
            )
            .at(position));
        }

        let mut arguments = Vec::new();
        if let Some(args) = self.ast.find_child(id, NodeKind::FunctionArgs) {
            for &arg in self.children(args) {
                let arg_node = self.node(arg)?;
                let type_name = self
                    .ast
                    .find_child(arg, NodeKind::Type)
                    .and_then(|t| self.ast.node(t))
                    .map(|t| t.token.text())
                    .ok_or_else(|| self.malformed(arg_node))?;
                let tag = self.type_named(type_name, arg_node.token.position())?;
                arguments.push(Object::type_descriptor(tag, type_name).named(arg_node.token.text()));
            }
        }

        let return_type = match self.ast.find_child(id, NodeKind::Type) {
            Some(ty) => {
                let ty = self.node(ty)?;
                self.type_named(ty.token.text(), ty.token.position())?
            }
            None => TypeTag::Void,
        };

        let arguments = self.ctx.functions.temp_mut().alloc_slice(&arguments);
        let descriptor = FunctionDescriptor {
            name: name.clone(),
            return_type,
            return_properties: Properties::NONE,
            entry: id.erase(),
            arguments,
        };
        self.ctx
            .functions
            .insert(&name, Object::from_value(Value::Function(descriptor)))
            .map_err(|e| scope_error(e, position))?;
        trace!("declared function '{}' returning {}", name, return_type);
        Ok(name)
    }

    /// Type tag for a declared type name
    fn type_named(&self, name: &str, position: SourcePosition) -> Result<TypeTag, ScriptError> {
        self.ctx.resolve_type(name).ok_or_else(|| {
            ScriptError::new(ErrorKind::TypeError, format!("unknown type '{}'", name)).at(position)
        })
    }

    // ---- statements ----

    fn eval_block(&mut self, id: NodeId<'a>) -> Result<Flow, ScriptError> {
        for &statement in self.children(id) {
            let flow = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
                self.eval_statement(statement)
            })?;
            if flow == Flow::Return {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_statement(&mut self, id: NodeId<'a>) -> Result<Flow, ScriptError> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Variable => {
                self.eval_variable(node)?;
                Ok(Flow::Normal)
            }
            NodeKind::FunctionCall => {
                self.eval_call(node)?;
                Ok(Flow::Normal)
            }
            NodeKind::IfStatement => {
                if self.ctx.mode == EvalMode::Analyze {
                    return Ok(Flow::Normal);
                }
                self.eval_if(node)
            }
            NodeKind::Return => {
                let value = self.eval_rvalue(self.child(node, 0)?)?;
                self.ctx.pending_return = Some(value);
                Ok(Flow::Return)
            }
            _ => Err(self.malformed(node)),
        }
    }

    fn eval_variable(&mut self, node: &Node<'a>) -> Result<(), ScriptError> {
        let value = self.eval_rvalue(self.child(node, 0)?)?;
        self.ctx
            .current_scope_mut()
            .assign(node.token.text(), value)
            .map_err(|e| scope_error(e, node.token.position()))?;
        Ok(())
    }

    fn eval_if(&mut self, node: &Node<'a>) -> Result<Flow, ScriptError> {
        for &branch in &node.children {
            let branch = self.node(branch)?;
            match branch.kind {
                NodeKind::If | NodeKind::ElseIf => {
                    let condition = self.eval_expression(self.child(branch, 0)?)?;
                    if condition.is_truthy() {
                        return self.eval_block(self.child(branch, 1)?);
                    }
                }
                NodeKind::Else => return self.eval_block(self.child(branch, 0)?),
                _ => return Err(self.malformed(branch)),
            }
        }
        Ok(Flow::Normal)
    }

    // ---- calls ----

    fn eval_call(&mut self, node: &Node<'a>) -> Result<Object, ScriptError> {
        let call_site = node.token.position();
        let descriptor = self.function(node.token.text(), call_site)?;

        let mut arguments = Vec::new();
        if let Some(args) = node.children.first() {
            for &arg in self.children(*args) {
                arguments.push(self.eval_rvalue(arg)?);
            }
        }
        self.invoke(&descriptor, arguments, call_site)
    }

    /// Function descriptor registered under `name`
    fn function(&self, name: &str, position: SourcePosition) -> Result<FunctionDescriptor, ScriptError> {
        let callee = self.ctx.functions.lookup(name).ok_or_else(|| {
            ScriptError::new(ErrorKind::ReferenceError, format!("'{}' is not defined", name))
                .at(position)
        })?;
        match &callee.value {
            Value::Function(descriptor) => Ok(descriptor.clone()),
            _ => Err(
                ScriptError::new(ErrorKind::TypeError, format!("'{}' is not a function", name))
                    .at(position),
            ),
        }
    }

    /// Call a function with already evaluated arguments
    fn invoke(
        &mut self,
        descriptor: &FunctionDescriptor,
        arguments: Vec<Object>,
        call_site: SourcePosition,
    ) -> Result<Object, ScriptError> {
        let depth = std::mem::take(&mut self.depth);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.invoke_inner(descriptor, arguments, call_site)
        });
        self.depth = depth;
        result
    }

    fn invoke_inner(
        &mut self,
        descriptor: &FunctionDescriptor,
        arguments: Vec<Object>,
        call_site: SourcePosition,
    ) -> Result<Object, ScriptError> {
        let name = &descriptor.name;
        let parameters = self
            .ctx
            .functions
            .temp()
            .slice(descriptor.arguments)
            .map(<[Object]>::to_vec)
            .ok_or_else(|| internal(format!("argument list of '{}' was released", name)))?;
        if parameters.len() != arguments.len() {
            return Err(ScriptError::new(
                ErrorKind::TypeError,
                format!(
                    "'{}' expects {} argument(s), got {}",
                    name,
                    parameters.len(),
                    arguments.len()
                ),
            )
            .at(call_site));
        }

        // Stage under $0..$n, then bind by parameter name.
        self.ctx.scratch.clear();
        for (i, argument) in arguments.into_iter().enumerate() {
            self.ctx
                .scratch
                .insert(&format!("${}", i), argument)
                .map_err(|e| scope_error(e, call_site))?;
        }
        let mut scope = Scope::new();
        for (i, parameter) in parameters.iter().enumerate() {
            let staged = self
                .ctx
                .scratch
                .lookup(&format!("${}", i))
                .cloned()
                .ok_or_else(|| internal(format!("argument {} of '{}' was not staged", i, name)))?;
            let param_name = parameter.name().unwrap_or_default();
            let value = conform(staged, parameter).map_err(|code| {
                ScriptError::new(
                    ErrorKind::TypeError,
                    format!("argument '{}' of '{}': {}", param_name, name, code),
                )
                .at(call_site)
            })?;
            scope
                .insert(param_name, value)
                .map_err(|e| scope_error(e, call_site))?;
        }
        self.ctx.scratch.clear();

        self.ctx
            .push_frame(CallFrame::new(name.clone(), call_site, scope))
            .map_err(|e| e.at(call_site))?;
        trace!("call '{}' at depth {}", name, self.ctx.call_depth());

        let body = self.function_body(descriptor);
        let flow = body.and_then(|body| self.eval_block(body));
        let returned = self.ctx.pending_return.take();
        let frame = self.ctx.pop_frame();

        if let Err(mut error) = flow {
            if let Some(frame) = frame {
                error.push_frame(frame.stack_frame(self.source_url));
            }
            return Err(error);
        }

        let mut result = returned.unwrap_or_else(Object::void);
        result.identifier = None;
        if descriptor.return_type.is_numeric() {
            result = cast(result, descriptor.return_type).map_err(|code| {
                ScriptError::new(
                    ErrorKind::TypeError,
                    format!("return value of '{}': {}", name, code),
                )
                .at(call_site)
            })?;
        }
        Ok(result)
    }

    fn function_body(&self, descriptor: &FunctionDescriptor) -> Result<NodeId<'a>, ScriptError> {
        let decl: NodeId<'a> = descriptor.entry.typed();
        self.ast.find_child(decl, NodeKind::Block).ok_or_else(|| {
            internal(format!("function '{}' has no body", descriptor.name))
        })
    }

    // ---- rvalues ----

    fn eval_rvalue(&mut self, id: NodeId<'a>) -> Result<Object, ScriptError> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Array => self.descend(node, |this| this.eval_array(node)),
            NodeKind::Object => self.descend(node, |this| this.eval_object(node)),
            _ => self.eval_expression(id),
        }
    }

    /// Run `eval` one nesting level deeper, growing the stack when needed
    fn descend(
        &mut self,
        node: &Node<'a>,
        eval: impl FnOnce(&mut Self) -> Result<Object, ScriptError>,
    ) -> Result<Object, ScriptError> {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(ScriptError::new(
                ErrorKind::RangeError,
                format!("maximum expression depth of {} exceeded", MAX_EXPRESSION_DEPTH),
            )
            .at(node.token.position()));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || eval(self));
        self.depth -= 1;
        result
    }

    fn eval_object(&mut self, node: &Node<'a>) -> Result<Object, ScriptError> {
        let mut object = Object::object(Properties::NONE);
        for (index, &field) in node.children.iter().enumerate() {
            let field = self.node(field)?;
            let name: Rc<str> = match field.kind {
                NodeKind::Variable => Rc::from(field.token.text()),
                NodeKind::RValue => Rc::from(format!("${}", index)),
                _ => return Err(self.malformed(field)),
            };
            let value = self.eval_rvalue(self.child(field, 0)?)?.named(name);
            object
                .append(&mut self.ctx.objects, value)
                .map_err(|code| self.object_error(code, field))?;
        }
        Ok(object)
    }

    /// Numeric elements pack into an array of the widest element type;
    /// anything else becomes an array of object handles.
    fn eval_array(&mut self, node: &Node<'a>) -> Result<Object, ScriptError> {
        let mut items = Vec::with_capacity(node.children.len());
        for &element in &node.children {
            items.push(self.eval_rvalue(element)?);
        }

        let packed = !items.is_empty()
            && items
                .iter()
                .all(|item| item.tag().is_numeric() && !item.is_array());
        if !packed {
            return Ok(Object::array_of(&mut self.ctx.objects, items));
        }

        let element = items
            .iter()
            .map(Object::tag)
            .max()
            .unwrap_or(TypeTag::Int);
        let mut array = Object::array(element, Properties::NONE, items.len());
        for (i, item) in items.into_iter().enumerate() {
            let item = cast(item, element).map_err(|code| self.object_error(code, node))?;
            array
                .array_set(&mut self.ctx.objects, item, i)
                .map_err(|code| self.object_error(code, node))?;
        }
        Ok(array)
    }

    // ---- expressions ----

    fn eval_expression(&mut self, id: NodeId<'a>) -> Result<Object, ScriptError> {
        let node = self.node(id)?;
        self.descend(node, |this| this.eval_expression_node(node))
    }

    fn eval_expression_node(&mut self, node: &'t Node<'a>) -> Result<Object, ScriptError> {
        let value = match node.kind {
            NodeKind::IntLiteral => match node.token.value {
                TokenValue::Int(v) => match i32::try_from(v) {
                    Ok(v) => Object::int(v),
                    Err(_) => Object::long(v),
                },
                _ => return Err(self.malformed(node)),
            },
            NodeKind::FloatLiteral => match node.token.value {
                TokenValue::Float(v) => Object::float(v as f32),
                _ => return Err(self.malformed(node)),
            },
            NodeKind::StringLiteral => Object::string(node.token.text().as_bytes()),
            NodeKind::BoolLiteral => Object::bool(node.token.is_word("true")),
            NodeKind::Identifier => {
                let name = node.token.text();
                self.ctx.lookup(name).cloned().ok_or_else(|| {
                    ScriptError::new(ErrorKind::ReferenceError, format!("'{}' is not defined", name))
                        .at(node.token.position())
                })?
            }
            NodeKind::FunctionCall => self.eval_call(node)?,
            NodeKind::Expression => self.eval_expression(self.child(node, 0)?)?,
            kind if is_binary(kind) => return self.eval_chain(node),
            _ => return Err(self.malformed(node)),
        };
        self.finish(value, node)
    }

    /// Evaluate a right-nested run of binary operators in a loop.
    ///
    /// `a - (b - (c - d))` evaluates `a`, `b`, `c` and `d` in order, then
    /// folds the operators from the innermost out.
    fn eval_chain(&mut self, node: &'t Node<'a>) -> Result<Object, ScriptError> {
        let mut pending = Vec::new();
        let mut current = node;
        let mut value = loop {
            let lhs = self.eval_expression(self.child(current, 0)?)?;
            pending.push((current, lhs));
            let rhs = self.child(current, 1)?;
            let rhs_node = self.node(rhs)?;
            if !is_binary(rhs_node.kind) {
                break self.eval_expression(rhs)?;
            }
            current = rhs_node;
        };

        while let Some((node, lhs)) = pending.pop() {
            let result = match node.kind {
                NodeKind::Term | NodeKind::Factor => binop(lhs, value, binary_op(node)),
                _ => compare(lhs, value, compare_op(node)),
            };
            value = self.finish(result, node)?;
        }
        Ok(value)
    }

    /// Check a computed value, then apply the node's unary operator
    fn finish(&self, value: Object, node: &Node<'a>) -> Result<Object, ScriptError> {
        let value = self.check(value, node)?;
        let value = if node.properties.contains(NodeProperties::NEGATE) {
            negate(value)
        } else if node.properties.contains(NodeProperties::NOT) {
            logical_not(&value)
        } else {
            value
        };
        self.check(value, node)
    }

    /// Turn an error object into a `TypeError`
    fn check(&self, value: Object, node: &Node<'a>) -> Result<Object, ScriptError> {
        match value.error_code() {
            Some(code) => Err(self.object_error(code, node)),
            None => Ok(value),
        }
    }

    // ---- helpers ----

    fn node(&self, id: NodeId<'a>) -> Result<&'t Node<'a>, ScriptError> {
        let ast: &'t Ast<'a> = self.ast;
        ast.node(id)
            .ok_or_else(|| internal("dangling syntax tree handle"))
    }

    fn children(&self, id: NodeId<'a>) -> &'t [NodeId<'a>] {
        let ast: &'t Ast<'a> = self.ast;
        ast.children(id)
    }

    fn child(&self, node: &Node<'a>, index: usize) -> Result<NodeId<'a>, ScriptError> {
        node.children
            .get(index)
            .copied()
            .ok_or_else(|| self.malformed(node))
    }

    fn malformed(&self, node: &Node<'a>) -> ScriptError {
        internal(format!("malformed {} node", node.kind)).at(node.token.position())
    }

    fn object_error(&self, code: ErrorCode, node: &Node<'a>) -> ScriptError {
        let message = match node.kind {
            NodeKind::Term | NodeKind::Factor | NodeKind::Equality | NodeKind::Comparison => {
                format!("{} for '{}'", code, node.token.lexeme)
            }
            _ => code.to_string(),
        };
        ScriptError::new(ErrorKind::TypeError, message).at(node.token.position())
    }
}

/// Cast a numeric argument to its declared parameter type
fn conform(value: Object, parameter: &Object) -> Result<Object, ErrorCode> {
    match &parameter.value {
        Value::Type(ty) if ty.tag.is_numeric() => cast(value, ty.tag),
        Value::Type(ty) if ty.tag == TypeTag::String && value.tag() != TypeTag::String => {
            Err(ErrorCode::TypeMismatch)
        }
        _ => Ok(value),
    }
}

fn is_binary(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Term | NodeKind::Factor | NodeKind::Equality | NodeKind::Comparison
    )
}

fn binary_op(node: &Node<'_>) -> BinaryOp {
    let p = node.properties;
    match node.kind {
        NodeKind::Term if p.contains(NodeProperties::IS_ADD) => BinaryOp::Add,
        NodeKind::Term => BinaryOp::Sub,
        _ if p.contains(NodeProperties::IS_MUL) => BinaryOp::Mul,
        _ => BinaryOp::Div,
    }
}

fn compare_op(node: &Node<'_>) -> CompareOp {
    let p = node.properties;
    match node.kind {
        NodeKind::Equality if p.contains(NodeProperties::IS_EQUAL) => CompareOp::Equal,
        NodeKind::Equality => CompareOp::NotEqual,
        _ => match (
            p.contains(NodeProperties::CMP_GREATER),
            p.contains(NodeProperties::CMP_INCLUSIVE),
        ) {
            (true, true) => CompareOp::GreaterEqual,
            (true, false) => CompareOp::Greater,
            (false, true) => CompareOp::LessEqual,
            (false, false) => CompareOp::Less,
        },
    }
}

fn internal(message: impl Into<String>) -> ScriptError {
    ScriptError::new(ErrorKind::InternalError, message)
}

fn scope_error(error: ScopeError, position: SourcePosition) -> ScriptError {
    ScriptError::new(ErrorKind::RangeError, error.to_string()).at(position)
}
