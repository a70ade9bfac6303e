//! Abstract Syntax Tree stored in an arena
//!
//! Nodes are addressed by [`NodeId`] handles into the tree's arena. A node
//! holds its kind, an operator/unary property mask, the token that produced
//! it and an ordered list of children.

use std::fmt::{self, Write};

use memory_manager::{Arena, ArenaId};

use crate::lexer::Token;
use crate::parser::{STACK_GROW_SIZE, STACK_RED_ZONE};

/// Handle to a node of an [`Ast`]
pub type NodeId<'a> = ArenaId<Node<'a>>;

/// AST node kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Program root
    #[default]
    Root,
    /// `name(args) : type { ... }`
    FunctionDecl,
    /// `name(expr, ...)`
    FunctionCall,
    /// Argument list of a declaration or call
    FunctionArgs,
    /// `{ statements }`
    Block,
    /// Typed argument declaration
    SymbolDecl,
    /// Whole if/else-if/else chain
    IfStatement,
    /// Leading `if` branch
    If,
    /// `else if` branch
    ElseIf,
    /// Trailing `else` branch
    Else,
    /// `return rvalue`
    Return,
    /// Parenthesized expression
    Expression,
    /// `==` / `!=`
    Equality,
    /// `>` / `<` / `>=` / `<=`
    Comparison,
    /// `+` / `-`
    Term,
    /// `*` / `/`
    Factor,
    /// Positional object field
    RValue,
    /// `name = rvalue`
    Variable,
    /// `[ ... ]`
    Array,
    /// `{ ... }`
    Object,
    /// Type name
    Type,
    /// Identifier read
    Identifier,
    /// `true` / `false`
    BoolLiteral,
    /// Integer literal
    IntLiteral,
    /// Float literal
    FloatLiteral,
    /// String literal
    StringLiteral,
}

impl NodeKind {
    /// Display name used by the tree printer
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::FunctionDecl => "function decl",
            NodeKind::FunctionCall => "function call",
            NodeKind::FunctionArgs => "function args",
            NodeKind::Block => "block",
            NodeKind::SymbolDecl => "symbol decl",
            NodeKind::IfStatement => "if statement",
            NodeKind::If => "if",
            NodeKind::ElseIf => "elseif",
            NodeKind::Else => "else",
            NodeKind::Return => "return",
            NodeKind::Expression => "expression",
            NodeKind::Equality => "equality",
            NodeKind::Comparison => "comparison",
            NodeKind::Term => "term",
            NodeKind::Factor => "factor",
            NodeKind::RValue => "rvalue",
            NodeKind::Variable => "variable",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
            NodeKind::Type => "type",
            NodeKind::Identifier => "identifier",
            NodeKind::BoolLiteral => "boolean",
            NodeKind::IntLiteral => "int",
            NodeKind::FloatLiteral => "float",
            NodeKind::StringLiteral => "string",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator variant and unary flags of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeProperties(pub u8);

impl NodeProperties {
    /// No flags
    pub const NONE: NodeProperties = NodeProperties(0);
    /// Term is `+` (otherwise `-`)
    pub const IS_ADD: NodeProperties = NodeProperties(1 << 0);
    /// Factor is `*` (otherwise `/`)
    pub const IS_MUL: NodeProperties = NodeProperties(1 << 1);
    /// Unary `-` applied to the node's value
    pub const NEGATE: NodeProperties = NodeProperties(1 << 2);
    /// Unary `!` applied to the node's value
    pub const NOT: NodeProperties = NodeProperties(1 << 3);
    /// Equality is `==` (otherwise `!=`)
    pub const IS_EQUAL: NodeProperties = NodeProperties(1 << 4);
    /// Comparison is `>`/`>=` (otherwise `<`/`<=`)
    pub const CMP_GREATER: NodeProperties = NodeProperties(1 << 5);
    /// Comparison includes equality (`>=`, `<=`)
    pub const CMP_INCLUSIVE: NodeProperties = NodeProperties(1 << 6);

    /// True when every flag of `other` is set
    pub fn contains(self, other: NodeProperties) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both masks
    pub fn with(self, other: NodeProperties) -> NodeProperties {
        NodeProperties(self.0 | other.0)
    }

    /// True when a unary operator is attached
    pub fn has_unary(self) -> bool {
        self.0 & (Self::NEGATE.0 | Self::NOT.0) != 0
    }
}

/// A single AST node
#[derive(Debug, Clone, Default)]
pub struct Node<'a> {
    /// Node kind
    pub kind: NodeKind,
    /// Operator variant and unary flags
    pub properties: NodeProperties,
    /// Token that produced the node
    pub token: Token<'a>,
    /// Ordered children
    pub children: Vec<NodeId<'a>>,
}

/// Abstract syntax tree borrowing from its source text
///
/// # Examples
///
/// ```
/// use parser::{Ast, NodeKind, Token};
///
/// let mut ast = Ast::new();
/// let block = ast.add(NodeKind::Block, Token::default());
/// ast.append_child(ast.root(), block);
/// assert_eq!(ast.children(ast.root()), &[block]);
/// ```
#[derive(Debug)]
pub struct Ast<'a> {
    nodes: Arena<Node<'a>>,
    root: NodeId<'a>,
}

impl<'a> Ast<'a> {
    /// Create a tree holding only its root node
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::default());
        Self { nodes, root }
    }

    /// Root node handle
    pub fn root(&self) -> NodeId<'a> {
        self.root
    }

    /// Allocate a detached node
    pub fn add(&mut self, kind: NodeKind, token: Token<'a>) -> NodeId<'a> {
        self.nodes.alloc(Node {
            kind,
            properties: NodeProperties::NONE,
            token,
            children: Vec::new(),
        })
    }

    /// Append `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId<'a>, child: NodeId<'a>) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Resolve a handle
    pub fn node(&self, id: NodeId<'a>) -> Option<&Node<'a>> {
        self.nodes.get(id)
    }

    /// Resolve a handle mutably
    pub fn node_mut(&mut self, id: NodeId<'a>) -> Option<&mut Node<'a>> {
        self.nodes.get_mut(id)
    }

    /// Children of a node, empty for unknown handles
    pub fn children(&self, id: NodeId<'a>) -> &[NodeId<'a>] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// First child of the given kind
    pub fn find_child(&self, id: NodeId<'a>, kind: NodeKind) -> Option<NodeId<'a>> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.node(*c).is_some_and(|n| n.kind == kind))
    }

    /// Number of allocated nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.total_allocated()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Render the tree as indented text, four spaces per level
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId<'a>, depth: usize, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        let marker = if node.properties.contains(NodeProperties::NEGATE) {
            '-'
        } else if node.properties.contains(NodeProperties::NOT) {
            '!'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{:indent$}{}: {}{}",
            "",
            node.kind,
            marker,
            node.token.lexeme,
            indent = depth * 4
        );
        for child in &node.children {
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
                self.dump_node(*child, depth + 1, out)
            });
        }
    }
}

impl Default for Ast<'_> {
    fn default() -> Self {
        Self::new()
    }
}
