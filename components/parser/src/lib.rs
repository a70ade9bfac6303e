//! Duct Parser Component
//!
//! Provides the lexer, the recursive descent parser and the arena-backed
//! syntax tree for Duct source text.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes source text into borrowed [`Token`]s
//! - [`Parser`] - Recursive descent parser with a ring-buffered lookahead
//! - [`Ast`] - Syntax tree whose [`Node`]s live in an arena
//! - [`Diagnostic`] / [`ParseFailure`] - Recorded syntax errors
//!
//! # Example
//!
//! ```
//! use parser::{NodeKind, Parser};
//!
//! let source = "main(): int { x = 40\n return x + 2 }";
//! let ast = Parser::new(source).parse().unwrap();
//!
//! let main = ast.children(ast.root())[0];
//! assert_eq!(ast.node(main).unwrap().kind, NodeKind::FunctionDecl);
//! assert!(ast.dump().contains("function decl:  main"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Ast, Node, NodeId, NodeKind, NodeProperties};
pub use error::{Diagnostic, ParseFailure};
pub use lexer::{Lexer, LexerConfig, Symbol, Token, TokenKind, TokenValue};
pub use parser::{Parser, ParserOptions, MAX_NESTING_DEPTH};
