//! Recursive descent parser for Duct
//!
//! Tokens are pulled from the lexer through an 8-slot ring buffer refilled
//! four tokens at a time. Every grammar function returns the handle of the
//! node it built or the first syntax error it hit; the top-level loop records
//! the error as a [`Diagnostic`], skips the broken construct and keeps going.

use core_types::{ErrorKind, ScriptError};
use log::{debug, trace, warn};

use crate::ast::{Ast, NodeId, NodeKind, NodeProperties};
use crate::error::{syntax_error, unexpected_eof, unexpected_token, Diagnostic, ParseFailure};
use crate::lexer::{Lexer, LexerConfig, Symbol, Token, TokenKind};

/// Ring buffer size
const LOOKAHEAD: usize = 8;
/// Tokens loaded per refill; also the lookahead limit for `peek`
const REFILL: usize = 4;

/// Deepest nesting of statements, rvalues, groups and unary operators
pub const MAX_NESTING_DEPTH: usize = 256;

/// Remaining stack below which recursion moves to a new segment
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new stack segment
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Words that cannot name variables or appear as identifiers
const KEYWORDS: [&str; 7] = ["if", "else", "return", "true", "false", "type", "include"];

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// File name used in diagnostics
    pub file_name: String,
    /// Lexer configuration
    pub lexer: LexerConfig,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            file_name: "<input>".to_string(),
            lexer: LexerConfig::default(),
        }
    }
}

/// Duct parser
///
/// # Examples
///
/// ```
/// use parser::{NodeKind, Parser};
///
/// let ast = Parser::new("main(): int { return 1 + 2 }").parse().unwrap();
/// let decl = ast.children(ast.root())[0];
/// assert_eq!(ast.node(decl).unwrap().kind, NodeKind::FunctionDecl);
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParserOptions,
    buffer: [Token<'a>; LOOKAHEAD],
    /// Tokens loaded from the lexer so far
    parsed: usize,
    /// Tokens consumed so far
    requested: usize,
    /// Braces opened and not yet closed
    open_braces: usize,
    /// Track function depth for return validation
    function_depth: usize,
    /// Open statements, rvalues, groups and unary operators
    nesting: usize,
    ast: Ast<'a>,
    diagnostics: Vec<Diagnostic>,
    abort: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser with default options
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    /// Create a parser with explicit options
    pub fn with_options(source: &'a str, options: ParserOptions) -> Self {
        Self {
            lexer: Lexer::with_config(source, options.lexer.clone()),
            options,
            buffer: [Token::default(); LOOKAHEAD],
            parsed: 0,
            requested: 0,
            open_braces: 0,
            function_depth: 0,
            nesting: 0,
            ast: Ast::new(),
            diagnostics: Vec::new(),
            abort: false,
        }
    }

    /// Set the file name reported in diagnostics
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.options.file_name = file_name.into();
        self
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Parse the whole source
    ///
    /// Returns the tree only when no diagnostic was recorded.
    pub fn parse(mut self) -> Result<Ast<'a>, ParseFailure> {
        loop {
            match self.parse_top_level() {
                Ok(Some(node)) => {
                    let root = self.ast.root();
                    self.ast.append_child(root, node);
                }
                Ok(None) => break,
                Err(error) => {
                    let row = error.source_position.map(|p| p.line);
                    let fatal = matches!(
                        error.kind,
                        ErrorKind::LexicalError | ErrorKind::InternalError
                    );
                    self.record(&error);
                    if fatal || self.synchronize(row).is_err() {
                        break;
                    }
                }
            }
        }

        debug!(
            "parsed {}: {} top-level items, {} nodes, {} diagnostics",
            self.options.file_name,
            self.ast.children(self.ast.root()).len(),
            self.ast.len(),
            self.diagnostics.len()
        );

        if self.abort {
            Err(ParseFailure {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.ast)
        }
    }

    /// Inspect the `n`-th upcoming token without consuming it (`n < 4`)
    pub fn peek(&mut self, n: usize) -> Result<Token<'a>, ScriptError> {
        if n >= REFILL {
            return Err(ScriptError::new(
                ErrorKind::InternalError,
                format!("lookahead of {} exceeds {} tokens", n, REFILL),
            ));
        }
        if self.parsed == 0 {
            self.fill(LOOKAHEAD)?;
        } else if self.requested + REFILL > self.parsed {
            self.fill(REFILL)?;
        }
        Ok(self.buffer[(self.requested + n) % LOOKAHEAD])
    }

    /// Consume the current token
    pub fn advance(&mut self) -> Result<Token<'a>, ScriptError> {
        let token = self.peek(0)?;
        self.requested += 1;
        match token.symbol() {
            Some(Symbol::LBrace) => self.open_braces += 1,
            Some(Symbol::RBrace) => self.open_braces = self.open_braces.saturating_sub(1),
            _ => {}
        }
        Ok(token)
    }

    fn fill(&mut self, count: usize) -> Result<(), ScriptError> {
        for _ in 0..count {
            let token = self.lexer.next_token()?;
            self.buffer[self.parsed % LOOKAHEAD] = token;
            self.parsed += 1;
        }
        trace!("lookahead refilled to {} tokens", self.parsed);
        Ok(())
    }

    fn record(&mut self, error: &ScriptError) {
        let diagnostic = Diagnostic::from_error(&self.options.file_name, error);
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
        self.abort = true;
    }

    /// Skip the rest of a broken construct: every open brace is closed, or
    /// for a top-level statement the rest of its line is dropped.
    fn synchronize(&mut self, row: Option<u32>) -> Result<(), ScriptError> {
        self.function_depth = 0;
        if self.open_braces > 0 {
            while self.open_braces > 0 {
                if self.advance()?.is_eos() {
                    break;
                }
            }
            return Ok(());
        }
        let row = row.unwrap_or(0);
        loop {
            let token = self.peek(0)?;
            if token.is_eos() || token.row > row {
                return Ok(());
            }
            self.advance()?;
        }
    }

    // ---- token helpers ----

    fn current(&mut self) -> Result<Token<'a>, ScriptError> {
        self.peek(0)
    }

    fn check_symbol(&mut self, sym: Symbol) -> Result<bool, ScriptError> {
        Ok(self.current()?.is_symbol(sym))
    }

    fn expect_symbol(&mut self, sym: Symbol) -> Result<Token<'a>, ScriptError> {
        let token = self.current()?;
        if token.is_symbol(sym) {
            return self.advance();
        }
        Err(self.unexpected(&format!("'{}'", sym), token))
    }

    fn expect_word(&mut self, what: &str) -> Result<Token<'a>, ScriptError> {
        let token = self.current()?;
        if token.kind == TokenKind::Word {
            return self.advance();
        }
        Err(self.unexpected(what, token))
    }

    fn skip_newlines(&mut self) -> Result<(), ScriptError> {
        while self.current()?.kind == TokenKind::EndOfLine {
            self.advance()?;
        }
        Ok(())
    }

    fn unexpected(&self, expected: &str, got: Token<'a>) -> ScriptError {
        if got.is_eos() {
            unexpected_eof(Some(got.position()))
        } else {
            unexpected_token(expected, &got.to_string(), Some(got.position()))
        }
    }

    fn node(&mut self, kind: NodeKind, token: Token<'a>) -> NodeId<'a> {
        self.ast.add(kind, token)
    }

    fn set_properties(&mut self, id: NodeId<'a>, properties: NodeProperties) {
        if let Some(node) = self.ast.node_mut(id) {
            node.properties = node.properties.with(properties);
        }
    }

    /// Run a grammar function one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            let token = self.current()?;
            return Err(syntax_error(
                format!("nested deeper than {} levels", MAX_NESTING_DEPTH),
                Some(token.position()),
            ));
        }
        self.nesting += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || parse(self));
        self.nesting -= 1;
        result
    }

    // ---- top level ----

    fn parse_top_level(&mut self) -> Result<Option<NodeId<'a>>, ScriptError> {
        self.open_braces = 0;
        self.skip_newlines()?;
        let token = self.current()?;
        if token.is_eos() {
            return Ok(None);
        }
        if token.kind != TokenKind::Word {
            return Err(syntax_error(
                "unexpected high level statement",
                Some(token.position()),
            ));
        }
        if token.is_word("type") || token.is_word("include") {
            return Err(syntax_error(
                format!("'{}' is not implemented", token.lexeme),
                Some(token.position()),
            ));
        }
        if !KEYWORDS.contains(&token.lexeme) && self.peek(1)?.is_symbol(Symbol::LParen) {
            return self.parse_function_decl().map(Some);
        }
        self.parse_statement().map(Some)
    }

    fn parse_function_decl(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let name = self.expect_word("function name")?;
        let decl = self.node(NodeKind::FunctionDecl, name);

        let lparen = self.expect_symbol(Symbol::LParen)?;
        let args = self.node(NodeKind::FunctionArgs, lparen);
        while !self.check_symbol(Symbol::RParen)? {
            let arg_name = self.expect_word("argument name")?;
            let arg_type = self.expect_word("argument type")?;
            let arg = self.node(NodeKind::SymbolDecl, arg_name);
            let ty = self.node(NodeKind::Type, arg_type);
            self.ast.append_child(arg, ty);
            self.ast.append_child(args, arg);
            if !self.check_symbol(Symbol::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.expect_symbol(Symbol::RParen)?;
        self.ast.append_child(decl, args);

        if self.check_symbol(Symbol::Colon)? {
            self.advance()?;
            let ret = self.expect_word("return type")?;
            let ty = self.node(NodeKind::Type, ret);
            self.ast.append_child(decl, ty);
        }

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        let body = body?;
        self.ast.append_child(decl, body);

        trace!("function '{}' declared at {}:{}", name.lexeme, name.row, name.column);
        Ok(decl)
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let lbrace = self.expect_symbol(Symbol::LBrace)?;
        let block = self.node(NodeKind::Block, lbrace);
        loop {
            self.skip_newlines()?;
            let token = self.current()?;
            if token.is_symbol(Symbol::RBrace) {
                break;
            }
            if token.is_symbol(Symbol::Semicolon) {
                self.advance()?;
                continue;
            }
            if token.is_eos() {
                return Err(unexpected_eof(Some(token.position())));
            }
            let statement = self.nested(Self::parse_statement)?;
            self.ast.append_child(block, statement);
        }
        self.expect_symbol(Symbol::RBrace)?;
        Ok(block)
    }

    fn parse_statement(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let token = self.current()?;
        if token.kind != TokenKind::Word {
            return Err(self.unexpected("statement", token));
        }
        match token.lexeme {
            "return" => self.parse_return(),
            "if" => self.parse_if_chain(),
            "else" => Err(syntax_error("'else' without 'if'", Some(token.position()))),
            _ => {
                let next = self.peek(1)?;
                if next.is_symbol(Symbol::LParen) {
                    self.parse_call()
                } else if next.is_symbol(Symbol::Assign) {
                    self.parse_variable()
                } else {
                    Err(self.unexpected("'=' or '('", next))
                }
            }
        }
    }

    fn parse_return(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let token = self.advance()?;
        if self.function_depth == 0 {
            return Err(syntax_error(
                "'return' outside of a function",
                Some(token.position()),
            ));
        }
        let node = self.node(NodeKind::Return, token);
        let value = self.parse_rvalue()?;
        self.ast.append_child(node, value);
        Ok(node)
    }

    fn parse_if_chain(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let if_token = self.advance()?;
        let statement = self.node(NodeKind::IfStatement, if_token);
        let branch = self.parse_conditional_branch(NodeKind::If, if_token)?;
        self.ast.append_child(statement, branch);

        while self.current()?.is_word("else") {
            let else_token = self.advance()?;
            if self.current()?.is_word("if") {
                self.advance()?;
                let branch = self.parse_conditional_branch(NodeKind::ElseIf, else_token)?;
                self.ast.append_child(statement, branch);
            } else {
                let branch = self.node(NodeKind::Else, else_token);
                let body = self.parse_block()?;
                self.ast.append_child(branch, body);
                self.ast.append_child(statement, branch);
                break;
            }
        }
        Ok(statement)
    }

    fn parse_conditional_branch(
        &mut self,
        kind: NodeKind,
        token: Token<'a>,
    ) -> Result<NodeId<'a>, ScriptError> {
        let branch = self.node(kind, token);
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        self.ast.append_child(branch, condition);
        self.ast.append_child(branch, body);
        Ok(branch)
    }

    fn parse_call(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let name = self.advance()?;
        let call = self.node(NodeKind::FunctionCall, name);
        let lparen = self.expect_symbol(Symbol::LParen)?;
        let args = self.node(NodeKind::FunctionArgs, lparen);
        while !self.check_symbol(Symbol::RParen)? {
            let arg = self.parse_rvalue()?;
            self.ast.append_child(args, arg);
            if !self.check_symbol(Symbol::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.expect_symbol(Symbol::RParen)?;
        self.ast.append_child(call, args);
        Ok(call)
    }

    fn parse_variable(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let name = self.advance()?;
        if KEYWORDS.contains(&name.lexeme) {
            return Err(syntax_error(
                format!("'{}' is a reserved word", name.lexeme),
                Some(name.position()),
            ));
        }
        self.expect_symbol(Symbol::Assign)?;
        let variable = self.node(NodeKind::Variable, name);
        let value = self.parse_rvalue()?;
        self.ast.append_child(variable, value);
        Ok(variable)
    }

    // ---- rvalues ----

    fn parse_rvalue(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.nested(|parser| {
            let token = parser.current()?;
            match token.symbol() {
                Some(Symbol::LBracket) => parser.parse_array(),
                Some(Symbol::LBrace) => parser.parse_object(),
                _ => parser.parse_expression(),
            }
        })
    }

    fn parse_array(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let lbracket = self.advance()?;
        let array = self.node(NodeKind::Array, lbracket);
        loop {
            self.skip_newlines()?;
            if self.check_symbol(Symbol::RBracket)? {
                break;
            }
            let element = self.parse_rvalue()?;
            self.ast.append_child(array, element);
            self.skip_newlines()?;
            if !self.check_symbol(Symbol::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.expect_symbol(Symbol::RBracket)?;
        Ok(array)
    }

    fn parse_object(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let lbrace = self.advance()?;
        let object = self.node(NodeKind::Object, lbrace);
        loop {
            self.skip_newlines()?;
            let token = self.current()?;
            if token.is_symbol(Symbol::RBrace) {
                break;
            }
            let field = if token.kind == TokenKind::Word && self.peek(1)?.is_symbol(Symbol::Assign) {
                self.parse_variable()?
            } else {
                let field = self.node(NodeKind::RValue, token);
                let value = self.parse_rvalue()?;
                self.ast.append_child(field, value);
                field
            };
            self.ast.append_child(object, field);
            self.skip_newlines()?;
            if !self.check_symbol(Symbol::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.skip_newlines()?;
        self.expect_symbol(Symbol::RBrace)?;
        Ok(object)
    }

    // ---- expressions ----

    /// Parse an expression (equality is the lowest precedence level)
    pub fn parse_expression(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.parse_chain(NodeKind::Equality, Self::parse_comparison, |symbol| match symbol {
            Some(Symbol::EqEq) => Some(NodeProperties::IS_EQUAL),
            Some(Symbol::NotEq) => Some(NodeProperties::NONE),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.parse_chain(NodeKind::Comparison, Self::parse_term, |symbol| match symbol {
            Some(Symbol::Greater) => Some(NodeProperties::CMP_GREATER),
            Some(Symbol::GreaterEq) => {
                Some(NodeProperties::CMP_GREATER.with(NodeProperties::CMP_INCLUSIVE))
            }
            Some(Symbol::Less) => Some(NodeProperties::NONE),
            Some(Symbol::LessEq) => Some(NodeProperties::CMP_INCLUSIVE),
            _ => None,
        })
    }

    fn parse_term(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.parse_chain(NodeKind::Term, Self::parse_factor, |symbol| match symbol {
            Some(Symbol::Plus) => Some(NodeProperties::IS_ADD),
            Some(Symbol::Minus) => Some(NodeProperties::NONE),
            _ => None,
        })
    }

    fn parse_factor(&mut self) -> Result<NodeId<'a>, ScriptError> {
        self.parse_chain(NodeKind::Factor, Self::parse_unary, |symbol| match symbol {
            Some(Symbol::Star) => Some(NodeProperties::IS_MUL),
            Some(Symbol::Slash) => Some(NodeProperties::NONE),
            _ => None,
        })
    }

    /// Parse `operand (op operand)*` of one precedence level.
    ///
    /// The chain is read in a loop and nested to the right:
    /// `a - b - c` becomes `a - (b - c)`.
    fn parse_chain(
        &mut self,
        kind: NodeKind,
        operand: fn(&mut Self) -> Result<NodeId<'a>, ScriptError>,
        operator: fn(Option<Symbol>) -> Option<NodeProperties>,
    ) -> Result<NodeId<'a>, ScriptError> {
        let mut pending = Vec::new();
        let mut rhs = operand(self)?;
        while let Some(properties) = operator(self.current()?.symbol()) {
            let op = self.advance()?;
            pending.push((rhs, op, properties));
            rhs = operand(self)?;
        }
        while let Some((lhs, op, properties)) = pending.pop() {
            rhs = self.binary(kind, op, properties, lhs, rhs);
        }
        Ok(rhs)
    }

    fn binary(
        &mut self,
        kind: NodeKind,
        op: Token<'a>,
        properties: NodeProperties,
        lhs: NodeId<'a>,
        rhs: NodeId<'a>,
    ) -> NodeId<'a> {
        let node = self.node(kind, op);
        self.set_properties(node, properties);
        self.ast.append_child(node, lhs);
        self.ast.append_child(node, rhs);
        node
    }

    fn parse_unary(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let flag = match self.current()?.symbol() {
            Some(Symbol::Minus) => NodeProperties::NEGATE,
            Some(Symbol::Bang) => NodeProperties::NOT,
            _ => return self.parse_primary(),
        };
        let op = self.advance()?;
        let mut operand = self.nested(Self::parse_unary)?;
        // One unary flag per node; stacked operators get a wrapper.
        let stacked = self
            .ast
            .node(operand)
            .is_some_and(|n| n.properties.has_unary());
        if stacked {
            let wrapper = self.node(NodeKind::Expression, op);
            self.ast.append_child(wrapper, operand);
            operand = wrapper;
        }
        self.set_properties(operand, flag);
        Ok(operand)
    }

    fn parse_primary(&mut self) -> Result<NodeId<'a>, ScriptError> {
        let token = self.current()?;
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance()?;
                Ok(self.node(NodeKind::IntLiteral, token))
            }
            TokenKind::FloatLiteral => {
                self.advance()?;
                Ok(self.node(NodeKind::FloatLiteral, token))
            }
            TokenKind::StringLiteral => {
                self.advance()?;
                Ok(self.node(NodeKind::StringLiteral, token))
            }
            TokenKind::Word if token.is_word("true") || token.is_word("false") => {
                self.advance()?;
                Ok(self.node(NodeKind::BoolLiteral, token))
            }
            TokenKind::Word if KEYWORDS.contains(&token.lexeme) => Err(syntax_error(
                format!("unexpected keyword '{}'", token.lexeme),
                Some(token.position()),
            )),
            TokenKind::Word => {
                if self.peek(1)?.is_symbol(Symbol::LParen) {
                    return self.parse_call();
                }
                self.advance()?;
                Ok(self.node(NodeKind::Identifier, token))
            }
            TokenKind::Symbol if token.is_symbol(Symbol::LParen) => {
                self.advance()?;
                let group = self.node(NodeKind::Expression, token);
                let inner = self.nested(Self::parse_expression)?;
                self.expect_symbol(Symbol::RParen)?;
                self.ast.append_child(group, inner);
                Ok(group)
            }
            _ => Err(self.unexpected("expression", token)),
        }
    }
}
