//! Duct lexer - tokenizes source text into borrowed tokens

use std::fmt;

use core_types::{ErrorKind, ScriptError, SourcePosition};

/// Fixed symbols recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `>=`
    GreaterEq,
    /// `<=`
    LessEq,
    /// `..`
    DotDot,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `?`
    Question,
    /// `!`
    Bang,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `=`
    Assign,
    /// `>`
    Greater,
    /// `<`
    Less,
}

/// Symbol table in match order. Two-character entries are listed first so
/// `==` never scans as two `=`.
const SYMBOLS: [(&str, Symbol); 24] = [
    ("==", Symbol::EqEq),
    ("!=", Symbol::NotEq),
    (">=", Symbol::GreaterEq),
    ("<=", Symbol::LessEq),
    ("..", Symbol::DotDot),
    (".", Symbol::Dot),
    (",", Symbol::Comma),
    ("(", Symbol::LParen),
    (")", Symbol::RParen),
    ("[", Symbol::LBracket),
    ("]", Symbol::RBracket),
    ("{", Symbol::LBrace),
    ("}", Symbol::RBrace),
    (":", Symbol::Colon),
    (";", Symbol::Semicolon),
    ("?", Symbol::Question),
    ("!", Symbol::Bang),
    ("-", Symbol::Minus),
    ("+", Symbol::Plus),
    ("*", Symbol::Star),
    ("/", Symbol::Slash),
    ("=", Symbol::Assign),
    (">", Symbol::Greater),
    ("<", Symbol::Less),
];

impl Symbol {
    /// Source spelling of the symbol
    pub fn as_str(&self) -> &'static str {
        SYMBOLS
            .iter()
            .find(|(_, sym)| sym == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    /// End of the source text
    #[default]
    EndOfStream,
    /// Line terminator (only produced when newlines are not elided)
    EndOfLine,
    /// Entry of the fixed symbol table
    Symbol,
    /// Identifier or keyword
    Word,
    /// Decimal integer literal
    IntLiteral,
    /// Decimal literal with one embedded point
    FloatLiteral,
    /// Quoted string literal
    StringLiteral,
    /// Block comment (only produced when comments are emitted)
    Comment,
}

/// Token payload
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TokenValue<'a> {
    /// No payload
    #[default]
    None,
    /// Symbol id
    Symbol(Symbol),
    /// Integer literal value
    Int(i64),
    /// Float literal value
    Float(f64),
    /// Slice of the source text (word, string body, comment body)
    Text(&'a str),
}

/// Token produced by the lexer
///
/// Tokens are `Copy` and borrow from the source text they were scanned from.
///
/// # Examples
///
/// ```
/// use parser::{Lexer, Symbol, TokenKind};
///
/// let mut lexer = Lexer::new("x = 42");
/// let name = lexer.next_token().unwrap();
/// assert_eq!(name.kind, TokenKind::Word);
/// assert_eq!(name.text(), "x");
/// assert!(lexer.next_token().unwrap().is_symbol(Symbol::Assign));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Token<'a> {
    /// Token classification
    pub kind: TokenKind,
    /// Token payload
    pub value: TokenValue<'a>,
    /// Raw source slice the token was scanned from, quotes included
    pub lexeme: &'a str,
    /// Line of the first character, starting at 1
    pub row: u32,
    /// Column of the first character, starting at 1
    pub column: u32,
    /// Byte offset of the first character
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Symbol id, if this is a symbol token
    pub fn symbol(&self) -> Option<Symbol> {
        match self.value {
            TokenValue::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    /// Check for a specific symbol
    pub fn is_symbol(&self, sym: Symbol) -> bool {
        self.symbol() == Some(sym)
    }

    /// Check for a specific word
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.lexeme == word
    }

    /// True at end of input
    pub fn is_eos(&self) -> bool {
        self.kind == TokenKind::EndOfStream
    }

    /// Text payload for words, strings and comments; the lexeme otherwise
    pub fn text(&self) -> &'a str {
        match self.value {
            TokenValue::Text(text) => text,
            _ => self.lexeme,
        }
    }

    /// Source position of the first character
    pub fn position(&self) -> SourcePosition {
        SourcePosition {
            line: self.row,
            column: self.column,
            offset: self.offset,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfStream => f.write_str("end of input"),
            TokenKind::EndOfLine => f.write_str("end of line"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

/// Lexer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    /// Drop line terminators instead of emitting `EndOfLine`
    pub skip_newlines: bool,
    /// Opening string quote
    pub quote_open: u8,
    /// Closing string quote
    pub quote_close: u8,
    /// Block comment opening sequence
    pub comment_open: &'static str,
    /// Block comment closing sequence
    pub comment_close: &'static str,
    /// Emit `Comment` tokens instead of skipping comments
    pub emit_comments: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            skip_newlines: true,
            quote_open: b'"',
            quote_close: b'"',
            comment_open: "/*",
            comment_close: "*/",
            emit_comments: false,
        }
    }
}

/// Lexer for Duct source code
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    config: LexerConfig,
    position: usize,
    row: u32,
    column: u32,
    in_comment: bool,
    comment_start: Option<(usize, u32, u32)>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer with the default configuration
    pub fn new(source: &'a str) -> Self {
        Self::with_config(source, LexerConfig::default())
    }

    /// Create a lexer with an explicit configuration
    pub fn with_config(source: &'a str, config: LexerConfig) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            config,
            position: 0,
            row: 1,
            column: 1,
            in_comment: false,
            comment_start: None,
        }
    }

    /// Lexer configuration
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Current position in the source
    pub fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.row,
            column: self.column,
            offset: self.position,
        }
    }

    /// Scan every remaining token, stopping before end of input
    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is_eos() {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    /// Get the next token from the source
    ///
    /// Returns `EndOfStream` forever once the input is exhausted. An
    /// unrecognized character is a `LexicalError`.
    pub fn next_token(&mut self) -> Result<Token<'a>, ScriptError> {
        loop {
            if self.is_at_end() {
                self.in_comment = false;
                return Ok(self.make(TokenKind::EndOfStream, TokenValue::None, self.position, 0));
            }

            if self.in_comment {
                if let Some(token) = self.scan_comment_body() {
                    return Ok(token);
                }
                continue;
            }

            if self.starts_with(self.config.comment_open) {
                self.comment_start = Some((self.position, self.row, self.column));
                self.bump(self.config.comment_open.len());
                self.in_comment = true;
                continue;
            }

            if let Some((text, sym)) = SYMBOLS.iter().find(|(text, _)| self.starts_with(text)) {
                let token = self.make(TokenKind::Symbol, TokenValue::Symbol(*sym), self.position, text.len());
                self.bump(text.len());
                return Ok(token);
            }

            let c = self.peek();
            if c.is_ascii_alphabetic() || c == b'_' {
                return Ok(self.scan_word());
            }
            if c.is_ascii_digit() {
                return self.scan_number();
            }
            if c == self.config.quote_open {
                return Ok(self.scan_string());
            }
            if c == b'\n' {
                let token = self.make(TokenKind::EndOfLine, TokenValue::None, self.position, 1);
                self.newline();
                if self.config.skip_newlines {
                    continue;
                }
                return Ok(token);
            }
            if c == b' ' || c == b'\t' || c == b'\r' {
                self.bump(1);
                continue;
            }

            let ch = self.source[self.position..].chars().next().unwrap_or('\0');
            return Err(ScriptError::new(
                ErrorKind::LexicalError,
                format!("unrecognized character '{}'", ch.escape_default()),
            )
            .at(self.current_position()));
        }
    }

    /// Consume comment text up to and including the close sequence.
    fn scan_comment_body(&mut self) -> Option<Token<'a>> {
        while !self.is_at_end() {
            if self.starts_with(self.config.comment_close) {
                self.bump(self.config.comment_close.len());
                self.in_comment = false;
                let (start, row, column) = self.comment_start.take()?;
                if !self.config.emit_comments {
                    return None;
                }
                let open = self.config.comment_open.len();
                let close = self.config.comment_close.len();
                let body = &self.source[start + open..self.position - close];
                return Some(Token {
                    kind: TokenKind::Comment,
                    value: TokenValue::Text(body),
                    lexeme: &self.source[start..self.position],
                    row,
                    column,
                    offset: start,
                });
            }
            self.advance_char();
        }
        None
    }

    fn scan_word(&mut self) -> Token<'a> {
        let start = self.position;
        let column = self.column;
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            self.bump(1);
        }
        let text = &self.source[start..self.position];
        Token {
            kind: TokenKind::Word,
            value: TokenValue::Text(text),
            lexeme: text,
            row: self.row,
            column,
            offset: start,
        }
    }

    fn scan_number(&mut self) -> Result<Token<'a>, ScriptError> {
        let start = self.position;
        let column = self.column;
        let mut is_float = false;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_digit() {
                self.bump(1);
            } else if c == b'.' && !is_float && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                self.bump(1);
            } else {
                break;
            }
        }

        let text = &self.source[start..self.position];
        let position = SourcePosition {
            line: self.row,
            column,
            offset: start,
        };
        let (kind, value) = if is_float {
            let v = text.parse::<f64>().map_err(|_| {
                ScriptError::new(ErrorKind::LexicalError, format!("invalid float literal '{}'", text))
                    .at(position)
            })?;
            (TokenKind::FloatLiteral, TokenValue::Float(v))
        } else {
            let v = text.parse::<i64>().map_err(|_| {
                ScriptError::new(ErrorKind::LexicalError, format!("integer literal '{}' out of range", text))
                    .at(position)
            })?;
            (TokenKind::IntLiteral, TokenValue::Int(v))
        };

        Ok(Token {
            kind,
            value,
            lexeme: text,
            row: self.row,
            column,
            offset: start,
        })
    }

    /// Strings run to the matching close quote (or end of input). Escaped
    /// quotes stay in the body as written.
    fn scan_string(&mut self) -> Token<'a> {
        let start = self.position;
        let row = self.row;
        let column = self.column;
        let close = self.config.quote_close;
        self.bump(1);

        let body_start = self.position;
        let mut body_end = self.bytes.len();
        while !self.is_at_end() {
            let c = self.peek();
            if c == b'\\' && self.peek_at(1) == Some(close) {
                self.bump(2);
            } else if c == close {
                body_end = self.position;
                self.bump(1);
                break;
            } else {
                self.advance_char();
            }
        }

        Token {
            kind: TokenKind::StringLiteral,
            value: TokenValue::Text(&self.source[body_start..body_end]),
            lexeme: &self.source[start..self.position],
            row,
            column,
            offset: start,
        }
    }

    fn make(&self, kind: TokenKind, value: TokenValue<'a>, start: usize, len: usize) -> Token<'a> {
        Token {
            kind,
            value,
            lexeme: &self.source[start..start + len],
            row: self.row,
            column: self.column,
            offset: start,
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.position).copied().unwrap_or(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.position + ahead).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        !text.is_empty() && self.bytes[self.position..].starts_with(text.as_bytes())
    }

    fn bump(&mut self, len: usize) {
        self.position += len;
        self.column += len as u32;
    }

    fn newline(&mut self) {
        self.position += 1;
        self.row += 1;
        self.column = 1;
    }

    /// Advance over one character, tracking rows and multi-byte characters.
    fn advance_char(&mut self) {
        if self.peek() == b'\n' {
            self.newline();
            return;
        }
        let width = self.source[self.position..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        self.position += width;
        self.column += 1;
    }
}
