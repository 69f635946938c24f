use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location in the contract source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start in the source
    pub start: usize,
    /// Byte offset of the end (exclusive) in the source
    pub end: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self { start, end, line, col }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 0, col: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            col: if self.line <= other.line { self.col } else { other.col },
        }
    }
}

/// Token types for contract source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals (numbers keep their source text)
    NumberLit(String),
    BigIntLit(String),
    StringLit(String),
    BoolLit(bool),

    // Identifiers
    Ident(String),
    PrivateName(String), // #name
    Decorator(String),   // @name

    // Keywords
    Class,
    Extends,
    Super,
    This,
    New,
    Return,
    If,
    Else,
    Const,
    Let,
    Var,
    Function,
    Throw,
    Async,
    Await,
    Static,
    Null,
    Typeof,
    Void,
    Delete,
    Instanceof,
    In,
    While,
    Do,
    For,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    /// Reserved word with no grammar here (`switch`, `yield`, ...)
    Reserved(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    StrictEq,    // ===
    StrictNotEq, // !==
    Eq,          // ==
    NotEq,       // !=
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Nullish, // ??
    Assign,
    PlusAssign,
    MinusAssign,
    PlusPlus,
    MinusMinus,
    FatArrow,
    Question,
    Pipe,
    Dot,
    Comma,
    Colon,
    Semicolon,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(n) => write!(f, "{}", n),
            TokenKind::BigIntLit(n) => write!(f, "{}n", n),
            TokenKind::StringLit(s) => write!(f, "\"{}\"", s),
            TokenKind::BoolLit(b) => write!(f, "{}", b),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::PrivateName(s) => write!(f, "#{}", s),
            TokenKind::Decorator(s) => write!(f, "@{}", s),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Extends => write!(f, "extends"),
            TokenKind::Super => write!(f, "super"),
            TokenKind::This => write!(f, "this"),
            TokenKind::New => write!(f, "new"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Let => write!(f, "let"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Function => write!(f, "function"),
            TokenKind::Throw => write!(f, "throw"),
            TokenKind::Async => write!(f, "async"),
            TokenKind::Await => write!(f, "await"),
            TokenKind::Static => write!(f, "static"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Typeof => write!(f, "typeof"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::Delete => write!(f, "delete"),
            TokenKind::Instanceof => write!(f, "instanceof"),
            TokenKind::In => write!(f, "in"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::For => write!(f, "for"),
            TokenKind::Break => write!(f, "break"),
            TokenKind::Continue => write!(f, "continue"),
            TokenKind::Try => write!(f, "try"),
            TokenKind::Catch => write!(f, "catch"),
            TokenKind::Finally => write!(f, "finally"),
            TokenKind::Reserved(word) => write!(f, "{}", word),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::StrictEq => write!(f, "==="),
            TokenKind::StrictNotEq => write!(f, "!=="),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::Nullish => write!(f, "??"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::PlusAssign => write!(f, "+="),
            TokenKind::MinusAssign => write!(f, "-="),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::FatArrow => write!(f, "=>"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
