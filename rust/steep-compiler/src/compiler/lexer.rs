//! Lexer for contract source (a class-oriented JavaScript subset with type annotations).

use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}, col {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
    #[error("unterminated string at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("unterminated comment at line {line}, col {col}")]
    UnterminatedComment { line: usize, col: usize },
    #[error("invalid number at line {line}, col {col}")]
    InvalidNumber { line: usize, col: usize },
    #[error("invalid escape sequence at line {line}, col {col}")]
    InvalidEscape { line: usize, col: usize },
}

impl LexError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexError::UnexpectedChar { line, col, .. }
            | LexError::UnterminatedString { line, col }
            | LexError::UnterminatedComment { line, col }
            | LexError::InvalidNumber { line, col }
            | LexError::InvalidEscape { line, col } => (*line, *col),
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    byte_offset: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { source: source.chars().collect(), pos: 0, line: 1, col: 1, byte_offset: 0 }
    }

    fn current(&self) -> Option<char> { self.source.get(self.pos).copied() }
    fn peek(&self) -> Option<char> { self.source.get(self.pos + 1).copied() }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        self.byte_offset += ch.len_utf8();
        if ch == '\n' { self.line += 1; self.col = 1; } else { self.col += 1; }
        Some(ch)
    }

    fn mark(&self) -> (usize, usize, usize) { (self.byte_offset, self.line, self.col) }

    fn span_from(&self, (so, sl, sc): (usize, usize, usize)) -> Span {
        Span::new(so, self.byte_offset, sl, sc)
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let (_, line, col) = self.mark();
        self.advance();
        self.advance();
        loop {
            match self.current() {
                None => return Err(LexError::UnterminatedComment { line, col }),
                Some('*') if self.peek() == Some('/') => { self.advance(); self.advance(); return Ok(()); }
                Some(_) => { self.advance(); }
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.mark();
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.current() {
                None | Some('\n') => return Err(LexError::UnterminatedString { line: start.1, col: start.2 }),
                Some('\\') => {
                    let at = self.mark();
                    self.advance();
                    if self.current().is_none() {
                        return Err(LexError::UnterminatedString { line: start.1, col: start.2 });
                    }
                    if let Some(c) = self.read_escape(at)? { s.push(c); }
                }
                Some(c) if c == quote => { self.advance(); break; }
                Some(c) => { s.push(c); self.advance(); }
            }
        }
        Ok(Token::new(TokenKind::StringLit(s), self.span_from(start)))
    }

    /// Decode the escape after a backslash at `at`. A line continuation yields `None`.
    fn read_escape(&mut self, (_, line, col): (usize, usize, usize)) -> Result<Option<char>, LexError> {
        let invalid = || LexError::InvalidEscape { line, col };
        let Some(c) = self.advance() else { return Err(invalid()) };
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            // Legacy octal escapes are a syntax error in class bodies.
            '0' if matches!(self.current(), Some(d) if d.is_ascii_digit()) => return Err(invalid()),
            '0' => '\0',
            '1'..='9' => return Err(invalid()),
            'x' => self.hex_digits(2).and_then(char::from_u32).ok_or_else(invalid)?,
            'u' => self.read_unicode_escape().ok_or_else(invalid)?,
            '\r' => {
                if self.current() == Some('\n') { self.advance(); }
                return Ok(None);
            }
            '\n' | '\u{2028}' | '\u{2029}' => return Ok(None),
            other => other,
        };
        Ok(Some(decoded))
    }

    fn hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self.current()?.to_digit(16)?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    /// `XXXX`, `{X...}`, or a `\uD83D\uDE00` surrogate pair.
    fn read_unicode_escape(&mut self) -> Option<char> {
        let code = if self.current() == Some('{') {
            self.advance();
            let mut value: u32 = 0;
            let mut digits = 0;
            while let Some(d) = self.current().and_then(|c| c.to_digit(16)) {
                self.advance();
                value = value.checked_mul(16)?.checked_add(d)?;
                digits += 1;
            }
            if digits == 0 || self.current() != Some('}') {
                return None;
            }
            self.advance();
            value
        } else {
            self.hex_digits(4)?
        };
        if (0xD800..0xDC00).contains(&code) && self.current() == Some('\\') && self.peek() == Some('u') {
            self.advance();
            self.advance();
            let low = self.hex_digits(4)?;
            if !(0xDC00..0xE000).contains(&low) {
                return None;
            }
            return char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
        }
        char::from_u32(code)
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.mark();
        let mut text = String::new();
        if self.current() == Some('0') && matches!(self.peek(), Some('x' | 'X')) {
            text.push('0');
            self.advance();
            text.push('x');
            self.advance();
            while let Some(ch) = self.current() {
                if ch.is_ascii_hexdigit() { text.push(ch); self.advance(); }
                else if ch == '_' { self.advance(); }
                else { break; }
            }
            if text.len() == 2 {
                return Err(LexError::InvalidNumber { line: start.1, col: start.2 });
            }
        } else {
            let mut seen_dot = false;
            while let Some(ch) = self.current() {
                if ch.is_ascii_digit() { text.push(ch); self.advance(); }
                else if ch == '.' && !seen_dot && matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    seen_dot = true; text.push(ch); self.advance();
                }
                else if ch == '_' { self.advance(); }
                else { break; }
            }
            if matches!(self.current(), Some('e' | 'E')) {
                text.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() { text.push(sign); self.advance(); }
                let digits_start = text.len();
                while let Some(ch) = self.current().filter(char::is_ascii_digit) { text.push(ch); self.advance(); }
                if text.len() == digits_start {
                    return Err(LexError::InvalidNumber { line: start.1, col: start.2 });
                }
            }
        }
        if self.current() == Some('n') {
            self.advance();
            if text.contains('.') || text.contains('e') {
                return Err(LexError::InvalidNumber { line: start.1, col: start.2 });
            }
            return Ok(Token::new(TokenKind::BigIntLit(text), self.span_from(start)));
        }
        if matches!(self.current(), Some(c) if c.is_alphabetic() || c == '_') {
            return Err(LexError::InvalidNumber { line: start.1, col: start.2 });
        }
        Ok(Token::new(TokenKind::NumberLit(text), self.span_from(start)))
    }

    fn read_word(&mut self) -> String {
        let mut id = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' { id.push(ch); self.advance(); } else { break; }
        }
        id
    }

    fn read_ident(&mut self) -> Token {
        let start = self.mark();
        let id = self.read_word();
        let span = self.span_from(start);
        let kind = match id.as_str() {
            "class" => TokenKind::Class, "extends" => TokenKind::Extends, "super" => TokenKind::Super,
            "this" => TokenKind::This, "new" => TokenKind::New, "return" => TokenKind::Return,
            "if" => TokenKind::If, "else" => TokenKind::Else, "const" => TokenKind::Const,
            "let" => TokenKind::Let, "var" => TokenKind::Var, "function" => TokenKind::Function,
            "throw" => TokenKind::Throw, "async" => TokenKind::Async, "await" => TokenKind::Await,
            "static" => TokenKind::Static, "null" => TokenKind::Null, "typeof" => TokenKind::Typeof,
            "void" => TokenKind::Void, "delete" => TokenKind::Delete,
            "instanceof" => TokenKind::Instanceof, "in" => TokenKind::In,
            "while" => TokenKind::While, "do" => TokenKind::Do, "for" => TokenKind::For,
            "break" => TokenKind::Break, "continue" => TokenKind::Continue,
            "try" => TokenKind::Try, "catch" => TokenKind::Catch, "finally" => TokenKind::Finally,
            "switch" | "case" | "default" | "with" | "yield" | "debugger" | "import" | "export"
            | "enum" => TokenKind::Reserved(id),
            "true" => TokenKind::BoolLit(true), "false" => TokenKind::BoolLit(false),
            _ => TokenKind::Ident(id),
        };
        Token::new(kind, span)
    }

    /// `#name` or `@name`; the sigil must be followed directly by an identifier.
    fn read_sigil(&mut self, sigil: char) -> Result<Token, LexError> {
        let start = self.mark();
        self.advance();
        if !matches!(self.current(), Some(c) if c.is_alphabetic() || c == '_' || c == '$') {
            return Err(LexError::UnexpectedChar { ch: sigil, line: start.1, col: start.2 });
        }
        let name = self.read_word();
        let kind = if sigil == '#' { TokenKind::PrivateName(name) } else { TokenKind::Decorator(name) };
        Ok(Token::new(kind, self.span_from(start)))
    }

    /// Consume the longest operator in `table` that matches at the cursor.
    fn operator(&mut self, table: &[(&str, TokenKind)]) -> Option<Token> {
        let start = self.mark();
        for (text, kind) in table {
            let matches = text.chars().enumerate().all(|(i, c)| self.source.get(self.pos + i) == Some(&c));
            if matches {
                for _ in 0..text.chars().count() { self.advance(); }
                return Some(Token::new(kind.clone(), self.span_from(start)));
            }
        }
        None
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        // Longest operators first.
        let operators = [
            ("===", TokenKind::StrictEq), ("!==", TokenKind::StrictNotEq),
            ("==", TokenKind::Eq), ("!=", TokenKind::NotEq), ("=>", TokenKind::FatArrow),
            ("<=", TokenKind::LtEq), (">=", TokenKind::GtEq), ("&&", TokenKind::AndAnd),
            ("||", TokenKind::OrOr), ("??", TokenKind::Nullish), ("++", TokenKind::PlusPlus),
            ("--", TokenKind::MinusMinus), ("+=", TokenKind::PlusAssign), ("-=", TokenKind::MinusAssign),
            ("+", TokenKind::Plus), ("-", TokenKind::Minus), ("*", TokenKind::Star),
            ("/", TokenKind::Slash), ("%", TokenKind::Percent), ("!", TokenKind::Bang),
            ("<", TokenKind::Lt), (">", TokenKind::Gt), ("=", TokenKind::Assign),
            ("?", TokenKind::Question), ("|", TokenKind::Pipe), (".", TokenKind::Dot),
            (",", TokenKind::Comma), (":", TokenKind::Colon), (";", TokenKind::Semicolon),
            ("(", TokenKind::LParen), (")", TokenKind::RParen), ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket), ("{", TokenKind::LBrace), ("}", TokenKind::RBrace),
        ];
        let mut tokens = Vec::new();
        while let Some(ch) = self.current() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => { self.advance(); }
                '/' if self.peek() == Some('/') => { while matches!(self.current(), Some(c) if c != '\n') { self.advance(); } }
                '/' if self.peek() == Some('*') => self.skip_block_comment()?,
                '"' | '\'' => tokens.push(self.read_string(ch)?),
                '0'..='9' => tokens.push(self.read_number()?),
                '.' if matches!(self.peek(), Some(d) if d.is_ascii_digit()) => {
                    return Err(LexError::InvalidNumber { line: self.line, col: self.col });
                }
                '#' | '@' => tokens.push(self.read_sigil(ch)?),
                c if c.is_alphabetic() || c == '_' || c == '$' => tokens.push(self.read_ident()),
                _ => match self.operator(&operators) {
                    Some(tok) => tokens.push(tok),
                    None => return Err(LexError::UnexpectedChar { ch, line: self.line, col: self.col }),
                },
            }
        }
        let end = Span::new(self.byte_offset, self.byte_offset, self.line, self.col);
        tokens.push(Token::new(TokenKind::Eof, end));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_decorated_class() {
        let k = kinds("@contract class Token extends Base {}");
        assert_eq!(k[0], TokenKind::Decorator("contract".into()));
        assert_eq!(k[1], TokenKind::Class);
        assert_eq!(k[2], TokenKind::Ident("Token".into()));
        assert_eq!(k[3], TokenKind::Extends);
    }

    #[test]
    fn test_lex_private_and_operators() {
        let k = kinds("this.#count += 1 === x ?? y => z");
        assert!(k.contains(&TokenKind::PrivateName("count".into())));
        assert!(k.contains(&TokenKind::PlusAssign));
        assert!(k.contains(&TokenKind::StrictEq));
        assert!(k.contains(&TokenKind::Nullish));
        assert!(k.contains(&TokenKind::FatArrow));
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::NumberLit("42".into()));
        assert_eq!(kinds("1.5e3")[0], TokenKind::NumberLit("1.5e3".into()));
        assert_eq!(kinds("0xff")[0], TokenKind::NumberLit("0xff".into()));
        assert_eq!(kinds("1_000n")[0], TokenKind::BigIntLit("1000".into()));
        assert!(Lexer::new("12abc").tokenize().is_err());
    }

    #[test]
    fn test_lex_strings_and_comments() {
        let k = kinds("// note\n'it\\'s' /* block */ \"x\"");
        assert_eq!(k[0], TokenKind::StringLit("it's".into()));
        assert_eq!(k[1], TokenKind::StringLit("x".into()));
        assert!(matches!(Lexer::new("'open").tokenize(), Err(LexError::UnterminatedString { .. })));
        assert!(matches!(Lexer::new("/* open").tokenize(), Err(LexError::UnterminatedComment { .. })));
    }

    #[test]
    fn test_lex_string_escapes() {
        assert_eq!(kinds(r#""caf\u00e9 \x41""#)[0], TokenKind::StringLit("café A".into()));
        assert_eq!(kinds(r#"'\u{1F600}' '\uD83D\uDE00'"#)[..2], [
            TokenKind::StringLit("\u{1F600}".into()),
            TokenKind::StringLit("\u{1F600}".into()),
        ]);
        assert_eq!(kinds("'a\\\nb'")[0], TokenKind::StringLit("ab".into()));
        assert_eq!(kinds("'a\\\r\nb'")[0], TokenKind::StringLit("ab".into()));
        assert_eq!(kinds(r#"'\b\f\v\0\q'"#)[0], TokenKind::StringLit("\u{8}\u{c}\u{b}\0q".into()));
        for bad in [r"'\x4'", r"'\u12'", r"'\u{}'", r"'\u{110000}'", r"'\uD800'", r"'\01'"] {
            assert!(matches!(Lexer::new(bad).tokenize(), Err(LexError::InvalidEscape { line: 1, col: 2 })), "{}", bad);
        }
    }

    #[test]
    fn test_lex_keywords_and_update_operators() {
        let k = kinds("x instanceof Array && i++ in --j");
        assert_eq!(k[1], TokenKind::Instanceof);
        assert_eq!(k[5], TokenKind::PlusPlus);
        assert_eq!(k[6], TokenKind::In);
        assert_eq!(k[7], TokenKind::MinusMinus);
        assert_eq!(kinds("while for try catch")[..4], [TokenKind::While, TokenKind::For, TokenKind::Try, TokenKind::Catch]);
        assert_eq!(kinds("switch")[0], TokenKind::Reserved("switch".into()));
        assert_eq!(kinds("a += 1")[1], TokenKind::PlusAssign);
    }

    #[test]
    fn test_lex_positions() {
        let tokens = Lexer::new("class A {\n  x = 1\n}").tokenize().unwrap();
        let x = tokens.iter().find(|t| t.kind == TokenKind::Ident("x".into())).unwrap();
        assert_eq!((x.span.line, x.span.col), (2, 3));
    }
}
