//! Recursive descent parser with Pratt expression parsing for contract source.

use crate::compiler::ast::*;
use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, col {col}; expected {expected}")]
    Unexpected { found: String, expected: String, line: usize, col: usize },
    #[error("{what} is not supported (line {line}, col {col})")]
    Unsupported { what: String, line: usize, col: usize },
    #[error("invalid assignment target at line {line}, col {col}")]
    InvalidAssignTarget { line: usize, col: usize },
}

impl ParseError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Unexpected { line, col, .. }
            | ParseError::Unsupported { line, col, .. }
            | ParseError::InvalidAssignTarget { line, col } => (*line, *col),
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let end = tokens
                .last()
                .map_or_else(Span::dummy, |t| Span::new(t.span.end, t.span.end, t.span.line, t.span.col));
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof, so the stream is never empty.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind { &self.current().kind }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool { self.peek_kind() == kind }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{}", kind)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        ParseError::Unexpected {
            found: format!("{}", tok.kind), expected: expected.to_string(),
            line: tok.span.line, col: tok.span.col,
        }
    }

    fn unsupported(&self, what: &str) -> ParseError {
        let span = self.current().span;
        ParseError::Unsupported { what: what.to_string(), line: span.line, col: span.col }
    }

    fn at_end(&self) -> bool { matches!(self.peek_kind(), TokenKind::Eof) }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span
    }

    /// The current token starts a line after the previous one.
    fn at_line_break(&self) -> bool {
        self.pos > 0 && self.current().span.line > self.prev_span().line
    }

    /// Statement terminator: `;`, or one inserted before `}`, end of input or a line break.
    fn end_stmt(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon)
            || matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof)
            || self.at_line_break()
        {
            Ok(())
        } else {
            Err(self.unexpected(";"))
        }
    }

    // ── Top-level parsing ──

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let span_start = self.current().span;
        let mut items = Vec::new();
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) { continue; }
            items.push(self.parse_item()?);
        }
        let span = match items.last() {
            Some(last) => span_start.merge(last.span()),
            None => span_start,
        };
        Ok(Program { items, span })
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        let decorators = self.parse_decorators();
        if matches!(self.peek_kind(), TokenKind::Class) {
            return Ok(Item::Class(self.parse_class(decorators)?));
        }
        if !decorators.is_empty() {
            return Err(self.unexpected("class after decorators"));
        }
        Ok(Item::Stmt(self.parse_stmt()?))
    }

    fn parse_decorators(&mut self) -> Vec<DecoratorRef> {
        let mut decorators = Vec::new();
        while let TokenKind::Decorator(name) = self.peek_kind().clone() {
            let span = self.advance().span;
            decorators.push(DecoratorRef { name, span });
        }
        decorators
    }

    // ── Classes ──

    fn parse_class(&mut self, decorators: Vec<DecoratorRef>) -> Result<ClassDecl, ParseError> {
        let class_span = self.expect(&TokenKind::Class)?.span;
        let start = decorators.first().map(|d| d.span).unwrap_or(class_span);
        let name = self.expect_ident()?;
        let superclass = if self.eat(&TokenKind::Extends) { Some(self.expect_ident()?) } else { None };
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            if self.eat(&TokenKind::Semicolon) { continue; }
            members.push(self.parse_member()?);
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(ClassDecl { name, superclass, decorators, members, span: start.merge(end) })
    }

    fn parse_member(&mut self) -> Result<ClassMember, ParseError> {
        let decorators = self.parse_decorators();
        let start = decorators.first().map(|d| d.span).unwrap_or(self.current().span);
        if matches!(self.peek_kind(), TokenKind::Static) {
            return Err(self.unsupported("static member"));
        }

        // `async name(` / `get name(` / `set name(`; a bare `get(` is a method named get.
        let mut is_async = false;
        let mut kind = MethodKind::Method;
        if matches!(self.peek_kind(), TokenKind::Async) && self.is_member_name_at(1) {
            self.advance();
            is_async = true;
        } else if let TokenKind::Ident(word) = self.peek_kind() {
            if (word == "get" || word == "set") && self.is_member_name_at(1) {
                kind = if word == "get" { MethodKind::Getter } else { MethodKind::Setter };
                self.advance();
            }
        }

        let name = self.parse_member_name()?;
        if matches!(self.peek_kind(), TokenKind::LParen) {
            if name == MemberName::Public("constructor".into()) && kind == MethodKind::Method {
                kind = MethodKind::Constructor;
            }
            let params = self.parse_params()?;
            let return_type = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
            let body = self.parse_block()?;
            let span = start.merge(self.prev_span());
            return Ok(ClassMember::Method(MethodDef {
                name, kind, decorators, is_async, params, return_type, body, span,
            }));
        }
        if is_async || kind != MethodKind::Method {
            return Err(self.unexpected("("));
        }

        let type_ann = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        let value = if self.eat(&TokenKind::Assign) { Some(self.parse_expr()?) } else { None };
        self.end_stmt()?;
        let span = start.merge(self.prev_span());
        Ok(ClassMember::Property(PropertyDef { name, decorators, type_ann, value, span }))
    }

    fn is_member_name_at(&self, n: usize) -> bool {
        let kind = self.peek_nth(n);
        matches!(kind, TokenKind::Ident(_) | TokenKind::PrivateName(_) | TokenKind::StringLit(_))
            || keyword_text(kind).is_some()
    }

    fn parse_member_name(&mut self) -> Result<MemberName, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::PrivateName(n) => { self.advance(); Ok(MemberName::Private(n)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(MemberName::Public(s)) }
            _ => self.expect_property_name().map(MemberName::Public),
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            if !params.is_empty() { self.expect(&TokenKind::Comma)?; }
            if matches!(self.peek_kind(), TokenKind::RParen) { break; } // trailing comma
            let span = self.current().span;
            let name = self.expect_ident()?;
            let type_ann = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
            let default_value = if self.eat(&TokenKind::Assign) { Some(self.parse_expr()?) } else { None };
            params.push(Param { name, type_ann, default_value, span: span.merge(self.prev_span()) });
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            if self.eat(&TokenKind::Semicolon) { continue; }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(stmts)
    }

    // ── Statements ──

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let decl = self.parse_var_decl()?;
                self.end_stmt()?;
                Ok(Stmt::Var(VarDecl { span: decl.span.merge(self.prev_span()), ..decl }))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::Throw => {
                let start = self.advance().span;
                let value = self.parse_expr()?;
                self.end_stmt()?;
                Ok(Stmt::Throw(value, start.merge(self.prev_span())))
            }
            TokenKind::LBrace => {
                let start = self.current().span;
                let body = self.parse_block()?;
                Ok(Stmt::Block(body, start.merge(self.prev_span())))
            }
            TokenKind::Semicolon => Ok(Stmt::Block(Vec::new(), self.advance().span)),
            TokenKind::Function => Ok(Stmt::Function(self.parse_function(false)?)),
            TokenKind::Async if matches!(self.peek_nth(1), TokenKind::Function) => {
                self.advance();
                Ok(Stmt::Function(self.parse_function(true)?))
            }
            TokenKind::While => {
                let start = self.advance().span;
                let condition = self.parse_paren_expr()?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While(condition, body, start.merge(self.prev_span())))
            }
            TokenKind::Do => {
                let start = self.advance().span;
                let body = Box::new(self.parse_stmt()?);
                self.expect(&TokenKind::While)?;
                let condition = self.parse_paren_expr()?;
                self.eat(&TokenKind::Semicolon);
                Ok(Stmt::DoWhile(body, condition, start.merge(self.prev_span())))
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Break | TokenKind::Continue => {
                let tok = self.advance();
                if matches!(self.peek_kind(), TokenKind::Ident(_)) && !self.at_line_break() {
                    return Err(self.unsupported("labeled break or continue"));
                }
                self.end_stmt()?;
                let span = tok.span.merge(self.prev_span());
                Ok(if tok.kind == TokenKind::Break { Stmt::Break(span) } else { Stmt::Continue(span) })
            }
            TokenKind::Reserved(word) => Err(self.unsupported(&format!("'{}'", word))),
            _ => {
                let expr = self.parse_expr()?;
                self.end_stmt()?;
                let span = expr.span().merge(self.prev_span());
                Ok(Stmt::Expr(expr, span))
            }
        }
    }

    /// `const x: T = init` without the terminator.
    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let tok = self.advance();
        let kind = var_kind(&tok.kind);
        let name = self.expect_ident()?;
        let type_ann = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        let init = if self.eat(&TokenKind::Assign) { Some(self.parse_expr()?) } else { None };
        if matches!(self.peek_kind(), TokenKind::Comma) {
            return Err(self.unsupported("multiple declarators in one statement"));
        }
        Ok(VarDecl { kind, name, type_ann, init, span: tok.span.merge(self.prev_span()) })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Return)?.span;
        let bare = matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof);
        let value = if bare || self.at_line_break() { None } else { Some(self.parse_expr()?) };
        self.end_stmt()?;
        Ok(Stmt::Return(value, start.merge(self.prev_span())))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::If)?.span;
        let condition = self.parse_paren_expr()?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::Else) { Some(Box::new(self.parse_stmt()?)) } else { None };
        Ok(Stmt::If(IfStmt { condition, then_branch, else_branch, span: start.merge(self.prev_span()) }))
    }

    fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::For)?.span;
        if matches!(self.peek_kind(), TokenKind::Await) {
            return Err(self.unsupported("for await"));
        }
        self.expect(&TokenKind::LParen)?;

        let declared = matches!(self.peek_kind(), TokenKind::Const | TokenKind::Let | TokenKind::Var);
        let offset = usize::from(declared);
        if matches!(self.peek_nth(offset), TokenKind::Ident(_)) && starts_for_each(self.peek_nth(offset + 1)) {
            let kind = if declared { Some(var_kind(&self.advance().kind)) } else { None };
            let binding = self.expect_ident()?;
            let of = self.advance().kind != TokenKind::In;
            let iterable = self.parse_expr()?;
            self.expect(&TokenKind::RParen)?;
            let body = Box::new(self.parse_stmt()?);
            let span = start.merge(self.prev_span());
            return Ok(Stmt::ForEach(ForEachStmt { kind, binding, of, iterable, body, span }));
        }

        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Const | TokenKind::Let | TokenKind::Var => Some(ForInit::Var(self.parse_var_decl()?)),
            _ => Some(ForInit::Expr(self.parse_expr()?)),
        };
        self.expect(&TokenKind::Semicolon)?;
        let test = if self.at(&TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.at(&TokenKind::RParen) { None } else { Some(self.parse_expr()?) };
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For(ForStmt { init, test, update, body, span: start.merge(self.prev_span()) }))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Try)?.span;
        let block = self.parse_block()?;
        let catch = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LParen) {
                let name = self.expect_ident()?;
                if self.eat(&TokenKind::Colon) {
                    self.parse_type()?;
                }
                self.expect(&TokenKind::RParen)?;
                Some(name)
            } else {
                None
            };
            Some(CatchClause { param, body: self.parse_block()? })
        } else {
            None
        };
        let finally = if self.eat(&TokenKind::Finally) { Some(self.parse_block()?) } else { None };
        if catch.is_none() && finally.is_none() {
            return Err(self.unexpected("catch or finally"));
        }
        Ok(Stmt::Try(TryStmt { block, catch, finally, span: start.merge(self.prev_span()) }))
    }

    fn parse_function(&mut self, is_async: bool) -> Result<FunctionExpr, ParseError> {
        let start = self.expect(&TokenKind::Function)?.span;
        let name = match self.peek_kind() {
            TokenKind::Ident(_) => Some(self.expect_ident()?),
            _ => None,
        };
        let params = self.parse_params()?;
        let return_type = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        let body = FunctionBody::Block(self.parse_block()?);
        Ok(FunctionExpr { name, is_async, params, return_type, body, span: start.merge(self.prev_span()) })
    }

    // ── Type annotations ──

    fn parse_type(&mut self) -> Result<TypeAnn, ParseError> {
        self.eat(&TokenKind::Pipe); // leading `|` in multi-line unions
        let first = self.parse_type_prefix()?;
        if !matches!(self.peek_kind(), TokenKind::Pipe) {
            return Ok(first);
        }
        let start = first.span();
        let mut members = vec![first];
        while self.eat(&TokenKind::Pipe) {
            members.push(self.parse_type_prefix()?);
        }
        Ok(TypeAnn::Union(members, start.merge(self.prev_span())))
    }

    fn parse_type_prefix(&mut self) -> Result<TypeAnn, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Question) {
            let start = self.advance().span;
            let inner = self.parse_type_prefix()?;
            return Ok(TypeAnn::Nullable(Box::new(inner), start.merge(self.prev_span())));
        }
        let mut ty = self.parse_type_primary()?;
        while matches!(self.peek_kind(), TokenKind::LBracket) && matches!(self.peek_nth(1), TokenKind::RBracket) {
            self.advance();
            self.advance();
            let span = ty.span().merge(self.prev_span());
            ty = TypeAnn::Array(Box::new(ty), span);
        }
        Ok(ty)
    }

    fn parse_type_primary(&mut self) -> Result<TypeAnn, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Null => { self.advance(); Ok(TypeAnn::Null(tok.span)) }
            TokenKind::Void => { self.advance(); Ok(TypeAnn::Void(tok.span)) }
            TokenKind::StringLit(ref s) => { self.advance(); Ok(TypeAnn::Literal(format!("{:?}", s), tok.span)) }
            TokenKind::NumberLit(ref n) => { self.advance(); Ok(TypeAnn::Literal(n.clone(), tok.span)) }
            TokenKind::BoolLit(b) => { self.advance(); Ok(TypeAnn::Literal(b.to_string(), tok.span)) }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                let mut args = Vec::new();
                if self.eat(&TokenKind::Lt) {
                    loop {
                        args.push(self.parse_type()?);
                        if !self.eat(&TokenKind::Comma) { break; }
                    }
                    self.expect(&TokenKind::Gt)?;
                }
                Ok(TypeAnn::Named(name, args, tok.span.merge(self.prev_span())))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    // ── Expressions (Pratt parser) ──

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(Expr::Arrow(arrow));
        }
        let lhs = self.parse_conditional()?;
        let op = match self.peek_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::AddAssign,
            TokenKind::MinusAssign => AssignOp::SubAssign,
            _ => return Ok(lhs),
        };
        if !lhs.is_assign_target() {
            let span = lhs.span();
            return Err(ParseError::InvalidAssignTarget { line: span.line, col: span.col });
        }
        self.advance();
        let rhs = self.parse_expr()?;
        let span = lhs.span().merge(rhs.span());
        Ok(Expr::Assign(Box::new(lhs), op, Box::new(rhs), span))
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_expr()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.parse_expr()?;
        let span = cond.span().merge(otherwise.span());
        Ok(Expr::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise), span))
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::StrictEq => BinOp::StrictEq,
                TokenKind::StrictNotEq => BinOp::StrictNotEq,
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                TokenKind::AndAnd => BinOp::And,
                TokenKind::OrOr => BinOp::Or,
                TokenKind::Nullish => BinOp::Nullish,
                TokenKind::Instanceof => BinOp::Instanceof,
                TokenKind::In => BinOp::In,
                _ => break,
            };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp { break; }
            self.advance();
            let rhs = self.parse_binary(r_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::Await => UnaryOp::Await,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let tok = self.advance();
                let target = self.parse_unary()?;
                let span = tok.span.merge(target.span());
                return update_expr(&tok.kind, true, target, span);
            }
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span());
        Ok(Expr::Unary(op, Box::new(operand), span))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = match self.peek_kind().clone() {
                        TokenKind::PrivateName(n) => { self.advance(); MemberName::Private(n) }
                        _ => MemberName::Public(self.expect_property_name()?),
                    };
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Member(Box::new(expr), name, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Index(Box::new(expr), Box::new(index), span);
                }
                TokenKind::LParen => {
                    let args = self.parse_args()?;
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Call(Box::new(expr), args, span);
                }
                _ => break,
            }
        }
        // No line break is allowed before a postfix `++`/`--`.
        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) && !self.at_line_break() {
            let tok = self.advance();
            let span = expr.span().merge(tok.span);
            return update_expr(&tok.kind, false, expr, span);
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            if !args.is_empty() { self.expect(&TokenKind::Comma)?; }
            if matches!(self.peek_kind(), TokenKind::RParen) { break; }
            args.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::NumberLit(n) => { self.advance(); Ok(Expr::Number(n, tok.span)) }
            TokenKind::BigIntLit(n) => { self.advance(); Ok(Expr::BigInt(n, tok.span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::Str(s, tok.span)) }
            TokenKind::BoolLit(b) => { self.advance(); Ok(Expr::Bool(b, tok.span)) }
            TokenKind::Null => { self.advance(); Ok(Expr::Null(tok.span)) }
            TokenKind::This => { self.advance(); Ok(Expr::This(tok.span)) }
            TokenKind::Super => { self.advance(); Ok(Expr::Super(tok.span)) }
            TokenKind::Ident(name) => { self.advance(); Ok(Expr::Ident(name, tok.span)) }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elems = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::RBracket) {
                    if !elems.is_empty() { self.expect(&TokenKind::Comma)?; }
                    if matches!(self.peek_kind(), TokenKind::RBracket) { break; }
                    elems.push(self.parse_expr()?);
                }
                let end = self.expect(&TokenKind::RBracket)?.span;
                Ok(Expr::Array(elems, tok.span.merge(end)))
            }
            TokenKind::LBrace => self.parse_object(),
            TokenKind::New => {
                self.advance();
                let mut callee = self.parse_primary()?;
                while matches!(self.peek_kind(), TokenKind::Dot) {
                    self.advance();
                    let name = self.expect_property_name()?;
                    let span = callee.span().merge(self.prev_span());
                    callee = Expr::Member(Box::new(callee), MemberName::Public(name), span);
                }
                let args = if matches!(self.peek_kind(), TokenKind::LParen) { self.parse_args()? } else { Vec::new() };
                Ok(Expr::New(Box::new(callee), args, tok.span.merge(self.prev_span())))
            }
            TokenKind::Function => Ok(Expr::Function(self.parse_function(false)?)),
            TokenKind::Async if matches!(self.peek_nth(1), TokenKind::Function) => {
                self.advance();
                Ok(Expr::Function(self.parse_function(true)?))
            }
            TokenKind::Reserved(word) => Err(self.unsupported(&format!("'{}'", word))),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let mut props = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            if !props.is_empty() { self.expect(&TokenKind::Comma)?; }
            if matches!(self.peek_kind(), TokenKind::RBrace) { break; }
            let is_async = matches!(self.peek_kind(), TokenKind::Async) && self.is_member_name_at(1);
            if is_async {
                self.advance();
            }
            let key_tok = self.current().clone();
            let key = match &key_tok.kind {
                TokenKind::StringLit(s) => { self.advance(); s.clone() }
                TokenKind::NumberLit(n) => { self.advance(); n.clone() }
                _ => self.expect_property_name()?,
            };
            if matches!(self.peek_kind(), TokenKind::LParen) {
                let params = self.parse_params()?;
                let return_type = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
                let body = FunctionBody::Block(self.parse_block()?);
                let span = key_tok.span.merge(self.prev_span());
                let method = FunctionExpr { name: None, is_async, params, return_type, body, span };
                props.push(ObjectProp::Method(key, method));
            } else if is_async {
                return Err(self.unexpected("("));
            } else if self.eat(&TokenKind::Colon) {
                props.push(ObjectProp::Field(key, self.parse_expr()?));
            } else if matches!(key_tok.kind, TokenKind::Ident(_)) {
                props.push(ObjectProp::Field(key.clone(), Expr::Ident(key, key_tok.span)));
            } else {
                return Err(self.unexpected(":"));
            }
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Expr::Object(props, start.merge(end)))
    }

    /// Parse an arrow function if one starts here. `(a) : b` inside a
    /// conditional looks like an annotated arrow, so that case backtracks.
    fn try_parse_arrow(&mut self) -> Result<Option<FunctionExpr>, ParseError> {
        let offset = usize::from(matches!(self.peek_kind(), TokenKind::Async));
        let definite = match self.peek_nth(offset) {
            TokenKind::Ident(_) => {
                if !matches!(self.peek_nth(offset + 1), TokenKind::FatArrow) { return Ok(None); }
                true
            }
            TokenKind::LParen => match self.matching_paren(self.pos + offset) {
                Some(close) => match self.tokens.get(close + 1).map(|t| &t.kind) {
                    Some(TokenKind::FatArrow) => true,
                    Some(TokenKind::Colon) => false,
                    _ => return Ok(None),
                },
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        let save = self.pos;
        match self.parse_arrow() {
            Ok(f) => Ok(Some(f)),
            Err(e) if definite => Err(e),
            Err(_) => { self.pos = save; Ok(None) }
        }
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 { return Some(i); }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn parse_arrow(&mut self) -> Result<FunctionExpr, ParseError> {
        let start = self.current().span;
        let is_async = self.eat(&TokenKind::Async);
        let params = if let TokenKind::Ident(name) = self.peek_kind().clone() {
            let span = self.advance().span;
            vec![Param { name, type_ann: None, default_value: None, span }]
        } else {
            self.parse_params()?
        };
        let return_type = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        self.expect(&TokenKind::FatArrow)?;
        let body = if matches!(self.peek_kind(), TokenKind::LBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(FunctionExpr { name: None, is_async, params, return_type, body, span: start.merge(self.prev_span()) })
    }

    // ── Helpers ──

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => { self.advance(); Ok(name) }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Identifier, or a keyword used as a property name (`obj.new`, `delete() {}`).
    fn expect_property_name(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.peek_kind().clone() {
            self.advance();
            return Ok(name);
        }
        match keyword_text(self.peek_kind()) {
            Some(text) => { self.advance(); Ok(text) }
            None => Err(self.unexpected("property name")),
        }
    }
}

fn keyword_text(kind: &TokenKind) -> Option<String> {
    match kind {
        TokenKind::Class | TokenKind::Extends | TokenKind::Super | TokenKind::This
        | TokenKind::New | TokenKind::Return | TokenKind::If | TokenKind::Else
        | TokenKind::Const | TokenKind::Let | TokenKind::Var | TokenKind::Function
        | TokenKind::Throw | TokenKind::Async | TokenKind::Await | TokenKind::Static
        | TokenKind::Null | TokenKind::Typeof | TokenKind::Void | TokenKind::Delete
        | TokenKind::Instanceof | TokenKind::In | TokenKind::While | TokenKind::Do | TokenKind::For
        | TokenKind::Break | TokenKind::Continue | TokenKind::Try | TokenKind::Catch
        | TokenKind::Finally | TokenKind::Reserved(_) | TokenKind::BoolLit(_) => Some(kind.to_string()),
        _ => None,
    }
}

fn var_kind(kind: &TokenKind) -> VarKind {
    match kind {
        TokenKind::Const => VarKind::Const,
        TokenKind::Let => VarKind::Let,
        _ => VarKind::Var,
    }
}

/// `of` or `in` right after the loop binding.
fn starts_for_each(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::In) || matches!(kind, TokenKind::Ident(word) if word == "of")
}

fn update_expr(kind: &TokenKind, prefix: bool, target: Expr, span: Span) -> Result<Expr, ParseError> {
    if !target.is_assign_target() {
        let at = target.span();
        return Err(ParseError::InvalidAssignTarget { line: at.line, col: at.col });
    }
    let op = if *kind == TokenKind::PlusPlus { UpdateOp::Increment } else { UpdateOp::Decrement };
    Ok(Expr::Update { op, prefix, target: Box::new(target), span })
}
