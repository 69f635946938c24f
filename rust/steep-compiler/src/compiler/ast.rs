use crate::compiler::tokens::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete compilation unit (one bundled contract source)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

/// Top-level items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    Class(ClassDecl),
    Stmt(Stmt),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Class(c) => c.span,
            Item::Stmt(s) => s.span(),
        }
    }
}

// ── Classes ──

/// `@name` attached to a class or class member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorRef {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub decorators: Vec<DecoratorRef>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

/// Name of a class member. Private names are written `#name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberName {
    Public(String),
    Private(String),
}

impl MemberName {
    /// Registry key: the bare name, or `#name` for private members.
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn is_private(&self) -> bool {
        matches!(self, MemberName::Private(_))
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberName::Public(n) => write!(f, "{}", n),
            MemberName::Private(n) => write!(f, "#{}", n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassMember {
    Property(PropertyDef),
    Method(MethodDef),
}

impl ClassMember {
    pub fn name(&self) -> &MemberName {
        match self {
            ClassMember::Property(p) => &p.name,
            ClassMember::Method(m) => &m.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ClassMember::Property(p) => p.span,
            ClassMember::Method(m) => m.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: MemberName,
    pub decorators: Vec<DecoratorRef>,
    pub type_ann: Option<TypeAnn>,
    pub value: Option<Expr>,
    pub span: Span,
}

impl PropertyDef {
    /// Initializer is an arrow or function expression.
    pub fn function_value(&self) -> Option<&FunctionExpr> {
        match &self.value {
            Some(Expr::Arrow(f)) | Some(Expr::Function(f)) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Constructor,
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: MemberName,
    pub kind: MethodKind,
    pub decorators: Vec<DecoratorRef>,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnn>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_ann: Option<TypeAnn>,
    pub default_value: Option<Expr>,
    pub span: Span,
}

// ── Type annotations ──

/// A type annotation as written in source. Erased on emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeAnn {
    /// `number`, `Date`, `Map<string, number>`
    Named(String, Vec<TypeAnn>, Span),
    /// `T[]`
    Array(Box<TypeAnn>, Span),
    /// `?T`
    Nullable(Box<TypeAnn>, Span),
    /// `A | B | C`
    Union(Vec<TypeAnn>, Span),
    /// `null`
    Null(Span),
    /// `void`
    Void(Span),
    /// `'yes'`, `42`, `true`
    Literal(String, Span),
}

impl TypeAnn {
    pub fn span(&self) -> Span {
        match self {
            TypeAnn::Named(_, _, s)
            | TypeAnn::Array(_, s)
            | TypeAnn::Nullable(_, s)
            | TypeAnn::Union(_, s)
            | TypeAnn::Null(s)
            | TypeAnn::Void(s)
            | TypeAnn::Literal(_, s) => *s,
        }
    }
}

// ── Statements ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub kind: VarKind,
    pub name: String,
    pub type_ann: Option<TypeAnn>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Expr),
}

/// `for (init; test; update) body`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `for (const x of xs)` or `for (key in obj)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForEachStmt {
    /// `None` when the loop assigns to an existing binding
    pub kind: Option<VarKind>,
    pub binding: String,
    pub of: bool,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryStmt {
    pub block: Vec<Stmt>,
    pub catch: Option<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Var(VarDecl),
    Expr(Expr, Span),
    Return(Option<Expr>, Span),
    If(IfStmt),
    Throw(Expr, Span),
    Block(Vec<Stmt>, Span),
    Function(FunctionExpr),
    While(Expr, Box<Stmt>, Span),
    DoWhile(Box<Stmt>, Expr, Span),
    For(ForStmt),
    ForEach(ForEachStmt),
    Try(TryStmt),
    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(v) => v.span,
            Stmt::Expr(_, s) | Stmt::Return(_, s) | Stmt::Throw(_, s) | Stmt::Block(_, s) => *s,
            Stmt::While(_, _, s) | Stmt::DoWhile(_, _, s) | Stmt::Break(s) | Stmt::Continue(s) => *s,
            Stmt::If(i) => i.span,
            Stmt::Function(f) => f.span,
            Stmt::For(f) => f.span,
            Stmt::ForEach(f) => f.span,
            Stmt::Try(t) => t.span,
        }
    }
}

// ── Expressions ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    StrictEq,
    StrictNotEq,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Nullish,
    Instanceof,
    In,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+", BinOp::Sub => "-", BinOp::Mul => "*", BinOp::Div => "/",
            BinOp::Mod => "%", BinOp::StrictEq => "===", BinOp::StrictNotEq => "!==",
            BinOp::Eq => "==", BinOp::NotEq => "!=", BinOp::Lt => "<", BinOp::LtEq => "<=",
            BinOp::Gt => ">", BinOp::GtEq => ">=", BinOp::And => "&&", BinOp::Or => "||",
            BinOp::Nullish => "??", BinOp::Instanceof => "instanceof", BinOp::In => "in",
        }
    }

    /// Binding power pair (left, right) used by both the parser and the emitter.
    pub fn binding_power(self) -> (u8, u8) {
        match self {
            BinOp::Or | BinOp::Nullish => (4, 5),
            BinOp::And => (6, 7),
            BinOp::StrictEq | BinOp::StrictNotEq | BinOp::Eq | BinOp::NotEq => (8, 9),
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq | BinOp::Instanceof | BinOp::In => (10, 11),
            BinOp::Add | BinOp::Sub => (12, 13),
            BinOp::Mul | BinOp::Div | BinOp::Mod => (14, 15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Typeof,
    Void,
    Delete,
    Await,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
}

/// Arrow function, function expression, or top-level function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnn>,
    pub body: FunctionBody,
    pub span: Span,
}

/// One entry of an object literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectProp {
    /// `key: value`, or the shorthand `key`
    Field(String, Expr),
    /// `key(params) { ... }`
    Method(String, FunctionExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal, source text kept verbatim
    Number(String, Span),
    /// BigInt literal digits, without the `n` suffix
    BigInt(String, Span),
    Str(String, Span),
    Bool(bool, Span),
    Null(Span),
    Ident(String, Span),
    This(Span),
    Super(Span),
    Member(Box<Expr>, MemberName, Span),
    Index(Box<Expr>, Box<Expr>, Span),
    Call(Box<Expr>, Vec<Expr>, Span),
    New(Box<Expr>, Vec<Expr>, Span),
    Unary(UnaryOp, Box<Expr>, Span),
    /// `++x` when `prefix`, else `x++`
    Update { op: UpdateOp, prefix: bool, target: Box<Expr>, span: Span },
    Binary(Box<Expr>, BinOp, Box<Expr>, Span),
    Assign(Box<Expr>, AssignOp, Box<Expr>, Span),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>, Span),
    Array(Vec<Expr>, Span),
    Object(Vec<ObjectProp>, Span),
    Arrow(FunctionExpr),
    Function(FunctionExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s) | Expr::BigInt(_, s) | Expr::Str(_, s) | Expr::Bool(_, s)
            | Expr::Null(s) | Expr::Ident(_, s) | Expr::This(s) | Expr::Super(s)
            | Expr::Member(_, _, s) | Expr::Index(_, _, s) | Expr::Call(_, _, s)
            | Expr::New(_, _, s) | Expr::Unary(_, _, s) | Expr::Binary(_, _, _, s)
            | Expr::Assign(_, _, _, s) | Expr::Conditional(_, _, _, s) | Expr::Array(_, s)
            | Expr::Object(_, s) | Expr::Update { span: s, .. } => *s,
            Expr::Arrow(f) | Expr::Function(f) => f.span,
        }
    }

    /// Can appear on the left of `=` or under `++`/`--`.
    pub fn is_assign_target(&self) -> bool {
        matches!(self, Expr::Ident(..) | Expr::Member(..) | Expr::Index(..))
    }

    /// `this.<name>`
    pub fn this_member(name: MemberName, span: Span) -> Expr {
        Expr::Member(Box::new(Expr::This(span)), name, span)
    }

    /// The JSON value of a literal, used for recorded parameter defaults.
    pub fn literal_value(&self) -> Option<serde_json::Value> {
        match self {
            Expr::Null(_) => Some(serde_json::Value::Null),
            Expr::Bool(b, _) => Some(serde_json::Value::Bool(*b)),
            Expr::Str(s, _) => Some(serde_json::Value::String(s.clone())),
            Expr::Number(text, _) => parse_number(text)
                .and_then(serde_json::Number::from_f64)
                .map(|n| match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
                        serde_json::Value::from(f as i64)
                    }
                    _ => serde_json::Value::Number(n),
                }),
            Expr::BigInt(digits, _) => Some(serde_json::Value::String(digits.clone())),
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    match text.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok().map(|n| n as f64),
        None => text.parse::<f64>().ok(),
    }
}
