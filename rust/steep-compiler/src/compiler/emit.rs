//! Rendering of a rewritten program back to JavaScript source.
//!
//! Type annotations are erased. Parentheses are inserted from operator
//! binding powers, so the AST never has to record them.

use crate::compiler::ast::*;
use crate::compiler::tokens::Span;

const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_UNARY: u8 = 16;
const PREC_POSTFIX: u8 = 17;
const PREC_PRIMARY: u8 = 18;

/// Render a whole program, one top-level item after another.
pub fn emit_program(program: &Program) -> String {
    let mut out = String::new();
    for item in &program.items {
        match item {
            Item::Class(class) => out.push_str(&emit_class(class, 0)),
            Item::Stmt(stmt) => out.push_str(&emit_stmt(stmt, 0)),
        }
    }
    out
}

/// A JSON value as an expression literal.
pub fn value_to_expr(value: &serde_json::Value) -> Expr {
    let span = Span::dummy();
    match value {
        serde_json::Value::Null => Expr::Null(span),
        serde_json::Value::Bool(b) => Expr::Bool(*b, span),
        serde_json::Value::Number(n) => Expr::Number(n.to_string(), span),
        serde_json::Value::String(s) => Expr::Str(s.clone(), span),
        serde_json::Value::Array(items) => Expr::Array(items.iter().map(value_to_expr).collect(), span),
        serde_json::Value::Object(map) => {
            Expr::Object(map.iter().map(|(k, v)| ObjectProp::Field(k.clone(), value_to_expr(v))).collect(), span)
        }
    }
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn property_key(key: &str) -> String {
    if is_identifier(key) { key.to_string() } else { quote(key) }
}

/// Member name as written in a class body: `#name`, `name` or `"some-name"`.
fn member_head(name: &MemberName) -> String {
    match name {
        MemberName::Public(n) => property_key(n),
        MemberName::Private(_) => name.to_string(),
    }
}

// ── Classes ──

fn emit_decorators(decorators: &[DecoratorRef], indent: usize) -> String {
    decorators.iter().map(|d| format!("{}@{}\n", pad(indent), d.name)).collect()
}

fn emit_class(class: &ClassDecl, indent: usize) -> String {
    let mut out = emit_decorators(&class.decorators, indent);
    out.push_str(&format!("{}class {}", pad(indent), class.name));
    if let Some(ref parent) = class.superclass {
        out.push_str(&format!(" extends {}", parent));
    }
    out.push_str(" {\n");
    for member in &class.members {
        out.push_str(&emit_member(member, indent + 1));
    }
    out.push_str(&format!("{}}}\n", pad(indent)));
    out
}

fn emit_member(member: &ClassMember, indent: usize) -> String {
    match member {
        ClassMember::Property(p) => {
            let mut out = emit_decorators(&p.decorators, indent);
            out.push_str(&pad(indent));
            out.push_str(&member_head(&p.name));
            if let Some(ref value) = p.value {
                out.push_str(" = ");
                out.push_str(&emit_expr_prec(value, PREC_ASSIGN, indent));
            }
            out.push_str(";\n");
            out
        }
        ClassMember::Method(m) => {
            let mut out = emit_decorators(&m.decorators, indent);
            out.push_str(&pad(indent));
            if m.is_async { out.push_str("async "); }
            match m.kind {
                MethodKind::Getter => out.push_str("get "),
                MethodKind::Setter => out.push_str("set "),
                MethodKind::Constructor | MethodKind::Method => {}
            }
            out.push_str(&format!(
                "{}({}) {}\n",
                member_head(&m.name),
                emit_params(&m.params, indent),
                emit_block(&m.body, indent)
            ));
            out
        }
    }
}

fn emit_params(params: &[Param], indent: usize) -> String {
    params
        .iter()
        .map(|p| match p.default_value {
            Some(ref d) => format!("{} = {}", p.name, emit_expr_prec(d, PREC_ASSIGN, indent)),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Statements ──

fn emit_block(stmts: &[Stmt], indent: usize) -> String {
    if stmts.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for stmt in stmts {
        out.push_str(&emit_stmt(stmt, indent + 1));
    }
    out.push_str(&pad(indent));
    out.push('}');
    out
}

fn emit_branch(stmt: &Stmt, indent: usize) -> String {
    match stmt {
        Stmt::Block(stmts, _) => emit_block(stmts, indent),
        other => emit_block(std::slice::from_ref(other), indent),
    }
}

fn emit_if(stmt: &IfStmt, indent: usize) -> String {
    let mut out = format!("if ({}) {}", emit_expr(&stmt.condition, indent), emit_branch(&stmt.then_branch, indent));
    match stmt.else_branch.as_deref() {
        Some(Stmt::If(nested)) => out.push_str(&format!(" else {}", emit_if(nested, indent))),
        Some(other) => out.push_str(&format!(" else {}", emit_branch(other, indent))),
        None => {}
    }
    out
}

fn var_keyword(kind: VarKind) -> &'static str {
    match kind {
        VarKind::Const => "const",
        VarKind::Let => "let",
        VarKind::Var => "var",
    }
}

fn emit_var_decl(v: &VarDecl, indent: usize) -> String {
    match v.init {
        Some(ref init) => format!("{} {} = {}", var_keyword(v.kind), v.name, emit_expr_prec(init, PREC_ASSIGN, indent)),
        None => format!("{} {}", var_keyword(v.kind), v.name),
    }
}

fn emit_for(f: &ForStmt, indent: usize) -> String {
    let init = match f.init {
        Some(ForInit::Var(ref v)) => emit_var_decl(v, indent),
        Some(ForInit::Expr(ref e)) => emit_expr(e, indent),
        None => String::new(),
    };
    let clause = |e: &Option<Expr>| e.as_ref().map(|e| format!(" {}", emit_expr(e, indent))).unwrap_or_default();
    format!("for ({};{};{}) {}", init, clause(&f.test), clause(&f.update), emit_branch(&f.body, indent))
}

fn emit_try(t: &TryStmt, indent: usize) -> String {
    let mut out = format!("try {}", emit_block(&t.block, indent));
    if let Some(ref catch) = t.catch {
        match catch.param {
            Some(ref name) => out.push_str(&format!(" catch ({}) ", name)),
            None => out.push_str(" catch "),
        }
        out.push_str(&emit_block(&catch.body, indent));
    }
    if let Some(ref finally) = t.finally {
        out.push_str(&format!(" finally {}", emit_block(finally, indent)));
    }
    out
}

fn emit_stmt(stmt: &Stmt, indent: usize) -> String {
    let p = pad(indent);
    match stmt {
        Stmt::Var(v) => format!("{}{};\n", p, emit_var_decl(v, indent)),
        Stmt::Expr(e, _) => {
            let text = emit_expr(e, indent);
            if starts_ambiguously(e) { format!("{}({});\n", p, text) } else { format!("{}{};\n", p, text) }
        }
        Stmt::Return(Some(e), _) => format!("{}return {};\n", p, emit_expr(e, indent)),
        Stmt::Return(None, _) => format!("{}return;\n", p),
        Stmt::Throw(e, _) => format!("{}throw {};\n", p, emit_expr(e, indent)),
        Stmt::If(i) => format!("{}{}\n", p, emit_if(i, indent)),
        Stmt::Block(stmts, _) => format!("{}{}\n", p, emit_block(stmts, indent)),
        Stmt::Function(f) => format!("{}{}\n", p, emit_function(f, indent)),
        Stmt::While(cond, body, _) => {
            format!("{}while ({}) {}\n", p, emit_expr(cond, indent), emit_branch(body, indent))
        }
        Stmt::DoWhile(body, cond, _) => {
            format!("{}do {} while ({});\n", p, emit_branch(body, indent), emit_expr(cond, indent))
        }
        Stmt::For(f) => format!("{}{}\n", p, emit_for(f, indent)),
        Stmt::ForEach(f) => format!(
            "{}for ({}{} {} {}) {}\n",
            p,
            f.kind.map(|k| format!("{} ", var_keyword(k))).unwrap_or_default(),
            f.binding,
            if f.of { "of" } else { "in" },
            emit_expr_prec(&f.iterable, PREC_ASSIGN, indent),
            emit_branch(&f.body, indent)
        ),
        Stmt::Try(t) => format!("{}{}\n", p, emit_try(t, indent)),
        Stmt::Break(_) => format!("{}break;\n", p),
        Stmt::Continue(_) => format!("{}continue;\n", p),
    }
}

/// An expression statement whose leftmost token would read as a block or a
/// function declaration.
fn starts_ambiguously(expr: &Expr) -> bool {
    match expr {
        Expr::Object(..) | Expr::Function(_) => true,
        Expr::Member(obj, _, _) | Expr::Index(obj, _, _) | Expr::Call(obj, _, _) => starts_ambiguously(obj),
        Expr::Binary(lhs, _, _, _) | Expr::Assign(lhs, _, _, _) | Expr::Conditional(lhs, _, _, _) => {
            starts_ambiguously(lhs)
        }
        Expr::Update { prefix: false, target, .. } => starts_ambiguously(target),
        _ => false,
    }
}

// ── Expressions ──

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Arrow(_) | Expr::Assign(..) => PREC_ASSIGN,
        Expr::Conditional(..) => PREC_CONDITIONAL,
        Expr::Binary(_, op, _, _) => op.binding_power().0,
        Expr::Unary(..) | Expr::Update { .. } => PREC_UNARY,
        Expr::Member(..) | Expr::Index(..) | Expr::Call(..) | Expr::New(..) => PREC_POSTFIX,
        _ => PREC_PRIMARY,
    }
}

pub fn emit_expr(expr: &Expr, indent: usize) -> String {
    emit_expr_prec(expr, 0, indent)
}

fn emit_expr_prec(expr: &Expr, min_prec: u8, indent: usize) -> String {
    let text = render_expr(expr, indent);
    if precedence(expr) < min_prec { format!("({})", text) } else { text }
}

/// `??` cannot share an unparenthesized chain with `&&` or `||`.
fn mixes_nullish(parent: BinOp, child: &Expr) -> bool {
    let Expr::Binary(_, child_op, _, _) = child else { return false };
    let logical = |op: BinOp| matches!(op, BinOp::And | BinOp::Or);
    (parent == BinOp::Nullish && logical(*child_op)) || (logical(parent) && *child_op == BinOp::Nullish)
}

fn render_expr(expr: &Expr, indent: usize) -> String {
    match expr {
        Expr::Number(text, _) => text.clone(),
        Expr::BigInt(digits, _) => format!("{}n", digits),
        Expr::Str(s, _) => quote(s),
        Expr::Bool(b, _) => b.to_string(),
        Expr::Null(_) => "null".to_string(),
        Expr::Ident(name, _) => name.clone(),
        Expr::This(_) => "this".to_string(),
        Expr::Super(_) => "super".to_string(),
        Expr::Member(obj, name, _) => {
            let object = match **obj {
                Expr::Number(..) => format!("({})", render_expr(obj, indent)),
                _ => emit_expr_prec(obj, PREC_POSTFIX, indent),
            };
            match name {
                MemberName::Public(n) if !is_identifier(n) => format!("{}[{}]", object, quote(n)),
                _ => format!("{}.{}", object, name),
            }
        }
        Expr::Index(obj, index, _) => {
            format!("{}[{}]", emit_expr_prec(obj, PREC_POSTFIX, indent), emit_expr(index, indent))
        }
        Expr::Call(callee, args, _) => {
            format!("{}({})", emit_expr_prec(callee, PREC_POSTFIX, indent), emit_list(args, indent))
        }
        Expr::New(callee, args, _) => {
            let target = match **callee {
                Expr::Ident(..) | Expr::Member(..) | Expr::This(_) => render_expr(callee, indent),
                _ => format!("({})", render_expr(callee, indent)),
            };
            format!("new {}({})", target, emit_list(args, indent))
        }
        Expr::Unary(op, operand, _) => {
            let inner = emit_expr_prec(operand, PREC_UNARY, indent);
            match op {
                UnaryOp::Neg if inner.starts_with('-') => format!("- {}", inner),
                UnaryOp::Neg => format!("-{}", inner),
                UnaryOp::Plus if inner.starts_with('+') => format!("+ {}", inner),
                UnaryOp::Plus => format!("+{}", inner),
                UnaryOp::Not => format!("!{}", inner),
                UnaryOp::Typeof => format!("typeof {}", inner),
                UnaryOp::Void => format!("void {}", inner),
                UnaryOp::Delete => format!("delete {}", inner),
                UnaryOp::Await => format!("await {}", inner),
            }
        }
        Expr::Update { op, prefix: true, target, .. } => {
            format!("{}{}", op.symbol(), emit_expr_prec(target, PREC_POSTFIX, indent))
        }
        Expr::Update { op, prefix: false, target, .. } => {
            format!("{}{}", emit_expr_prec(target, PREC_POSTFIX, indent), op.symbol())
        }
        Expr::Binary(lhs, op, rhs, _) => {
            let (l_bp, r_bp) = op.binding_power();
            let side = |child: &Expr, bp: u8| {
                if mixes_nullish(*op, child) {
                    format!("({})", render_expr(child, indent))
                } else {
                    emit_expr_prec(child, bp, indent)
                }
            };
            format!("{} {} {}", side(lhs, l_bp), op.symbol(), side(rhs, r_bp))
        }
        Expr::Assign(target, op, value, _) => format!(
            "{} {} {}",
            emit_expr_prec(target, PREC_POSTFIX, indent),
            op.symbol(),
            emit_expr_prec(value, PREC_ASSIGN, indent)
        ),
        Expr::Conditional(cond, then, otherwise, _) => format!(
            "{} ? {} : {}",
            emit_expr_prec(cond, PREC_CONDITIONAL + 1, indent),
            emit_expr_prec(then, PREC_ASSIGN, indent),
            emit_expr_prec(otherwise, PREC_ASSIGN, indent)
        ),
        Expr::Array(items, _) => format!("[{}]", emit_list(items, indent)),
        Expr::Object(props, _) => {
            if props.is_empty() {
                return "{}".to_string();
            }
            let fields: Vec<String> = props
                .iter()
                .map(|prop| match prop {
                    ObjectProp::Field(key, value) => {
                        format!("{}: {}", property_key(key), emit_expr_prec(value, PREC_ASSIGN, indent))
                    }
                    ObjectProp::Method(key, f) => format!(
                        "{}{}({}) {}",
                        if f.is_async { "async " } else { "" },
                        property_key(key),
                        emit_params(&f.params, indent),
                        emit_function_body(f, indent)
                    ),
                })
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
        Expr::Arrow(f) => {
            let prefix = if f.is_async { "async " } else { "" };
            let body = match f.body {
                FunctionBody::Block(ref stmts) => emit_block(stmts, indent),
                FunctionBody::Expr(ref e) if starts_ambiguously(e) => format!("({})", emit_expr(e, indent)),
                FunctionBody::Expr(ref e) => emit_expr_prec(e, PREC_ASSIGN, indent),
            };
            format!("{}({}) => {}", prefix, emit_params(&f.params, indent), body)
        }
        Expr::Function(f) => emit_function(f, indent),
    }
}

fn emit_list(items: &[Expr], indent: usize) -> String {
    items.iter().map(|e| emit_expr_prec(e, PREC_ASSIGN, indent)).collect::<Vec<_>>().join(", ")
}

fn emit_function_body(f: &FunctionExpr, indent: usize) -> String {
    match f.body {
        FunctionBody::Block(ref stmts) => emit_block(stmts, indent),
        FunctionBody::Expr(ref e) => emit_block(&[Stmt::Return(Some((**e).clone()), e.span())], indent),
    }
}

fn emit_function(f: &FunctionExpr, indent: usize) -> String {
    let prefix = if f.is_async { "async " } else { "" };
    let name = f.name.as_deref().map(|n| format!(" {}", n)).unwrap_or_default();
    format!("{}function{}({}) {}", prefix, name, emit_params(&f.params, indent), emit_function_body(f, indent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::Parser;

    fn roundtrip(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        emit_program(&program)
    }

    #[test]
    fn test_emit_class_erases_types() {
        let out = roundtrip("class A extends B { @logged run(a: number, b: string = \"x\"): void { return a } }");
        assert_eq!(out, "class A extends B {\n  @logged\n  run(a, b = \"x\") {\n    return a;\n  }\n}\n");
    }

    #[test]
    fn test_emit_precedence() {
        assert_eq!(roundtrip("x = (a + b) * c"), "x = (a + b) * c;\n");
        assert_eq!(roundtrip("x = a - (b - c)"), "x = a - (b - c);\n");
        assert_eq!(roundtrip("x = a - b - c"), "x = a - b - c;\n");
        assert_eq!(roundtrip("x = (a ?? b) || c"), "x = (a ?? b) || c;\n");
        assert_eq!(roundtrip("x = -(-y)"), "x = - -y;\n");
        assert_eq!(roundtrip("x = (a ? b : c).d"), "x = (a ? b : c).d;\n");
    }

    #[test]
    fn test_emit_ambiguous_statement_start() {
        assert_eq!(roundtrip("({ a: 1 }).a"), "({ a: 1 }.a);\n");
        assert_eq!(roundtrip("f = () => ({ a: 1 })"), "f = () => ({ a: 1 });\n");
    }

    #[test]
    fn test_emit_control_flow() {
        let out = roundtrip("function f(a) { if (a) return 1; else if (!a) { throw new Error(\"no\") } else return 2 }");
        assert_eq!(
            out,
            "function f(a) {\n  if (a) {\n    return 1;\n  } else if (!a) {\n    throw new Error(\"no\");\n  } else {\n    return 2;\n  }\n}\n"
        );
    }

    #[test]
    fn test_value_to_expr_quotes_non_identifier_keys() {
        let value = serde_json::json!({ "#secret": { "decorators": ["pure"] }, "plain": 1 });
        let text = emit_expr(&value_to_expr(&value), 0);
        assert_eq!(text, "{ \"#secret\": { decorators: [\"pure\"] }, plain: 1 }");
    }

    #[test]
    fn test_emit_quoted_member_names() {
        let out = roundtrip("class A { \"my-key\"() {} get \"other-key\"() { return 1 } \"x y\" = 2; plain = 1; #p = 3 }");
        assert_eq!(
            out,
            "class A {\n  \"my-key\"() {}\n  get \"other-key\"() {\n    return 1;\n  }\n  \"x y\" = 2;\n  plain = 1;\n  #p = 3;\n}\n"
        );
    }

    #[test]
    fn test_emit_loops_and_try() {
        assert_eq!(
            roundtrip("for (let i = 0; i < n; i++) { if (i === 2) continue; total += i }"),
            "for (let i = 0; i < n; i++) {\n  if (i === 2) {\n    continue;\n  }\n  total += i;\n}\n"
        );
        assert_eq!(roundtrip("for (;;) break"), "for (;;) {\n  break;\n}\n");
        assert_eq!(roundtrip("for (const x of xs) sum += x"), "for (const x of xs) {\n  sum += x;\n}\n");
        assert_eq!(roundtrip("for (k in o) {}"), "for (k in o) {}\n");
        assert_eq!(roundtrip("while (a) a--"), "while (a) {\n  a--;\n}\n");
        assert_eq!(roundtrip("do { x++ } while (x < 3)"), "do {\n  x++;\n} while (x < 3);\n");
        assert_eq!(
            roundtrip("try { f() } catch (e) { throw e } finally { done = true }"),
            "try {\n  f();\n} catch (e) {\n  throw e;\n} finally {\n  done = true;\n}\n"
        );
        assert_eq!(roundtrip("try { f() } catch { }"), "try {\n  f();\n} catch {}\n");
    }

    #[test]
    fn test_emit_update_and_unary() {
        assert_eq!(roundtrip("x = -(--y)"), "x = - --y;\n");
        assert_eq!(roundtrip("x = +(+y)"), "x = + +y;\n");
        assert_eq!(roundtrip("x = +(++y)"), "x = + ++y;\n");
        assert_eq!(roundtrip("x = a++ + ++b"), "x = a++ + ++b;\n");
        assert_eq!(roundtrip("x = (a++).toString()"), "x = (a++).toString();\n");
        assert_eq!(roundtrip("delete o.k"), "delete o.k;\n");
        assert_eq!(roundtrip("x = void 0"), "x = void 0;\n");
        assert_eq!(roundtrip("x = !(a instanceof B)"), "x = !(a instanceof B);\n");
        assert_eq!(roundtrip("x = \"k\" in o && ok"), "x = \"k\" in o && ok;\n");
    }

    #[test]
    fn test_emit_object_methods() {
        assert_eq!(
            roundtrip("o = { add(a, b) { return a + b }, async \"go-on\"() {}, n: 1 }"),
            "o = { add(a, b) {\n  return a + b;\n}, async \"go-on\"() {}, n: 1 };\n"
        );
    }
}
